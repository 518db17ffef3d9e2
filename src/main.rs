use raspi_bme280::qnh;
use raspi_bme280::sensor::bme280::Driver;
use raspi_bme280::std_clock::StdClock;
use rppal::i2c::I2c;

/// 海平面归算用的参考温度【℃】（年平均气温）
const REFERENCE_TEMP: f64 = 21.0;
/// 站点海拔【m】
const ALTITUDE: f64 = 200.0;

/// 读取一次BME280并打印芯片信息、环境数据和QNH
fn main() -> anyhow::Result<()> {
    // 初始化时钟和I2C通信总线
    let clock = StdClock::new();
    let mut i2c = I2c::new()?;

    // 创建BME280驱动实例（默认地址0x76）
    let mut driver = Driver::new(&clock, &mut i2c, None)?;

    // 读取芯片ID和版本
    let (chip_id, chip_version) = driver.chip_id(&mut i2c)?;
    println!("芯片ID   : {}", chip_id);
    println!("芯片版本 : {}", chip_version);

    // 触发一次强制模式转换并读取补偿后的数据
    let reading = driver.read(&mut i2c)?;
    println!("温度     : {:.2} ℃", reading.temperature);
    println!("压力     : {:.2} hPa", reading.pressure);
    println!("湿度     : {:.2} %", reading.humidity);

    // 把站点气压归算到海平面
    let qnh = qnh::sea_level_pressure(reading.pressure, ALTITUDE, 273.25 + REFERENCE_TEMP);
    println!("QNH      : {:.2} hPa", qnh);

    Ok(())
}
