use std::time::Duration;

use embedded_hal::i2c::I2c;
use embedded_timers::clock::Clock;

use crate::bus::Bus;
use crate::decode::{sign_extend_12, signed_byte, signed_short, unsigned_byte, unsigned_short};
use crate::error::Error;

/// BME280 I2C默认从设备地址（备选地址为0x77）
pub const DEFAULT_ADDR: u8 = 0x76;

// 寄存器地址，见数据手册第5章寄存器映射
const REG_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA: u8 = 0xF7;
const REG_CALIB_TP: u8 = 0x88;
const REG_CALIB_H1: u8 = 0xA1;
const REG_CALIB_H2: u8 = 0xE1;

/// 软复位命令字
const RESET_CMD: u8 = 0xB6;
/// 强制模式：触发一次转换后自动回到休眠
const MODE_FORCED: u8 = 0x01;

/// 过采样配置
///
/// 每个物理量独立设置内部采样平均次数，气象应用
/// 推荐全部x1配合强制模式（数据手册第27页）。
/// 字段存的是倍数（1/2/4/8/16），写寄存器前换算成编码
#[derive(Debug, Clone, Copy)]
pub struct Oversampling {
    /// 温度过采样倍数
    pub temperature: u8,
    /// 压力过采样倍数
    pub pressure: u8,
    /// 湿度过采样倍数
    pub humidity: u8,
}

impl Default for Oversampling {
    fn default() -> Self {
        Self {
            temperature: 1,
            pressure: 1,
            humidity: 1,
        }
    }
}

impl Oversampling {
    /// 把过采样倍数换算成控制寄存器的编码
    ///
    /// 数据手册表20~22：x1=001, x2=010, x4=011, x8=100, x16=101。
    /// 寄存器里写的是编码而不是倍数本身，倍数大于2时二者不同，
    /// 混用会导致实际转换时间超过按倍数算出的等待时间
    fn register_code(multiple: u8) -> Result<u8, Error> {
        match multiple {
            1 => Ok(0b001),
            2 => Ok(0b010),
            4 => Ok(0b011),
            8 => Ok(0b100),
            16 => Ok(0b101),
            _ => Err(Error::Oversampling(multiple)),
        }
    }

    /// 温度过采样编码
    pub fn temperature_code(&self) -> Result<u8, Error> {
        Self::register_code(self.temperature)
    }

    /// 压力过采样编码
    pub fn pressure_code(&self) -> Result<u8, Error> {
        Self::register_code(self.pressure)
    }

    /// 湿度过采样编码
    pub fn humidity_code(&self) -> Result<u8, Error> {
        Self::register_code(self.humidity)
    }

    /// 计算一次强制模式转换需要等待的最大时间
    ///
    /// 数据手册附录B的测量时间公式（单位毫秒）：
    /// `1.25 + 2.3*osrs_t + (2.3*osrs_p + 0.575) + (2.3*osrs_h + 0.575)`
    ///
    /// 等待时间与过采样配置成正比，修改配置后无需改动其他代码
    pub fn measurement_delay(&self) -> Duration {
        let ms = 1.25
            + 2.3 * self.temperature as f64
            + (2.3 * self.pressure as f64 + 0.575)
            + (2.3 * self.humidity as f64 + 0.575);
        Duration::from_secs_f64(ms / 1000.0)
    }
}

/// BME280出厂校准参数
///
/// 16个有名字的整型系数，从传感器EEPROM的三个固定寄存器块
/// 读出后立即不可变。每个测量周期重新读取一次（数据手册允许
/// 跨周期缓存，这里保持每次读取的保守做法）
#[derive(Debug, Default, Clone)]
pub struct Calibration {
    /// 温度系数1，无符号16位，地址0x88-0x89（小端序）
    pub dig_t1: u16,
    /// 温度系数2，有符号16位，地址0x8A-0x8B
    pub dig_t2: i16,
    /// 温度系数3，有符号16位，地址0x8C-0x8D
    pub dig_t3: i16,
    /// 压力系数1，无符号16位，地址0x8E-0x8F
    ///
    /// 补偿公式中作为最终除数的因子，为0时压力无法确定
    pub dig_p1: u16,
    /// 压力系数2，有符号16位，地址0x90-0x91
    pub dig_p2: i16,
    /// 压力系数3，有符号16位，地址0x92-0x93
    pub dig_p3: i16,
    /// 压力系数4，有符号16位，地址0x94-0x95
    pub dig_p4: i16,
    /// 压力系数5，有符号16位，地址0x96-0x97
    pub dig_p5: i16,
    /// 压力系数6，有符号16位，地址0x98-0x99
    pub dig_p6: i16,
    /// 压力系数7，有符号16位，地址0x9A-0x9B
    pub dig_p7: i16,
    /// 压力系数8，有符号16位，地址0x9C-0x9D
    pub dig_p8: i16,
    /// 压力系数9，有符号16位，地址0x9E-0x9F
    pub dig_p9: i16,
    /// 湿度系数1，无符号8位，地址0xA1
    pub dig_h1: u8,
    /// 湿度系数2，有符号16位，地址0xE1-0xE2
    pub dig_h2: i16,
    /// 湿度系数3，无符号8位，地址0xE3
    pub dig_h3: u8,
    /// 湿度系数4，12位有符号，0xE4整字节拼0xE5低4位
    pub dig_h4: i16,
    /// 湿度系数5，12位有符号，0xE6整字节拼0xE5高4位
    pub dig_h5: i16,
    /// 湿度系数6，有符号8位，地址0xE7
    pub dig_h6: i8,
}

impl Calibration {
    /// 从三个校准寄存器块解码出16个系数
    ///
    /// - `cal1`: 24字节 @0x88，温度/压力系数按偶数偏移小端序排布
    /// - `cal2`: 1字节 @0xA1，湿度系数H1
    /// - `cal3`: 7字节 @0xE1，湿度系数H2~H6
    ///
    /// H4/H5是数据手册规定的12位打包字段：一个有符号字节拼上
    /// 相邻字节借来的4位，经算术移位符号扩展后按位或出低4位，
    /// 任何偏差都会毁掉湿度读数。
    /// cal1读回全零说明EEPROM读取失败，返回[`Error::Calibration`]
    pub fn from_blocks(cal1: &[u8; 24], cal2: &[u8; 1], cal3: &[u8; 7]) -> Result<Self, Error> {
        // 全零的系数块物理上不可能，判定为EEPROM误读
        if cal1.iter().all(|&b| b == 0) {
            return Err(Error::Calibration(
                "温度/压力校准块(0x88)读回全零".to_string(),
            ));
        }

        // 湿度系数H4/H5的12位打包解包
        let dig_h4 = sign_extend_12(signed_byte(cal3, 3), cal3[4]);
        let dig_h5 = sign_extend_12(signed_byte(cal3, 5), (cal3[4] >> 4) & 0x0F);

        Ok(Self {
            dig_t1: unsigned_short(cal1, 0),
            dig_t2: signed_short(cal1, 2),
            dig_t3: signed_short(cal1, 4),
            dig_p1: unsigned_short(cal1, 6),
            dig_p2: signed_short(cal1, 8),
            dig_p3: signed_short(cal1, 10),
            dig_p4: signed_short(cal1, 12),
            dig_p5: signed_short(cal1, 14),
            dig_p6: signed_short(cal1, 16),
            dig_p7: signed_short(cal1, 18),
            dig_p8: signed_short(cal1, 20),
            dig_p9: signed_short(cal1, 22),
            dig_h1: unsigned_byte(cal2, 0),
            dig_h2: signed_short(cal3, 0),
            dig_h3: unsigned_byte(cal3, 2),
            dig_h4: dig_h4 as i16,
            dig_h5: dig_h5 as i16,
            dig_h6: signed_byte(cal3, 6),
        })
    }

    /// 温度补偿
    ///
    /// 数据手册4.2.3节的两段定点公式，右移全部为保留符号的
    /// 算术移位。除了摄氏温度外还产出中间量t_fine，压力和
    /// 湿度补偿都依赖它
    ///
    /// - `adc_t`: 20位原始温度ADC值
    /// - 返回: (温度【℃】, t_fine)
    pub fn compensate_temperature(&self, adc_t: i32) -> (f64, i32) {
        // 中间乘积在i64下计算：20位原始值配上极端系数时i32会溢出
        let adc_t = adc_t as i64;
        let dig_t1 = self.dig_t1 as i64;
        let dig_t2 = self.dig_t2 as i64;
        let dig_t3 = self.dig_t3 as i64;

        let var1 = (((adc_t >> 3) - (dig_t1 << 1)) * dig_t2) >> 11;
        let var2 = (((((adc_t >> 4) - dig_t1) * ((adc_t >> 4) - dig_t1)) >> 12) * dig_t3) >> 14;
        let t_fine = var1 + var2;

        // 定点结果分辨率0.01℃
        let temperature = (((t_fine * 5) + 128) >> 8) as f64 / 100.0;
        (temperature, t_fine as i32)
    }

    /// 压力补偿
    ///
    /// 数据手册4.2.3节的双精度浮点公式，使用t_fine和9个压力
    /// 系数。公式中的除数var1恰好为零时本次压力无法确定，
    /// 返回[`Error::PressureUndetermined`]而不是0
    ///
    /// - `adc_p`: 20位原始压力ADC值
    /// - `t_fine`: 温度补偿产出的中间量
    /// - 返回: 压力【hPa】
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: i32) -> Result<f64, Error> {
        let mut var1 = t_fine as f64 / 2.0 - 64000.0;
        let mut var2 = var1 * var1 * self.dig_p6 as f64 / 32768.0;
        var2 = var2 + var1 * self.dig_p5 as f64 * 2.0;
        var2 = var2 / 4.0 + self.dig_p4 as f64 * 65536.0;
        var1 = (self.dig_p3 as f64 * var1 * var1 / 524288.0 + self.dig_p2 as f64 * var1)
            / 524288.0;
        var1 = (1.0 + var1 / 32768.0) * self.dig_p1 as f64;

        // 除数为零时没有有效的压力，向调用方报告而不是返回0
        if var1 == 0.0 {
            return Err(Error::PressureUndetermined);
        }

        let mut pressure = 1048576.0 - adc_p as f64;
        pressure = ((pressure - var2 / 4096.0) * 6250.0) / var1;
        var1 = self.dig_p9 as f64 * pressure * pressure / 2147483648.0;
        var2 = pressure * self.dig_p8 as f64 / 32768.0;
        pressure = pressure + (var1 + var2 + self.dig_p7 as f64) / 16.0;

        // Pa换算hPa
        Ok(pressure / 100.0)
    }

    /// 湿度补偿
    ///
    /// 数据手册4.2.3节的双精度浮点公式，使用t_fine和6个湿度
    /// 系数，结果限制在[0, 100]区间内
    ///
    /// - `adc_h`: 16位原始湿度ADC值
    /// - 返回: 相对湿度【%RH】
    pub fn compensate_humidity(&self, adc_h: i32, t_fine: i32) -> f64 {
        let mut humidity = t_fine as f64 - 76800.0;
        humidity = (adc_h as f64
            - (self.dig_h4 as f64 * 64.0 + self.dig_h5 as f64 / 16384.0 * humidity))
            * (self.dig_h2 as f64 / 65536.0
                * (1.0
                    + self.dig_h6 as f64 / 67108864.0
                        * humidity
                        * (1.0 + self.dig_h3 as f64 / 67108864.0 * humidity)));
        humidity = humidity * (1.0 - self.dig_h1 as f64 * humidity / 524288.0);

        if humidity > 100.0 {
            100.0
        } else if humidity < 0.0 {
            0.0
        } else {
            humidity
        }
    }
}

/// 一次突发读取出的原始ADC三元组
///
/// 瞬态数据，提取后立即交给补偿公式消费
#[derive(Debug, Clone, Copy)]
pub struct RawSample {
    /// 20位原始压力值
    pub pressure: i32,
    /// 20位原始温度值
    pub temperature: i32,
    /// 16位原始湿度值
    pub humidity: i32,
}

impl RawSample {
    /// 从0xF7起的8字节结果块提取三个原始值
    ///
    /// 压力取字节0..2的高20位，温度取字节3..5的高20位，
    /// 湿度取字节6..7的16位
    pub fn from_block(data: &[u8; 8]) -> Self {
        let pressure =
            ((data[0] as i32) << 12) | ((data[1] as i32) << 4) | ((data[2] as i32) >> 4);
        let temperature =
            ((data[3] as i32) << 12) | ((data[4] as i32) << 4) | ((data[5] as i32) >> 4);
        let humidity = ((data[6] as i32) << 8) | data[7] as i32;
        Self {
            pressure,
            temperature,
            humidity,
        }
    }
}

/// 补偿后的环境读数
#[derive(Debug, Clone, Copy)]
pub struct Reading {
    /// 温度【℃】
    pub temperature: f64,
    /// 压力【hPa】
    pub pressure: f64,
    /// 相对湿度【%RH】，已限制在[0, 100]
    pub humidity: f64,
}

/// BME280大气压力、温度、湿度传感器驱动
///
/// 对`embedded_hal::i2c::I2c`和`embedded_timers::clock::Clock`
/// 泛型：I2C句柄由调用方独占并按次传入（传感器不支持并发的
/// 强制模式触发，独占可变借用天然保证互斥），时钟注入决定
/// 转换等待策略，测试里可以换成零等待的假时钟
pub struct Driver<'a, C: Clock> {
    /// 注入的时钟，用于转换等待
    clock: &'a C,
    /// 总线适配器（持有从设备地址）
    bus: Bus,
    /// 过采样配置
    oversampling: Oversampling,
}

impl<'a, C: Clock> Driver<'a, C> {
    /// 创建BME280驱动实例
    ///
    /// 等待上电完成后检查状态寄存器，并关闭IIR滤波器。
    /// `addr`为None时使用默认地址0x76
    pub fn new<I2C: I2c>(clock: &'a C, i2c: &mut I2C, addr: Option<u8>) -> Result<Self, Error> {
        let this = Self {
            clock,
            bus: Bus::new(addr.unwrap_or(DEFAULT_ADDR)),
            oversampling: Oversampling::default(),
        };

        // 传感器上电后必须等待2ms以上
        this.wait(Duration::from_millis(3));

        // 检查传感器是否还在向寄存器复制NVM校准数据
        this.check_ready(i2c)?;

        // 滤波器关闭，3线SPI关闭（强制模式下待机时间无意义）
        this.bus.write_byte(i2c, REG_CONFIG, 0x00)?;

        Ok(this)
    }

    /// 修改过采样配置（下一次read生效，等待时间随之按比例变化）
    ///
    /// 倍数必须是1/2/4/8/16之一，否则拒绝
    pub fn set_oversampling(&mut self, oversampling: Oversampling) -> Result<(), Error> {
        oversampling.temperature_code()?;
        oversampling.pressure_code()?;
        oversampling.humidity_code()?;
        self.oversampling = oversampling;
        Ok(())
    }

    /// 依赖注入时钟的阻塞等待
    fn wait(&self, duration: Duration) {
        let start = self.clock.now();
        while self.clock.elapsed(start) < duration {}
    }

    /// 检查传感器是否就绪
    fn check_ready<I2C: I2c>(&self, i2c: &mut I2C) -> Result<(), Error> {
        let mut status = [0u8];
        self.bus.read_block(i2c, &[REG_STATUS], &mut status)?;

        // 状态寄存器第0位为1表示NVM数据还在复制中
        if status[0] & 0x01 != 0 {
            return Err(Error::Calibration(
                "传感器正在复制NVM校准数据，尚未就绪".to_string(),
            ));
        }

        Ok(())
    }

    /// 读取芯片ID和版本号
    ///
    /// - 返回: (chip_id, chip_version)，BME280的chip_id为0x60
    pub fn chip_id<I2C: I2c>(&self, i2c: &mut I2C) -> Result<(u8, u8), Error> {
        let mut id = [0u8; 2];
        self.bus.read_block(i2c, &[REG_ID], &mut id)?;
        Ok((id[0], id[1]))
    }

    /// 软复位传感器，等待NVM数据重新加载完成
    pub fn reset<I2C: I2c>(&self, i2c: &mut I2C) -> Result<(), Error> {
        self.bus.write_byte(i2c, REG_RESET, RESET_CMD)?;

        // 复位后启动时间最长2ms
        self.wait(Duration::from_millis(3));
        self.check_ready(i2c)
    }

    /// 读取三个校准寄存器块并解码
    fn read_calibration<I2C: I2c>(&self, i2c: &mut I2C) -> Result<Calibration, Error> {
        // 温度/压力系数块（数据手册第22页）
        let mut cal1 = [0u8; 24];
        self.bus.read_block(i2c, &[REG_CALIB_TP], &mut cal1)?;

        // 湿度系数H1
        let mut cal2 = [0u8; 1];
        self.bus.read_block(i2c, &[REG_CALIB_H1], &mut cal2)?;

        // 湿度系数H2~H6
        let mut cal3 = [0u8; 7];
        self.bus.read_block(i2c, &[REG_CALIB_H2], &mut cal3)?;

        Calibration::from_blocks(&cal1, &cal2, &cal3)
    }

    /// 触发一次强制模式转换并读取补偿后的环境数据
    ///
    /// 流程：写入过采样/模式控制字触发转换，转换进行期间
    /// 读取校准块（EEPROM读取不受转换影响），按附录B公式
    /// 等待转换完成，最后突发读取8字节结果并补偿
    pub fn read<I2C: I2c>(&mut self, i2c: &mut I2C) -> Result<Reading, Error> {
        // 湿度过采样必须在写ctrl_meas之前写入才会生效（数据手册第26页）
        self.bus
            .write_byte(i2c, REG_CTRL_HUM, self.oversampling.humidity_code()?)?;

        // 组合控制字：温度过采样编码<<5 | 压力过采样编码<<2 | 强制模式
        let control = (self.oversampling.temperature_code()? << 5)
            | (self.oversampling.pressure_code()? << 2)
            | MODE_FORCED;
        self.bus.write_byte(i2c, REG_CTRL_MEAS, control)?;

        // 每个测量周期重新读取校准参数
        let calib = self.read_calibration(i2c)?;

        // 等待转换完成
        self.wait(self.oversampling.measurement_delay());

        // 突发读取0xF7起的8字节结果
        let mut data = [0u8; 8];
        self.bus.read_block(i2c, &[REG_DATA], &mut data)?;
        let raw = RawSample::from_block(&data);

        // 先补偿温度产出t_fine，再补偿压力和湿度
        let (temperature, t_fine) = calib.compensate_temperature(raw.temperature);
        let pressure = calib.compensate_pressure(raw.pressure, t_fine)?;
        let humidity = calib.compensate_humidity(raw.humidity, t_fine);

        Ok(Reading {
            temperature,
            pressure,
            humidity,
        })
    }
}
