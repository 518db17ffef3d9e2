/// BME280传感器错误分类
///
/// 所有失败都必须向调用方暴露，禁止静默重试或吞掉错误：
/// - 总线事务失败归类为`Bus`
/// - EEPROM校准数据读取异常（例如全零）归类为`Calibration`
/// - 压力补偿公式中除数var1为零时归类为`PressureUndetermined`，
///   不允许把0当作真实的压力读数返回
#[derive(Debug)]
pub enum Error {
    /// I2C总线事务失败（读或写）
    Bus(String),
    /// 校准参数不可信（例如EEPROM读回全零）
    Calibration(String),
    /// 压力补偿公式退化（var1 == 0），本次压力无法确定
    PressureUndetermined,
    /// 不支持的过采样倍数（合法值为1/2/4/8/16）
    Oversampling(u8),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bus(msg) => write!(f, "I2C总线事务失败: {}", msg),
            Self::Calibration(msg) => write!(f, "校准参数不可信: {}", msg),
            Self::PressureUndetermined => write!(f, "压力补偿公式退化(var1 == 0)，压力无法确定"),
            Self::Oversampling(multiple) => {
                write!(f, "不支持的过采样倍数: {}（合法值为1/2/4/8/16）", multiple)
            }
        }
    }
}

impl std::error::Error for Error {}
