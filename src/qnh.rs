//! 气压海平面归算（QNH）
//!
//! 与传感器读取完全无关的独立纯函数，按气压测高公式把
//! 站点气压折算到海平面，用于航空高度表拨正值

/// 大气平均摩尔质量 M（kg/mol）
pub const MOLAR_MASS: f64 = 0.02896;
/// 重力加速度 g（m/s²）
pub const GRAVITY: f64 = 9.807;
/// 通用气体常数 R（J/(K·mol)）
pub const GAS_CONSTANT: f64 = 8.314;

/// 把站点气压归算到海平面
///
/// - `pressure_hpa`: 站点气压（hPa）
/// - `altitude_m`: 站点海拔（m）
/// - `temperature_k`: 参考绝对温度（K，通常取年平均气温）
///
/// 归算系数为 `exp((M*g*h) / (R*T))`，海拔为0时系数为1
pub fn sea_level_pressure(pressure_hpa: f64, altitude_m: f64, temperature_k: f64) -> f64 {
    let reduction = ((MOLAR_MASS * GRAVITY * altitude_m) / (GAS_CONSTANT * temperature_k)).exp();
    pressure_hpa * reduction
}
