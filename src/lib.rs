//! 树莓派上的BME280环境传感器读取库
//!
//! 通过I2C读取出厂校准参数和原始ADC值，按数据手册的补偿公式
//! 换算成温度、压力、湿度，并提供气压的海平面归算

pub mod bus;
pub mod decode;
pub mod error;
pub mod qnh;
pub mod sensor;
pub mod std_clock;
