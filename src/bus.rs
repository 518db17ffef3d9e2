use embedded_hal::i2c::I2c;

use crate::error::Error;

/// I2C总线适配器
///
/// 持有从设备地址，按寄存器地址发起读写事务。对
/// `embedded_hal::i2c::I2c`泛型，树莓派上用rppal的I2C外设，
/// 测试里可以换成内存中的假总线。
pub struct Bus {
    /// I2C从设备地址
    /// - BME280的地址通常为: 0x76（备选0x77）
    addr: u8,
}

impl Bus {
    /// 创建总线适配器
    pub fn new(addr: u8) -> Self {
        Self { addr }
    }

    /// 返回从设备地址
    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// 从寄存器读取一个数据块
    ///
    /// `register`允许多字节寄存器地址：各字节按大端序拼接后
    /// 作为一次写事务发出，随后读取`buf.len()`个字节。
    /// 总线层失败一律归类为[`Error::Bus`]抛给调用方
    pub fn read_block<I2C: I2c>(
        &self,
        i2c: &mut I2C,
        register: &[u8],
        buf: &mut [u8],
    ) -> Result<(), Error> {
        i2c.write_read(self.addr, register, buf)
            .map_err(|err| Error::Bus(format!("读寄存器{:02X?}失败: {:?}", register, err)))
    }

    /// 向单字节寄存器写入一个字节
    pub fn write_byte<I2C: I2c>(&self, i2c: &mut I2C, register: u8, value: u8) -> Result<(), Error> {
        i2c.write(self.addr, &[register, value])
            .map_err(|err| Error::Bus(format!("写寄存器0x{:02X}失败: {:?}", register, err)))
    }
}
