//! 字节序列到整数的纯解码函数
//!
//! BME280的校准参数以小端序存放在固定布局的寄存器块中，
//! 这里提供按偏移量取值的四个基础解码函数，以及湿度校准
//! 参数H4/H5需要的12位符号扩展辅助函数。

/// 从data的index处读取小端序无符号16位整数
pub fn unsigned_short(data: &[u8], index: usize) -> u16 {
    u16::from_le_bytes([data[index], data[index + 1]])
}

/// 从data的index处读取小端序有符号16位整数
///
/// 与无符号读取位模式完全一致，按二进制补码重新解释，
/// 整个16位输入域都必须精确往返
pub fn signed_short(data: &[u8], index: usize) -> i16 {
    unsigned_short(data, index) as i16
}

/// 从data的index处读取无符号8位整数
pub fn unsigned_byte(data: &[u8], index: usize) -> u8 {
    data[index]
}

/// 从data的index处读取有符号8位整数（大于127则减256）
pub fn signed_byte(data: &[u8], index: usize) -> i8 {
    data[index] as i8
}

/// 组装12位有符号字段并做符号扩展
///
/// 湿度校准参数H4/H5在EEPROM中被拆成一个有符号字节加上
/// 相邻字节借来的4位，数据手册要求先左移24位再算术右移20位
/// 完成符号扩展，最后按位或上低4位
pub fn sign_extend_12(msb: i8, low_nibble: u8) -> i32 {
    (((msb as i32) << 24) >> 20) | (low_nibble & 0x0F) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_short_is_little_endian() {
        // 0x6B70 = 27504，数据手册示例中的dig_T1
        let data = [0x70, 0x6B];
        assert_eq!(unsigned_short(&data, 0), 27504);
    }

    #[test]
    fn signed_short_round_trips_full_domain() {
        // 全部16位输入域：无符号 -> 有符号 -> 无符号 必须精确往返
        for u in 0..=u16::MAX {
            let bytes = u.to_le_bytes();
            let s = signed_short(&bytes, 0);
            assert_eq!(s as u16, u);
            // 与直接定义一致：第15位为1时等于无符号值减65536
            if u & 0x8000 != 0 {
                assert_eq!(s as i32, u as i32 - 65536);
            } else {
                assert_eq!(s as i32, u as i32);
            }
        }
    }

    #[test]
    fn signed_byte_subtracts_256_above_127() {
        assert_eq!(signed_byte(&[0x7F], 0), 127);
        assert_eq!(signed_byte(&[0x80], 0), -128);
        assert_eq!(signed_byte(&[0xFF], 0), -1);
        assert_eq!(unsigned_byte(&[0xFF], 0), 255);
    }

    #[test]
    fn sign_extend_12_pins_exact_bit_patterns() {
        // 正值：0x13B = 315（H4典型组装结果）
        assert_eq!(sign_extend_12(0x13, 0x0B), 315);
        // 高位字节为-1时，整个12位字段为-1
        assert_eq!(sign_extend_12(-1, 0x0F), -1);
        // 12位最小值
        assert_eq!(sign_extend_12(-128, 0x00), -2048);
        // 低4位之外的位必须被屏蔽
        assert_eq!(sign_extend_12(0x02, 0xF2), (0x02 << 4) | 0x02);
    }
}
