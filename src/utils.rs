/// 解析十进制或 0x 开头的十六进制数
pub fn parse_number(s: &str) -> Option<u32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// 每行 16 字节的十六进制转储，`base` 为第一行显示的偏移
pub fn hex_dump(bytes: &[u8], base: usize) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(row, chunk)| {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            format!("{:08x}  {:<47}  |{}|", base + row * 16, hex.join(" "), ascii)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_in_both_bases() {
        assert_eq!(parse_number("41"), Some(41));
        assert_eq!(parse_number("0x29"), Some(41));
        assert_eq!(parse_number("0XfF"), Some(255));
        assert_eq!(parse_number("-1"), None);
        assert_eq!(parse_number("0x"), None);
    }

    #[test]
    fn dump_shows_offset_hex_and_ascii() {
        let dump = hex_dump(b"T2FS\x32\x7e", 0x100);
        assert_eq!(dump, format!("00000100  {:<47}  |T2FS2~|", "54 32 46 53 32 7e"));
        assert_eq!(hex_dump(&[0u8; 32], 0).lines().count(), 2);
    }
}
