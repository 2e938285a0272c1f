use crate::error::{McWireError, Result};
use byteorder::ReadBytesExt;
use std::io::Read;

/// 编码为UTF-16BE字节
pub fn encode_utf16be(value: &str) -> Vec<u8> {
    value.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
}

/// 解码UTF-16BE字节
pub fn decode_utf16be(data: &[u8]) -> Result<String> {
    if data.len() % 2 != 0 {
        return Err(McWireError::Malformed("UTF-16数据长度为奇数".to_string()));
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| McWireError::Malformed(format!("无效的UTF-16: {}", e)))
}

/// 读取以NUL结尾的字符串，按Latin-1逐字节解码
pub fn read_cstring<R: Read>(reader: &mut R) -> Result<String> {
    let mut out = String::new();
    loop {
        match reader.read_u8()? {
            0 => return Ok(out),
            b => out.push(b as char),
        }
    }
}

/// 写入以NUL结尾的字符串
pub fn write_cstring(buf: &mut Vec<u8>, value: &str) {
    buf.extend_from_slice(value.as_bytes());
    buf.push(0);
}

/// 去除 `§x` 格式代码
pub fn strip_formatting(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '§' {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_utf16_round_trip() {
        let bytes = encode_utf16be("§1 Hi");
        assert_eq!(&bytes[..2], &[0x00, 0xA7]);
        assert_eq!(decode_utf16be(&bytes).unwrap(), "§1 Hi");
        assert!(decode_utf16be(&[0x00]).is_err());
    }

    #[test]
    fn test_cstrings() {
        let mut buf = Vec::new();
        write_cstring(&mut buf, "hostname");
        write_cstring(&mut buf, "");
        let mut cursor = Cursor::new(buf);
        assert_eq!(read_cstring(&mut cursor).unwrap(), "hostname");
        assert_eq!(read_cstring(&mut cursor).unwrap(), "");
        assert!(read_cstring(&mut cursor).is_err());
    }

    #[test]
    fn test_strip_formatting() {
        assert_eq!(strip_formatting("§aHello §lWorld§r"), "Hello World");
    }
}
