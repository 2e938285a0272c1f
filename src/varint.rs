use crate::error::{McWireError, Result};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// VarInt最大字节数
pub const VARINT_MAX_BYTES: usize = 5;

/// VarLong最大字节数
pub const VARLONG_MAX_BYTES: usize = 10;

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

/// 写入VarInt，返回写入的字节数
///
/// 负数按32位补码的无符号形式编码，因此总是占满5个字节。
pub fn write_varint<W: Write>(writer: &mut W, value: i32) -> Result<usize> {
    write_unsigned(writer, value as u32 as u64)
}

/// 写入VarLong，返回写入的字节数
pub fn write_varlong<W: Write>(writer: &mut W, value: i64) -> Result<usize> {
    write_unsigned(writer, value as u64)
}

fn write_unsigned<W: Write>(writer: &mut W, mut value: u64) -> Result<usize> {
    let mut written = 0;
    loop {
        let byte = (value as u8) & SEGMENT_BITS;
        value >>= 7;
        written += 1;
        if value == 0 {
            writer.write_u8(byte)?;
            return Ok(written);
        }
        writer.write_u8(byte | CONTINUE_BIT)?;
    }
}

/// 读取VarInt
pub fn read_varint<R: Read>(reader: &mut R) -> Result<i32> {
    Ok(read_unsigned(reader, VARINT_MAX_BYTES, 32)? as u32 as i32)
}

/// 读取VarLong
pub fn read_varlong<R: Read>(reader: &mut R) -> Result<i64> {
    Ok(read_unsigned(reader, VARLONG_MAX_BYTES, 64)? as i64)
}

fn read_unsigned<R: Read>(reader: &mut R, max_bytes: usize, bits: u32) -> Result<u64> {
    let mut value: u64 = 0;
    for i in 0..max_bytes {
        let byte = reader.read_u8()?;
        let shift = 7 * i as u32;
        let segment = (byte & SEGMENT_BITS) as u64;

        // 最后一个字节中超出类型宽度的位必须为0
        if shift + 7 > bits && segment >> (bits - shift) != 0 {
            return Err(McWireError::VarIntTooLong { max: max_bytes });
        }
        value |= segment << shift;

        if byte & CONTINUE_BIT == 0 {
            return Ok(value);
        }
    }
    Err(McWireError::VarIntTooLong { max: max_bytes })
}

/// 计算VarInt编码后的字节数
pub fn varint_size(value: i32) -> usize {
    let mut value = value as u32;
    let mut size = 1;
    while value >= 0x80 {
        value >>= 7;
        size += 1;
    }
    size
}
