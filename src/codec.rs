use crate::{
    error::{McWireError, Result},
    identifier::validate_identifier,
    nbt,
    schema::Schema,
    types::Value,
    varint::{read_varint, read_varlong, write_varint, write_varlong},
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;
use uuid::Uuid;

/// String默认最大字节数
pub const MAX_STRING_LENGTH: usize = 32767;

/// Chat最大字节数
pub const MAX_CHAT_LENGTH: usize = 262144;

/// 读取时由外部提供的附加信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadHint {
    /// 长度上界：Bytes为字节数，Array为元素个数，其余类型为编码后的字节数
    pub length: Option<usize>,
    /// Optional的存在标志
    pub present: Option<bool>,
}

impl ReadHint {
    pub fn length(length: usize) -> Self {
        Self {
            length: Some(length),
            present: None,
        }
    }

    pub fn present(present: bool) -> Self {
        Self {
            length: None,
            present: Some(present),
        }
    }
}

/// 无状态的编解码器描述，构造一次后可在任意线程中重复使用
#[derive(Debug, Clone)]
pub enum Codec {
    Bool,
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    VarInt,
    VarLong,
    /// VarInt长度前缀的UTF-8字符串
    String { max: usize },
    /// 经过命名空间校验的字符串
    Identifier,
    /// JSON文本组件
    Chat,
    /// 原始字节；未给出长度时读到缓冲区末尾
    Bytes { max: Option<usize> },
    /// 固定16字节大端UUID
    Uuid,
    Prefixed { inner: Box<Codec>, length: Box<Codec> },
    Optional(Box<Codec>),
    Enum { inner: Box<Codec>, allowed: Vec<i64> },
    /// 写入返回元素个数而非字节数
    Array(Box<Codec>),
    Nested(Arc<Schema>),
    Nbt,
}

impl Codec {
    pub fn string() -> Self {
        Codec::String {
            max: MAX_STRING_LENGTH,
        }
    }

    pub fn string_max(max: usize) -> Self {
        Codec::String { max }
    }

    pub fn bytes() -> Self {
        Codec::Bytes { max: None }
    }

    pub fn prefixed(inner: Codec, length: Codec) -> Self {
        Codec::Prefixed {
            inner: Box::new(inner),
            length: Box::new(length),
        }
    }

    pub fn optional(inner: Codec) -> Self {
        Codec::Optional(Box::new(inner))
    }

    pub fn enumerated(inner: Codec, allowed: impl IntoIterator<Item = i64>) -> Self {
        Codec::Enum {
            inner: Box::new(inner),
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn array(inner: Codec) -> Self {
        Codec::Array(Box::new(inner))
    }

    pub fn nested(schema: Schema) -> Self {
        Codec::Nested(Arc::new(schema))
    }

    /// 写入值，返回写入的字节数（Array返回元素个数）
    pub fn write(&self, buf: &mut Vec<u8>, value: &Value) -> Result<usize> {
        let start = buf.len();
        match self {
            Codec::Bool => buf.write_u8(bool_value(value)? as u8)?,
            Codec::Byte => buf.write_i8(int_value(value)?)?,
            Codec::UByte => buf.write_u8(int_value(value)?)?,
            Codec::Short => buf.write_i16::<BigEndian>(int_value(value)?)?,
            Codec::UShort => buf.write_u16::<BigEndian>(int_value(value)?)?,
            Codec::Int => buf.write_i32::<BigEndian>(int_value(value)?)?,
            Codec::UInt => buf.write_u32::<BigEndian>(int_value(value)?)?,
            Codec::Long => buf.write_i64::<BigEndian>(int_value(value)?)?,
            Codec::ULong => buf.write_u64::<BigEndian>(ulong_value(value)?)?,
            Codec::Float => buf.write_f32::<BigEndian>(float_value(value)? as f32)?,
            Codec::Double => buf.write_f64::<BigEndian>(float_value(value)?)?,
            Codec::VarInt => {
                write_varint(buf, int_value(value)?)?;
            }
            Codec::VarLong => {
                write_varlong(buf, int_value(value)?)?;
            }
            Codec::String { max } => write_string(buf, str_value(value)?, *max)?,
            Codec::Identifier => {
                let id = str_value(value)?;
                validate_identifier(id)?;
                write_string(buf, id, MAX_STRING_LENGTH)?;
            }
            Codec::Chat => {
                let text = match value {
                    Value::Json(json) => serde_json::to_string(json)?,
                    Value::String(plain) => serde_json::to_string(plain)?,
                    other => return Err(mismatch("json", other)),
                };
                write_string(buf, &text, MAX_CHAT_LENGTH)?;
            }
            Codec::Bytes { max } => {
                let bytes = match value {
                    Value::Bytes(b) => b,
                    other => return Err(mismatch("bytes", other)),
                };
                check_size(bytes.len(), *max)?;
                buf.extend_from_slice(bytes);
            }
            Codec::Uuid => match value {
                Value::Uuid(uuid) => buf.write_u128::<BigEndian>(uuid.as_u128())?,
                other => return Err(mismatch("uuid", other)),
            },
            Codec::Prefixed { inner, length } => {
                let mut scratch = Vec::new();
                let size = inner.write(&mut scratch, value)?;
                let size = i64::try_from(size).map_err(|_| McWireError::SizeViolation {
                    length: size,
                    max: i64::MAX as usize,
                })?;
                length.write(buf, &Value::Long(size))?;
                buf.extend_from_slice(&scratch);
            }
            Codec::Optional(inner) => {
                if value.is_none() {
                    return Ok(0);
                }
                return inner.write(buf, value);
            }
            Codec::Enum { inner, allowed } => {
                check_allowed(value.to_i64()?, allowed)?;
                return inner.write(buf, value);
            }
            Codec::Array(inner) => {
                let items = match value {
                    Value::Array(items) => items,
                    other => return Err(mismatch("array", other)),
                };
                for item in items {
                    inner.write(buf, item)?;
                }
                return Ok(items.len());
            }
            Codec::Nested(schema) => match value {
                Value::Record(record) => {
                    schema.write(buf, record)?;
                }
                other => return Err(mismatch("record", other)),
            },
            Codec::Nbt => match value {
                Value::Nbt(tag) => {
                    nbt::write_tag(buf, tag)?;
                }
                other => return Err(mismatch("nbt", other)),
            },
        }
        Ok(buf.len() - start)
    }

    /// 从内存缓冲区读取值
    pub fn read(&self, buf: &mut Cursor<&[u8]>, hint: ReadHint) -> Result<Value> {
        let value = match self {
            Codec::Bool => Value::Bool(buf.read_u8()? != 0),
            Codec::Byte => Value::Byte(buf.read_i8()?),
            Codec::UByte => Value::UByte(buf.read_u8()?),
            Codec::Short => Value::Short(buf.read_i16::<BigEndian>()?),
            Codec::UShort => Value::UShort(buf.read_u16::<BigEndian>()?),
            Codec::Int => Value::Int(buf.read_i32::<BigEndian>()?),
            Codec::UInt => Value::UInt(buf.read_u32::<BigEndian>()?),
            Codec::Long => Value::Long(buf.read_i64::<BigEndian>()?),
            Codec::ULong => Value::ULong(buf.read_u64::<BigEndian>()?),
            Codec::Float => Value::Float(buf.read_f32::<BigEndian>()?),
            Codec::Double => Value::Double(buf.read_f64::<BigEndian>()?),
            Codec::VarInt => Value::Int(read_varint(buf)?),
            Codec::VarLong => Value::Long(read_varlong(buf)?),
            Codec::String { max } => Value::String(read_string(buf, *max)?),
            Codec::Identifier => {
                let id = read_string(buf, MAX_STRING_LENGTH)?;
                validate_identifier(&id)?;
                Value::String(id)
            }
            Codec::Chat => Value::Json(serde_json::from_str(&read_string(buf, MAX_CHAT_LENGTH)?)?),
            Codec::Bytes { max } => {
                let len = hint.length.unwrap_or_else(|| remaining(buf));
                check_size(len, *max)?;
                Value::Bytes(take_bytes(buf, len)?)
            }
            Codec::Uuid => Value::Uuid(Uuid::from_u128(buf.read_u128::<BigEndian>()?)),
            Codec::Prefixed { inner, length } => {
                let len = length.read(buf, ReadHint::default())?.to_i64()?;
                let len = usize::try_from(len)
                    .map_err(|_| McWireError::Malformed(format!("负数长度前缀: {}", len)))?;
                read_bounded(inner, buf, len)?
            }
            Codec::Optional(inner) => match hint.present {
                Some(true) => inner.read(
                    buf,
                    ReadHint {
                        length: hint.length,
                        present: None,
                    },
                )?,
                Some(false) => Value::None,
                None => {
                    return Err(McWireError::Malformed(
                        "读取Optional需要存在标志".to_string(),
                    ))
                }
            },
            Codec::Enum { inner, allowed } => {
                let value = inner.read(buf, hint)?;
                check_allowed(value.to_i64()?, allowed)?;
                value
            }
            Codec::Array(inner) => {
                let count = hint.length.ok_or_else(|| {
                    McWireError::Malformed("读取数组需要外部提供元素个数".to_string())
                })?;
                // 除空字段表外每个元素至少占1字节
                if count > remaining(buf) && !matches!(**inner, Codec::Nested(_)) {
                    return Err(McWireError::Malformed(format!(
                        "数组声明 {} 个元素，仅剩 {} 字节",
                        count,
                        remaining(buf)
                    )));
                }
                let mut items = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    items.push(inner.read(buf, ReadHint::default())?);
                }
                Value::Array(items)
            }
            Codec::Nested(schema) => Value::Record(schema.read(buf)?),
            Codec::Nbt => Value::Nbt(nbt::read_tag(buf)?),
        };
        Ok(value)
    }

    /// 编码为独立的字节串
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        Ok(buf)
    }
}

/// 按长度前缀读取：Bytes与Array直接使用该值，其余类型视为字节数并要求恰好读完
fn read_bounded(inner: &Codec, buf: &mut Cursor<&[u8]>, len: usize) -> Result<Value> {
    match inner {
        Codec::Bytes { .. } | Codec::Array(_) => inner.read(buf, ReadHint::length(len)),
        _ => {
            let start = buf.position() as usize;
            let data: &[u8] = *buf.get_ref();
            let end = start
                .checked_add(len)
                .filter(|end| *end <= data.len())
                .ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "长度前缀超出缓冲区")
                })?;
            let mut sub = Cursor::new(&data[start..end]);
            let value = inner.read(&mut sub, ReadHint::default())?;
            if sub.position() as usize != len {
                return Err(McWireError::Malformed(format!(
                    "长度前缀为 {} 字节，实际读取 {} 字节",
                    len,
                    sub.position()
                )));
            }
            buf.set_position(end as u64);
            Ok(value)
        }
    }
}

fn write_string(buf: &mut Vec<u8>, value: &str, max: usize) -> Result<()> {
    check_size(value.len(), Some(max))?;
    // 长度已被限制在max以内
    write_varint(buf, value.len() as i32)?;
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn read_string(buf: &mut Cursor<&[u8]>, max: usize) -> Result<String> {
    let len = read_varint(buf)?;
    let len = usize::try_from(len)
        .map_err(|_| McWireError::Malformed(format!("负数字符串长度: {}", len)))?;
    check_size(len, Some(max))?;
    Ok(String::from_utf8(take_bytes(buf, len)?)?)
}

fn remaining(buf: &Cursor<&[u8]>) -> usize {
    buf.get_ref().len().saturating_sub(buf.position() as usize)
}

/// 读取 `len` 字节；长度超过剩余数据时在分配前报错
fn take_bytes(buf: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>> {
    let available = remaining(buf);
    if len > available {
        return Err(McWireError::Malformed(format!(
            "声明长度 {} 超过剩余的 {} 字节",
            len, available
        )));
    }
    let mut bytes = vec![0u8; len];
    buf.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn check_size(length: usize, max: Option<usize>) -> Result<()> {
    match max {
        Some(max) if length > max => Err(McWireError::SizeViolation { length, max }),
        _ => Ok(()),
    }
}

fn check_allowed(value: i64, allowed: &[i64]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(McWireError::InvalidEnumValue(value))
    }
}

fn mismatch(expected: &'static str, found: &Value) -> McWireError {
    McWireError::TypeMismatch {
        expected,
        found: found.type_name(),
    }
}

fn bool_value(value: &Value) -> Result<bool> {
    match value {
        Value::Bool(v) => Ok(*v),
        other => Err(mismatch("bool", other)),
    }
}

fn int_value<T: TryFrom<i64>>(value: &Value) -> Result<T> {
    let raw = value.to_i64()?;
    T::try_from(raw).map_err(|_| McWireError::Malformed(format!("整数 {} 超出类型范围", raw)))
}

fn ulong_value(value: &Value) -> Result<u64> {
    match value {
        Value::ULong(v) => Ok(*v),
        other => int_value(other),
    }
}

fn float_value(value: &Value) -> Result<f64> {
    match value {
        Value::Float(v) => Ok(*v as f64),
        Value::Double(v) => Ok(*v),
        other => Err(mismatch("float", other)),
    }
}

fn str_value(value: &Value) -> Result<&str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(mismatch("string", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::{Payload, Tag};

    fn round_trip(codec: &Codec, value: Value) -> Value {
        let bytes = codec.encode(&value).unwrap();
        let mut cursor = Cursor::new(bytes.as_slice());
        let decoded = codec.read(&mut cursor, ReadHint::present(true)).unwrap();
        assert_eq!(cursor.position() as usize, bytes.len());
        decoded
    }

    #[test]
    fn test_primitive_round_trips() {
        let cases = vec![
            (Codec::Bool, Value::Bool(true)),
            (Codec::Byte, Value::Byte(-128)),
            (Codec::UByte, Value::UByte(255)),
            (Codec::Short, Value::Short(-12345)),
            (Codec::UShort, Value::UShort(25565)),
            (Codec::Int, Value::Int(i32::MIN)),
            (Codec::UInt, Value::UInt(u32::MAX)),
            (Codec::Long, Value::Long(i64::MAX)),
            (Codec::ULong, Value::ULong(u64::MAX)),
            (Codec::Float, Value::Float(1.5)),
            (Codec::Double, Value::Double(-0.125)),
            (Codec::VarInt, Value::Int(-1)),
            (Codec::VarLong, Value::Long(i64::MIN)),
        ];
        for (codec, value) in cases {
            assert_eq!(round_trip(&codec, value.clone()), value, "{:?}", codec);
        }
    }

    #[test]
    fn test_big_endian_layout() {
        assert_eq!(Codec::Int.encode(&Value::Int(1)).unwrap(), vec![0, 0, 0, 1]);
        assert_eq!(Codec::UShort.encode(&Value::UShort(0x1234)).unwrap(), vec![0x12, 0x34]);
    }

    #[test]
    fn test_integer_out_of_range() {
        assert!(Codec::UByte.encode(&Value::Int(256)).is_err());
        assert!(Codec::Byte.encode(&Value::Int(-129)).is_err());
        assert!(Codec::Int.encode(&Value::String("1".into())).is_err());
    }

    #[test]
    fn test_short_read_is_io_error() {
        let mut cursor = Cursor::new(&[0u8, 1][..]);
        let err = Codec::Int.read(&mut cursor, ReadHint::default()).unwrap_err();
        assert!(matches!(err, McWireError::Io(_)));
    }

    #[test]
    fn test_string_layout_and_cap() {
        let bytes = Codec::string().encode(&Value::from("hi")).unwrap();
        assert_eq!(bytes, vec![2, b'h', b'i']);

        let long = "a".repeat(MAX_STRING_LENGTH + 1);
        let err = Codec::string().encode(&Value::from(long.as_str())).unwrap_err();
        assert!(matches!(err, McWireError::SizeViolation { max: 32767, .. }));

        let max = "é".repeat(MAX_STRING_LENGTH / 2);
        assert_eq!(round_trip(&Codec::string(), Value::from(max.as_str())), Value::from(max));
    }

    #[test]
    fn test_string_cap_on_decode() {
        let mut bytes = Vec::new();
        write_varint(&mut bytes, 17).unwrap();
        bytes.extend_from_slice(&[b'x'; 17]);
        let err = Codec::string_max(16)
            .read(&mut Cursor::new(bytes.as_slice()), ReadHint::default())
            .unwrap_err();
        assert!(matches!(err, McWireError::SizeViolation { length: 17, max: 16 }));
    }

    #[test]
    fn test_identifier_validation() {
        assert_eq!(
            round_trip(&Codec::Identifier, Value::from("minecraft:stone")),
            Value::from("minecraft:stone")
        );

        let err = Codec::Identifier.encode(&Value::from("Minecraft:Stone")).unwrap_err();
        assert!(matches!(err, McWireError::InvalidIdentifier(_)));

        let raw = Codec::string().encode(&Value::from("Minecraft:Stone")).unwrap();
        let err = Codec::Identifier
            .read(&mut Cursor::new(raw.as_slice()), ReadHint::default())
            .unwrap_err();
        assert!(matches!(err, McWireError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_chat_json() {
        let json = serde_json::json!({"text": "hello", "color": "gold"});
        assert_eq!(round_trip(&Codec::Chat, Value::Json(json.clone())), Value::Json(json));

        let plain = round_trip(&Codec::Chat, Value::from("bye"));
        assert_eq!(plain, Value::Json(serde_json::json!("bye")));
    }

    #[test]
    fn test_uuid_fixed_width() {
        let uuid = Uuid::from_u128(0x0123_4567_89ab_cdef_0011_2233_4455_6677);
        let bytes = Codec::Uuid.encode(&Value::Uuid(uuid)).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[15], 0x77);
        assert_eq!(round_trip(&Codec::Uuid, Value::Uuid(uuid)), Value::Uuid(uuid));
    }

    #[test]
    fn test_enum_membership() {
        let codec = Codec::enumerated(Codec::Int, [1, 2, 3]);
        for v in 1..=3 {
            assert_eq!(round_trip(&codec, Value::Int(v)), Value::Int(v));
        }
        let err = codec.encode(&Value::Int(6)).unwrap_err();
        assert!(matches!(err, McWireError::InvalidEnumValue(6)));

        let raw = Codec::Int.encode(&Value::Int(6)).unwrap();
        let err = codec
            .read(&mut Cursor::new(raw.as_slice()), ReadHint::default())
            .unwrap_err();
        assert!(matches!(err, McWireError::InvalidEnumValue(6)));
    }

    #[test]
    fn test_prefixed_array_uses_item_count() {
        let codec = Codec::prefixed(Codec::array(Codec::UByte), Codec::UByte);
        let items: Vec<Value> = [10u8, 50, 10, 40, 22, 192]
            .iter()
            .map(|v| Value::UByte(*v))
            .collect();
        let value = Value::Array(items);

        let bytes = codec.encode(&value).unwrap();
        assert_eq!(bytes[0], 6);
        assert_eq!(bytes, vec![6, 10, 50, 10, 40, 22, 192]);
        assert_eq!(round_trip(&codec, value.clone()), value);
    }

    #[test]
    fn test_prefixed_array_of_shorts_counts_items() {
        let codec = Codec::prefixed(Codec::array(Codec::Short), Codec::VarInt);
        let value = Value::Array(vec![Value::Short(1), Value::Short(2)]);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(bytes[0], 2);
        assert_eq!(bytes.len(), 5);
    }

    #[test]
    fn test_prefixed_bytes() {
        let codec = Codec::prefixed(Codec::bytes(), Codec::VarInt);
        let value = Value::Bytes(vec![1, 2, 3]);
        assert_eq!(codec.encode(&value).unwrap(), vec![3, 1, 2, 3]);
        assert_eq!(round_trip(&codec, value.clone()), value);
    }

    #[test]
    fn test_prefixed_nbt_bounded_by_bytes() {
        let codec = Codec::prefixed(Codec::Nbt, Codec::Short);
        let tag = Tag::new("n", Payload::Int(7));
        let value = Value::Nbt(tag);
        let bytes = codec.encode(&value).unwrap();
        assert_eq!(&bytes[..2], &[0, 8]);
        assert_eq!(round_trip(&codec, value.clone()), value);

        // 长度前缀与实际内容不符
        let mut bad = bytes.clone();
        bad[1] = 9;
        bad.push(0);
        assert!(matches!(
            codec.read(&mut Cursor::new(bad.as_slice()), ReadHint::default()),
            Err(McWireError::Malformed(_))
        ));
    }

    #[test]
    fn test_optional_presence() {
        let codec = Codec::optional(Codec::VarInt);
        assert!(codec.encode(&Value::None).unwrap().is_empty());
        assert_eq!(codec.write(&mut Vec::new(), &Value::None).unwrap(), 0);

        let bytes = codec.encode(&Value::Int(5)).unwrap();
        assert_eq!(bytes, vec![5]);

        let absent = codec
            .read(&mut Cursor::new(bytes.as_slice()), ReadHint::present(false))
            .unwrap();
        assert_eq!(absent, Value::None);
        let present = codec
            .read(&mut Cursor::new(bytes.as_slice()), ReadHint::present(true))
            .unwrap();
        assert_eq!(present, Value::Int(5));
        assert!(codec
            .read(&mut Cursor::new(bytes.as_slice()), ReadHint::default())
            .is_err());
    }

    #[test]
    fn test_array_requires_count() {
        let codec = Codec::array(Codec::Byte);
        assert!(codec
            .read(&mut Cursor::new(&[1u8, 2][..]), ReadHint::default())
            .is_err());
    }

    #[test]
    fn test_bytes_cap() {
        let codec = Codec::Bytes { max: Some(2) };
        assert!(matches!(
            codec.encode(&Value::Bytes(vec![0; 3])),
            Err(McWireError::SizeViolation { length: 3, max: 2 })
        ));
    }

    #[test]
    fn test_bytes_read_to_end() {
        let codec = Codec::bytes();
        let data = [9u8, 8, 7];
        let value = codec
            .read(&mut Cursor::new(&data[..]), ReadHint::default())
            .unwrap();
        assert_eq!(value, Value::Bytes(vec![9, 8, 7]));
    }

    #[test]
    fn test_oversized_length_prefix_rejected_before_allocation() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
        let codec = Codec::prefixed(Codec::bytes(), Codec::VarLong);
        let err = codec
            .read(&mut Cursor::new(&data[..]), ReadHint::default())
            .unwrap_err();
        assert!(matches!(err, McWireError::Malformed(_)), "{:?}", err);

        let codec = Codec::prefixed(Codec::bytes(), Codec::VarInt);
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0x07, 1, 2];
        assert!(matches!(
            codec.read(&mut Cursor::new(&data[..]), ReadHint::default()),
            Err(McWireError::Malformed(_))
        ));
    }

    #[test]
    fn test_string_length_beyond_buffer() {
        let mut bytes = Vec::new();
        write_varint(&mut bytes, 30000).unwrap();
        bytes.extend_from_slice(b"short");
        let err = Codec::string()
            .read(&mut Cursor::new(bytes.as_slice()), ReadHint::default())
            .unwrap_err();
        assert!(matches!(err, McWireError::Malformed(_)), "{:?}", err);
    }

    #[test]
    fn test_array_count_beyond_buffer() {
        let codec = Codec::prefixed(Codec::array(Codec::Int), Codec::VarLong);
        let mut bytes = Vec::new();
        crate::varint::write_varlong(&mut bytes, i64::MAX).unwrap();
        bytes.extend_from_slice(&[0, 0, 0, 1]);
        assert!(matches!(
            codec.read(&mut Cursor::new(bytes.as_slice()), ReadHint::default()),
            Err(McWireError::Malformed(_))
        ));
    }
}
