// NBT (Named Binary Tag) 编解码
// 标签结构：类型ID(1字节) + 名称(2字节长度前缀UTF-8，End标签无名称) + 载荷

use crate::error::{McWireError, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt::{self, Write as _};
use std::io::{Read, Write};

/// 最大嵌套深度
const MAX_DEPTH: usize = 512;

/// 预分配上限，避免恶意长度导致的大块分配
const PREALLOC_LIMIT: usize = 4096;

/// NBT标签类型枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NbtTagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TryFrom<u8> for NbtTagType {
    type Error = McWireError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(NbtTagType::End),
            1 => Ok(NbtTagType::Byte),
            2 => Ok(NbtTagType::Short),
            3 => Ok(NbtTagType::Int),
            4 => Ok(NbtTagType::Long),
            5 => Ok(NbtTagType::Float),
            6 => Ok(NbtTagType::Double),
            7 => Ok(NbtTagType::ByteArray),
            8 => Ok(NbtTagType::String),
            9 => Ok(NbtTagType::List),
            10 => Ok(NbtTagType::Compound),
            11 => Ok(NbtTagType::IntArray),
            12 => Ok(NbtTagType::LongArray),
            _ => Err(McWireError::UnknownNbtTag(value)),
        }
    }
}

/// 列表：单一元素类型 + 无名称载荷
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub item_type: NbtTagType,
    pub items: Vec<Payload>,
}

impl List {
    pub fn new(item_type: NbtTagType, items: Vec<Payload>) -> Self {
        Self { item_type, items }
    }

    pub fn empty() -> Self {
        Self::new(NbtTagType::End, Vec::new())
    }
}

/// 标签载荷，类型由变体决定
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    /// 子标签按出现顺序保存，写出时自动追加End
    Compound(Vec<Tag>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Payload {
    pub fn tag_type(&self) -> NbtTagType {
        match self {
            Payload::End => NbtTagType::End,
            Payload::Byte(_) => NbtTagType::Byte,
            Payload::Short(_) => NbtTagType::Short,
            Payload::Int(_) => NbtTagType::Int,
            Payload::Long(_) => NbtTagType::Long,
            Payload::Float(_) => NbtTagType::Float,
            Payload::Double(_) => NbtTagType::Double,
            Payload::ByteArray(_) => NbtTagType::ByteArray,
            Payload::String(_) => NbtTagType::String,
            Payload::List(_) => NbtTagType::List,
            Payload::Compound(_) => NbtTagType::Compound,
            Payload::IntArray(_) => NbtTagType::IntArray,
            Payload::LongArray(_) => NbtTagType::LongArray,
        }
    }
}

/// 命名标签。名称仅在End标签上缺省
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: Option<String>,
    pub payload: Payload,
}

impl Tag {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: Some(name.into()),
            payload,
        }
    }

    pub fn end() -> Self {
        Self {
            name: None,
            payload: Payload::End,
        }
    }

    pub fn compound(name: impl Into<String>, children: Vec<Tag>) -> Self {
        Self::new(name, Payload::Compound(children))
    }

    pub fn tag_type(&self) -> NbtTagType {
        self.payload.tag_type()
    }

    /// 在Compound中按名称查找子标签
    pub fn get(&self, name: &str) -> Option<&Tag> {
        match &self.payload {
            Payload::Compound(children) => children
                .iter()
                .find(|child| child.name.as_deref() == Some(name)),
            _ => None,
        }
    }

    /// 以类SNBT格式输出
    pub fn to_snbt(&self) -> String {
        let mut out = String::new();
        if let Some(name) = &self.name {
            if !name.is_empty() {
                let _ = write!(out, "{}: ", quote(name));
            }
        }
        snbt_payload(&mut out, &self.payload);
        out
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_snbt())
    }
}

/// 写入完整标签，返回写入的字节数
pub fn write_tag<W: Write>(writer: &mut W, tag: &Tag) -> Result<usize> {
    let mut counter = CountingWriter::new(writer);
    write_named(&mut counter, tag, 0)?;
    Ok(counter.count)
}

/// 读取完整标签
pub fn read_tag<R: Read>(reader: &mut R) -> Result<Tag> {
    read_named(reader, 0)
}

/// 读取gzip压缩的NBT（如level.dat）
pub fn read_compressed<R: Read>(reader: R) -> Result<Tag> {
    let mut decoder = GzDecoder::new(reader);
    read_tag(&mut decoder)
}

/// 写入gzip压缩的NBT
pub fn write_compressed<W: Write>(writer: W, tag: &Tag) -> Result<()> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    write_tag(&mut encoder, tag)?;
    encoder.finish()?;
    Ok(())
}

fn write_named<W: Write>(writer: &mut W, tag: &Tag, depth: usize) -> Result<()> {
    writer.write_u8(tag.tag_type() as u8)?;
    if tag.tag_type() == NbtTagType::End {
        return Ok(());
    }
    write_string(writer, tag.name.as_deref().unwrap_or_default())?;
    write_payload(writer, &tag.payload, depth)
}

fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<()> {
    let len = u16::try_from(value.len()).map_err(|_| McWireError::SizeViolation {
        length: value.len(),
        max: u16::MAX as usize,
    })?;
    writer.write_u16::<BigEndian>(len)?;
    writer.write_all(value.as_bytes())?;
    Ok(())
}

fn write_len<W: Write>(writer: &mut W, len: usize) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| McWireError::SizeViolation {
        length: len,
        max: i32::MAX as usize,
    })?;
    writer.write_i32::<BigEndian>(len)?;
    Ok(())
}

fn write_payload<W: Write>(writer: &mut W, payload: &Payload, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(McWireError::Malformed("NBT嵌套过深".to_string()));
    }

    match payload {
        Payload::End => {}
        Payload::Byte(v) => writer.write_i8(*v)?,
        Payload::Short(v) => writer.write_i16::<BigEndian>(*v)?,
        Payload::Int(v) => writer.write_i32::<BigEndian>(*v)?,
        Payload::Long(v) => writer.write_i64::<BigEndian>(*v)?,
        Payload::Float(v) => writer.write_f32::<BigEndian>(*v)?,
        Payload::Double(v) => writer.write_f64::<BigEndian>(*v)?,
        Payload::ByteArray(values) => {
            write_len(writer, values.len())?;
            for v in values {
                writer.write_i8(*v)?;
            }
        }
        Payload::String(v) => write_string(writer, v)?,
        Payload::List(list) => {
            if let Some(bad) = list.items.iter().find(|item| item.tag_type() != list.item_type) {
                return Err(McWireError::Malformed(format!(
                    "列表元素类型不一致: 声明 {:?}, 实际 {:?}",
                    list.item_type,
                    bad.tag_type()
                )));
            }
            writer.write_u8(list.item_type as u8)?;
            write_len(writer, list.items.len())?;
            for item in &list.items {
                write_payload(writer, item, depth + 1)?;
            }
        }
        Payload::Compound(children) => {
            for child in children {
                if child.tag_type() == NbtTagType::End {
                    return Err(McWireError::Malformed("Compound中不能包含End标签".to_string()));
                }
                write_named(writer, child, depth + 1)?;
            }
            writer.write_u8(NbtTagType::End as u8)?;
        }
        Payload::IntArray(values) => {
            write_len(writer, values.len())?;
            for v in values {
                writer.write_i32::<BigEndian>(*v)?;
            }
        }
        Payload::LongArray(values) => {
            write_len(writer, values.len())?;
            for v in values {
                writer.write_i64::<BigEndian>(*v)?;
            }
        }
    }
    Ok(())
}

fn read_named<R: Read>(reader: &mut R, depth: usize) -> Result<Tag> {
    let tag_type = NbtTagType::try_from(reader.read_u8()?)?;
    if tag_type == NbtTagType::End {
        return Ok(Tag::end());
    }
    let name = read_string(reader)?;
    let payload = read_payload(reader, tag_type, depth)?;
    Ok(Tag {
        name: Some(name),
        payload,
    })
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = reader.read_u16::<BigEndian>()?;
    let mut buffer = vec![0u8; len as usize];
    reader.read_exact(&mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

fn read_len<R: Read>(reader: &mut R) -> Result<usize> {
    let len = reader.read_i32::<BigEndian>()?;
    usize::try_from(len).map_err(|_| McWireError::Malformed(format!("负数长度: {}", len)))
}

fn read_payload<R: Read>(reader: &mut R, tag_type: NbtTagType, depth: usize) -> Result<Payload> {
    if depth > MAX_DEPTH {
        return Err(McWireError::Malformed("NBT嵌套过深".to_string()));
    }

    let payload = match tag_type {
        NbtTagType::End => Payload::End,
        NbtTagType::Byte => Payload::Byte(reader.read_i8()?),
        NbtTagType::Short => Payload::Short(reader.read_i16::<BigEndian>()?),
        NbtTagType::Int => Payload::Int(reader.read_i32::<BigEndian>()?),
        NbtTagType::Long => Payload::Long(reader.read_i64::<BigEndian>()?),
        NbtTagType::Float => Payload::Float(reader.read_f32::<BigEndian>()?),
        NbtTagType::Double => Payload::Double(reader.read_f64::<BigEndian>()?),
        NbtTagType::ByteArray => {
            let len = read_len(reader)?;
            let mut values = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                values.push(reader.read_i8()?);
            }
            Payload::ByteArray(values)
        }
        NbtTagType::String => Payload::String(read_string(reader)?),
        NbtTagType::List => {
            let item_type = NbtTagType::try_from(reader.read_u8()?)?;
            let len = read_len(reader)?;
            if item_type == NbtTagType::End && len > 0 {
                return Err(McWireError::Malformed("非空列表的元素类型为End".to_string()));
            }
            let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                items.push(read_payload(reader, item_type, depth + 1)?);
            }
            Payload::List(List { item_type, items })
        }
        NbtTagType::Compound => {
            let mut children = Vec::new();
            loop {
                let child = read_named(reader, depth + 1)?;
                if child.tag_type() == NbtTagType::End {
                    break;
                }
                children.push(child);
            }
            Payload::Compound(children)
        }
        NbtTagType::IntArray => {
            let len = read_len(reader)?;
            let mut values = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                values.push(reader.read_i32::<BigEndian>()?);
            }
            Payload::IntArray(values)
        }
        NbtTagType::LongArray => {
            let len = read_len(reader)?;
            let mut values = Vec::with_capacity(len.min(PREALLOC_LIMIT));
            for _ in 0..len {
                values.push(reader.read_i64::<BigEndian>()?);
            }
            Payload::LongArray(values)
        }
    };
    Ok(payload)
}

/// 统计写入字节数的包装器
struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    count: usize,
}

impl<'a, W: Write> CountingWriter<'a, W> {
    fn new(inner: &'a mut W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn snbt_join<T>(out: &mut String, open: &str, items: &[T], mut each: impl FnMut(&mut String, &T)) {
    out.push_str(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        each(out, item);
    }
    out.push(']');
}

fn snbt_payload(out: &mut String, payload: &Payload) {
    match payload {
        Payload::End => out.push_str("END"),
        Payload::Byte(v) => {
            let _ = write!(out, "{}b", v);
        }
        Payload::Short(v) => {
            let _ = write!(out, "{}s", v);
        }
        Payload::Int(v) => {
            let _ = write!(out, "{}", v);
        }
        Payload::Long(v) => {
            let _ = write!(out, "{}L", v);
        }
        Payload::Float(v) => {
            let _ = write!(out, "{}f", v);
        }
        Payload::Double(v) => {
            let _ = write!(out, "{}d", v);
        }
        Payload::ByteArray(values) => snbt_join(out, "[B;", values, |out, v| {
            let _ = write!(out, "{}b", v);
        }),
        Payload::String(v) => out.push_str(&quote(v)),
        Payload::List(list) => snbt_join(out, "[", &list.items, snbt_payload),
        Payload::Compound(children) => {
            out.push('{');
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&child.to_snbt());
            }
            out.push('}');
        }
        Payload::IntArray(values) => snbt_join(out, "[I;", values, |out, v| {
            let _ = write!(out, "{}", v);
        }),
        Payload::LongArray(values) => snbt_join(out, "[L;", values, |out, v| {
            let _ = write!(out, "{}L", v);
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// hello_world.nbt 参考数据
    const HELLO_WORLD: &[u8] = &[
        0x0A, 0x00, 0x0B, b'h', b'e', b'l', b'l', b'o', b' ', b'w', b'o', b'r', b'l', b'd', 0x08,
        0x00, 0x04, b'n', b'a', b'm', b'e', 0x00, 0x09, b'B', b'a', b'n', b'a', b'n', b'r', b'a',
        b'm', b'a', 0x00,
    ];

    fn sample_tree() -> Tag {
        Tag::compound(
            "Level",
            vec![
                Tag::new("byteTest", Payload::Byte(127)),
                Tag::new("shortTest", Payload::Short(32767)),
                Tag::new("intTest", Payload::Int(-2147483648)),
                Tag::new("longTest", Payload::Long(9223372036854775807)),
                Tag::new("floatTest", Payload::Float(0.49823147)),
                Tag::new("doubleTest", Payload::Double(0.4931287132182315)),
                Tag::new("stringTest", Payload::String("HELLO WORLD ÅÄÖ!".to_string())),
                Tag::new(
                    "byteArrayTest",
                    Payload::ByteArray((0..20).map(|i| (i * 3) as i8).collect()),
                ),
                Tag::new("intArrayTest", Payload::IntArray(vec![1, -2, 3])),
                Tag::new("longArrayTest", Payload::LongArray(vec![i64::MIN, 0])),
                Tag::new(
                    "listTest (long)",
                    Payload::List(List::new(
                        NbtTagType::Long,
                        vec![Payload::Long(11), Payload::Long(12), Payload::Long(13)],
                    )),
                ),
                Tag::new(
                    "listTest (compound)",
                    Payload::List(List::new(
                        NbtTagType::Compound,
                        vec![
                            Payload::Compound(vec![Tag::new(
                                "name",
                                Payload::String("egg".into()),
                            )]),
                            Payload::Compound(vec![]),
                        ],
                    )),
                ),
                Tag::new("emptyList", Payload::List(List::empty())),
                Tag::compound(
                    "nested",
                    vec![Tag::compound("inner", vec![Tag::new("value", Payload::Float(0.5))])],
                ),
            ],
        )
    }

    #[test]
    fn test_hello_world_byte_exact() {
        let tag = read_tag(&mut Cursor::new(HELLO_WORLD)).unwrap();
        assert_eq!(tag.name.as_deref(), Some("hello world"));
        assert_eq!(
            tag.get("name").map(|t| &t.payload),
            Some(&Payload::String("Bananrama".to_string()))
        );

        let mut out = Vec::new();
        let written = write_tag(&mut out, &tag).unwrap();
        assert_eq!(written, HELLO_WORLD.len());
        assert_eq!(out, HELLO_WORLD);
    }

    #[test]
    fn test_tree_round_trip_and_byte_exact() {
        let tag = sample_tree();
        let mut bytes = Vec::new();
        write_tag(&mut bytes, &tag).unwrap();

        let decoded = read_tag(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(decoded, tag);

        let mut again = Vec::new();
        write_tag(&mut again, &decoded).unwrap();
        assert_eq!(again, bytes);
    }

    #[test]
    fn test_list_layout() {
        let tag = Tag::new(
            "l",
            Payload::List(List::new(NbtTagType::Short, vec![Payload::Short(1), Payload::Short(2)])),
        );
        let mut bytes = Vec::new();
        write_tag(&mut bytes, &tag).unwrap();
        assert_eq!(
            bytes,
            vec![0x09, 0x00, 0x01, b'l', 0x02, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x02]
        );
    }

    #[test]
    fn test_unknown_tag_type() {
        let err = read_tag(&mut Cursor::new(vec![0x0D, 0x00, 0x00])).unwrap_err();
        assert!(matches!(err, McWireError::UnknownNbtTag(13)));
    }

    #[test]
    fn test_heterogeneous_list_rejected() {
        let tag = Tag::new(
            "bad",
            Payload::List(List::new(NbtTagType::Int, vec![Payload::Int(1), Payload::Byte(2)])),
        );
        assert!(write_tag(&mut Vec::new(), &tag).is_err());
    }

    #[test]
    fn test_negative_length_rejected() {
        let bytes = vec![0x07, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            read_tag(&mut Cursor::new(bytes)),
            Err(McWireError::Malformed(_))
        ));
    }

    #[test]
    fn test_end_tag() {
        let mut bytes = Vec::new();
        assert_eq!(write_tag(&mut bytes, &Tag::end()).unwrap(), 1);
        assert_eq!(bytes, vec![0x00]);
        assert_eq!(read_tag(&mut Cursor::new(bytes)).unwrap(), Tag::end());
    }

    #[test]
    fn test_gzip_file_round_trip() {
        let tag = sample_tree();
        let file = tempfile::NamedTempFile::new().unwrap();
        write_compressed(file.reopen().unwrap(), &tag).unwrap();
        let decoded = read_compressed(file.reopen().unwrap()).unwrap();
        assert_eq!(decoded, tag);
    }

    #[test]
    fn test_snbt_output() {
        let tag = read_tag(&mut Cursor::new(HELLO_WORLD)).unwrap();
        assert_eq!(tag.to_snbt(), "\"hello world\": {\"name\": \"Bananrama\"}");
    }
}
