use crate::error::{McWireError, Result};
use crate::nbt::Tag;
use uuid::Uuid;

/// 编解码器处理的动态值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 缺省的可选值，编码为0字节
    None,
    Bool(bool),
    Byte(i8),
    UByte(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Array(Vec<Value>),
    Record(Record),
    Nbt(Tag),
}

impl Value {
    /// 值类型名称，用于错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Byte(_) => "byte",
            Value::UByte(_) => "ubyte",
            Value::Short(_) => "short",
            Value::UShort(_) => "ushort",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Long(_) => "long",
            Value::ULong(_) => "ulong",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Json(_) => "json",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Nbt(_) => "nbt",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// 将任意整数值扩展为i64
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(v as i64),
            Value::UByte(v) => Some(v as i64),
            Value::Short(v) => Some(v as i64),
            Value::UShort(v) => Some(v as i64),
            Value::Int(v) => Some(v as i64),
            Value::UInt(v) => Some(v as i64),
            Value::Long(v) => Some(v),
            Value::ULong(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// 布尔语义：Bool本身，整数非零为真，None为假
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::None => Some(false),
            other => other.as_i64().map(|v| v != 0),
        }
    }

    fn mismatch(&self, expected: &'static str) -> McWireError {
        McWireError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    pub fn to_i64(&self) -> Result<i64> {
        self.as_i64().ok_or_else(|| self.mismatch("integer"))
    }

    pub fn to_bool(&self) -> Result<bool> {
        self.as_bool().ok_or_else(|| self.mismatch("bool"))
    }

    pub fn into_string(self) -> Result<String> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn into_json(self) -> Result<serde_json::Value> {
        match self {
            Value::Json(v) => Ok(v),
            other => Err(other.mismatch("json")),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Value::Bytes(b) => Ok(b),
            other => Err(other.mismatch("bytes")),
        }
    }

    pub fn into_uuid(self) -> Result<Uuid> {
        match self {
            Value::Uuid(u) => Ok(u),
            other => Err(other.mismatch("uuid")),
        }
    }

    pub fn into_array(self) -> Result<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn into_record(self) -> Result<Record> {
        match self {
            Value::Record(r) => Ok(r),
            other => Err(other.mismatch("record")),
        }
    }

    /// None转为Option::None，其余保持原值
    pub fn into_option(self) -> Option<Value> {
        match self {
            Value::None => None,
            other => Some(other),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::UShort(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::None, Into::into)
    }
}

/// 按字段声明顺序保存的 名称→值 映射
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加字段
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// 插入或替换字段
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// 取出字段，不存在时报错
    pub fn take(&mut self, name: &str) -> Result<Value> {
        let index = self
            .fields
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| McWireError::MissingField(name.to_string()))?;
        Ok(self.fields.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}
