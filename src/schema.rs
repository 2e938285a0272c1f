//! 声明式结构体编解码（Nested）
//!
//! 字段按声明顺序即线上顺序排列。写入时先逆序计算每个字段的值与编码结果，
//! 使得声明在前的长度字段可以引用声明在后的数据；随后按声明顺序输出。
//! 读取时严格顺序进行，存在性与长度规则只能引用已读取的字段。

use crate::{
    codec::{Codec, ReadHint},
    error::{McWireError, Result},
    types::{Record, Value},
};
use std::collections::HashMap;
use std::io::Cursor;

/// 字段之间的依赖规则，针对上下文求值
#[derive(Debug, Clone)]
pub enum Rule {
    /// 另一字段的值
    Value(&'static str),
    /// 另一字段编码后的字节数
    ByteLength(&'static str),
    /// 另一字段写入时的返回值，数组即元素个数
    Count(&'static str),
    /// 另一字段是否存在（非None）
    Present(&'static str),
    /// 另一字段的整数值是否等于给定常量
    Equals(&'static str, i64),
    Func(fn(&Context) -> Result<Value>),
}

impl Rule {
    pub fn eval(&self, ctx: &Context) -> Result<Value> {
        match self {
            Rule::Value(name) => Ok(ctx.entry(name)?.value.clone()),
            Rule::ByteLength(name) => Ok(Value::Long(ctx.entry(name)?.size as i64)),
            Rule::Count(name) => Ok(Value::Long(ctx.entry(name)?.count as i64)),
            Rule::Present(name) => Ok(Value::Bool(!ctx.entry(name)?.value.is_none())),
            Rule::Equals(name, expected) => {
                Ok(Value::Bool(ctx.entry(name)?.value.as_i64() == Some(*expected)))
            }
            Rule::Func(f) => f(ctx),
        }
    }

    fn eval_bool(&self, ctx: &Context) -> Result<bool> {
        self.eval(ctx)?.to_bool()
    }

    fn eval_length(&self, ctx: &Context) -> Result<usize> {
        let raw = self.eval(ctx)?.to_i64()?;
        usize::try_from(raw).map_err(|_| McWireError::Malformed(format!("负数长度: {}", raw)))
    }
}

/// 字段描述符
#[derive(Debug, Clone)]
pub struct Field {
    pub name: &'static str,
    pub codec: Codec,
    /// 写入时由上下文计算的值
    pub computed: Option<Rule>,
    /// 读取时的存在性判断，缺省为存在
    pub presence: Option<Rule>,
    /// 读取时传给编解码器的长度
    pub length: Option<Rule>,
    /// 仅作记录的辅助字段，不进入解码结果
    pub auxiliary: bool,
}

impl Field {
    pub fn new(name: &'static str, codec: Codec) -> Self {
        Self {
            name,
            codec,
            computed: None,
            presence: None,
            length: None,
            auxiliary: false,
        }
    }

    /// 值由规则计算，字段随之成为辅助字段
    pub fn computed(mut self, rule: Rule) -> Self {
        self.computed = Some(rule);
        self.auxiliary = true;
        self
    }

    pub fn present_if(mut self, rule: Rule) -> Self {
        self.presence = Some(rule);
        self
    }

    pub fn length_from(mut self, rule: Rule) -> Self {
        self.length = Some(rule);
        self
    }
}

/// 上下文中单个字段的记录
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub value: Value,
    /// 写入时的编码结果；读取时为空
    pub bytes: Vec<u8>,
    /// 编码字节数
    pub size: usize,
    /// 编解码器返回的长度（数组为元素个数，其余为字节数）
    pub count: usize,
}

/// 序列化上下文：字段名 → 值与编码长度
#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: HashMap<&'static str, Entry>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn entry(&self, name: &str) -> Result<&Entry> {
        self.get(name)
            .ok_or_else(|| McWireError::MissingField(name.to_string()))
    }

    pub fn insert(&mut self, name: &'static str, entry: Entry) {
        self.entries.insert(name, entry);
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(|e| &e.value)
    }
}

/// 有序字段表
#[derive(Debug, Clone)]
pub struct Schema {
    name: &'static str,
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(name: &'static str, fields: Vec<Field>) -> Self {
        Self { name, fields }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// 写入记录，返回写入的字节数
    ///
    /// 存在性规则在写入时同样生效：条件不成立时字段必须为None，成立时必须有值，
    /// 否则写出的字节无法按同一字段表读回。
    pub fn write(&self, buf: &mut Vec<u8>, record: &Record) -> Result<usize> {
        let ctx = self.resolve(record)?;
        let mut out = Vec::new();
        for field in &self.fields {
            let entry = ctx.entry(field.name)?;
            if let Some(rule) = &field.presence {
                match (rule.eval_bool(&ctx)?, entry.value.is_none()) {
                    (false, false) => {
                        return Err(McWireError::Malformed(format!(
                            "{}.{} 的存在条件不成立，却提供了值",
                            self.name, field.name
                        )))
                    }
                    (true, true) => return Err(McWireError::MissingField(field.name.to_string())),
                    _ => {}
                }
            }
            out.extend_from_slice(&entry.bytes);
        }
        buf.extend_from_slice(&out);
        Ok(out.len())
    }

    /// 逆序求值：计算每个字段的值并编码到临时缓冲区
    pub fn resolve(&self, record: &Record) -> Result<Context> {
        let mut ctx = Context::new();
        for field in self.fields.iter().rev() {
            let value = match &field.computed {
                Some(rule) => rule.eval(&ctx)?,
                None => match record.get(field.name) {
                    Some(value) => value.clone(),
                    None if field.presence.is_some()
                        || matches!(field.codec, Codec::Optional(_)) =>
                    {
                        Value::None
                    }
                    None => return Err(McWireError::MissingField(field.name.to_string())),
                },
            };

            let mut bytes = Vec::new();
            // 带存在性规则的字段值为None时不占字节
            let count = if value.is_none() && field.presence.is_some() {
                0
            } else {
                field.codec.write(&mut bytes, &value)?
            };
            let size = bytes.len();
            ctx.insert(
                field.name,
                Entry {
                    value,
                    bytes,
                    size,
                    count,
                },
            );
        }
        Ok(ctx)
    }

    /// 顺序读取，辅助字段只保留在上下文中
    pub fn read(&self, buf: &mut Cursor<&[u8]>) -> Result<Record> {
        self.read_with_context(buf).map(|(record, _)| record)
    }

    pub fn read_with_context(&self, buf: &mut Cursor<&[u8]>) -> Result<(Record, Context)> {
        let mut ctx = Context::new();
        let mut record = Record::new();

        for field in &self.fields {
            let present = match &field.presence {
                Some(rule) => rule.eval_bool(&ctx)?,
                None => true,
            };

            let (value, size) = if present {
                let length = match &field.length {
                    Some(rule) => Some(rule.eval_length(&ctx)?),
                    None => None,
                };
                let start = buf.position();
                let hint = ReadHint {
                    length,
                    present: Some(true),
                };
                let value = field.codec.read(buf, hint)?;
                (value, (buf.position() - start) as usize)
            } else {
                (Value::None, 0)
            };

            let count = match &value {
                Value::Array(items) => items.len(),
                _ => size,
            };
            if !field.auxiliary {
                record.insert(field.name, value.clone());
            }
            ctx.insert(
                field.name,
                Entry {
                    value,
                    bytes: Vec::new(),
                    size,
                    count,
                },
            );
        }
        Ok((record, ctx))
    }

    pub fn encode(&self, record: &Record) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf, record)?;
        Ok(buf)
    }

    /// 解码完整字节串，存在未读字节时报错
    pub fn decode(&self, bytes: &[u8]) -> Result<Record> {
        let mut cursor = Cursor::new(bytes);
        let record = self.read(&mut cursor)?;
        let remaining = bytes.len() - cursor.position() as usize;
        if remaining != 0 {
            return Err(McWireError::Malformed(format!(
                "{} 解码后剩余 {} 字节",
                self.name, remaining
            )));
        }
        Ok(record)
    }
}
