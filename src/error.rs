use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum McWireError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("VarInt过长，超过{max}字节")]
    VarIntTooLong { max: usize },

    #[error("长度超出上限: {length} > {max}")]
    SizeViolation { length: usize, max: usize },

    #[error("无效的标识符: {0}")]
    InvalidIdentifier(String),

    #[error("枚举值不在允许范围内: {0}")]
    InvalidEnumValue(i64),

    #[error("未知的NBT标签类型: {0}")]
    UnknownNbtTag(u8),

    #[error("值类型不匹配: 期望 {expected}, 实际 {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("缺少字段: {0}")]
    MissingField(String),

    #[error("数据格式错误: {0}")]
    Malformed(String),

    #[error("意外的数据包: 期望 {expected:#04x}, 实际 {found:#04x}")]
    UnexpectedPacket { expected: i32, found: i32 },

    #[error("压缩错误: {0}")]
    Compression(String),

    #[error("解压错误: {0}")]
    Decompression(String),

    #[error("Query协议错误: {0}")]
    QueryProtocol(String),

    #[error("RCON协议错误: {0}")]
    RconProtocol(String),

    #[error("RCON认证失败: {0}")]
    RconAuth(String),

    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UTF-8解码错误: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl McWireError {
    /// 是否为套接字读写超时
    pub fn is_timeout(&self) -> bool {
        match self {
            McWireError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, McWireError>;
