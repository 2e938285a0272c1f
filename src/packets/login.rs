use super::{Direction, Packet, State};
use crate::{
    codec::Codec,
    error::Result,
    schema::{Field, Rule, Schema},
    types::{Record, Value},
};
use std::sync::OnceLock;
use uuid::Uuid;

fn prefixed_bytes() -> Codec {
    Codec::prefixed(Codec::bytes(), Codec::VarInt)
}

/// 登录开始 (0x00, serverbound)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub name: String,
    pub uuid: Uuid,
}

impl Packet for LoginStart {
    const ID: i32 = 0x00;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Serverbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "LoginStart",
                vec![
                    Field::new("name", Codec::string_max(16)),
                    Field::new("uuid", Codec::Uuid),
                ],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("name", self.name.as_str())
            .with("uuid", self.uuid)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            name: record.take("name")?.into_string()?,
            uuid: record.take("uuid")?.into_uuid()?,
        })
    }
}

/// 加密响应 (0x01, serverbound)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl Packet for EncryptionResponse {
    const ID: i32 = 0x01;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Serverbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "EncryptionResponse",
                vec![
                    Field::new("shared_secret", prefixed_bytes()),
                    Field::new("verify_token", prefixed_bytes()),
                ],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("shared_secret", self.shared_secret.clone())
            .with("verify_token", self.verify_token.clone())
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            shared_secret: record.take("shared_secret")?.into_bytes()?,
            verify_token: record.take("verify_token")?.into_bytes()?,
        })
    }
}

/// 登录插件响应 (0x02, serverbound)
///
/// `successful` 由 `data` 是否存在推导，读取时据此决定是否读取数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginResponse {
    pub message_id: i32,
    pub data: Option<Vec<u8>>,
}

impl Packet for LoginPluginResponse {
    const ID: i32 = 0x02;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Serverbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "LoginPluginResponse",
                vec![
                    Field::new("message_id", Codec::VarInt),
                    Field::new("successful", Codec::Bool).computed(Rule::Present("data")),
                    Field::new("data", Codec::bytes()).present_if(Rule::Value("successful")),
                ],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("message_id", self.message_id)
            .with("data", self.data.clone())
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            message_id: record.take("message_id")?.to_i64()? as i32,
            data: record
                .take("data")?
                .into_option()
                .map(Value::into_bytes)
                .transpose()?,
        })
    }
}

/// 断开连接 (0x00, clientbound)
#[derive(Debug, Clone, PartialEq)]
pub struct Disconnect {
    pub reason: serde_json::Value,
}

impl Packet for Disconnect {
    const ID: i32 = 0x00;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Clientbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::new("Disconnect", vec![Field::new("reason", Codec::Chat)]))
    }

    fn to_record(&self) -> Record {
        Record::new().with("reason", Value::Json(self.reason.clone()))
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            reason: record.take("reason")?.into_json()?,
        })
    }
}

/// 加密请求 (0x01, clientbound)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionRequest {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl Packet for EncryptionRequest {
    const ID: i32 = 0x01;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Clientbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "EncryptionRequest",
                vec![
                    Field::new("server_id", Codec::string_max(20)),
                    Field::new("public_key", prefixed_bytes()),
                    Field::new("verify_token", prefixed_bytes()),
                ],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("server_id", self.server_id.as_str())
            .with("public_key", self.public_key.clone())
            .with("verify_token", self.verify_token.clone())
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            server_id: record.take("server_id")?.into_string()?,
            public_key: record.take("public_key")?.into_bytes()?,
            verify_token: record.take("verify_token")?.into_bytes()?,
        })
    }
}

/// 玩家档案属性（如皮肤纹理）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

impl Property {
    fn schema() -> Schema {
        Schema::new(
            "Property",
            vec![
                Field::new("name", Codec::string()),
                Field::new("value", Codec::string()),
                Field::new("has_signature", Codec::Bool).computed(Rule::Present("signature")),
                Field::new("signature", Codec::optional(Codec::string()))
                    .present_if(Rule::Value("has_signature")),
            ],
        )
    }

    fn to_value(&self) -> Value {
        Value::Record(
            Record::new()
                .with("name", self.name.as_str())
                .with("value", self.value.as_str())
                .with("signature", self.signature.clone()),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut record = value.into_record()?;
        Ok(Self {
            name: record.take("name")?.into_string()?,
            value: record.take("value")?.into_string()?,
            signature: record
                .take("signature")?
                .into_option()
                .map(Value::into_string)
                .transpose()?,
        })
    }
}

/// 登录成功 (0x02, clientbound)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub username: String,
    pub properties: Vec<Property>,
}

impl Packet for LoginSuccess {
    const ID: i32 = 0x02;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Clientbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "LoginSuccess",
                vec![
                    Field::new("uuid", Codec::Uuid),
                    Field::new("username", Codec::string_max(16)),
                    Field::new("property_count", Codec::VarInt).computed(Rule::Count("properties")),
                    Field::new("properties", Codec::array(Codec::nested(Property::schema())))
                        .length_from(Rule::Value("property_count")),
                ],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("uuid", self.uuid)
            .with("username", self.username.as_str())
            .with(
                "properties",
                Value::Array(self.properties.iter().map(Property::to_value).collect()),
            )
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            uuid: record.take("uuid")?.into_uuid()?,
            username: record.take("username")?.into_string()?,
            properties: record
                .take("properties")?
                .into_array()?
                .into_iter()
                .map(Property::from_value)
                .collect::<Result<_>>()?,
        })
    }
}

/// 设置压缩阈值 (0x03, clientbound)；负数表示关闭压缩
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCompression {
    pub threshold: i32,
}

impl SetCompression {
    /// 转换为帧层使用的阈值
    pub fn threshold(&self) -> Option<usize> {
        usize::try_from(self.threshold).ok()
    }
}

impl Packet for SetCompression {
    const ID: i32 = 0x03;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Clientbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "SetCompression",
                vec![Field::new("threshold", Codec::VarInt)],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new().with("threshold", self.threshold)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            threshold: record.take("threshold")?.to_i64()? as i32,
        })
    }
}

/// 登录插件请求 (0x04, clientbound)，数据延伸到包尾
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginRequest {
    pub message_id: i32,
    pub channel: String,
    pub data: Vec<u8>,
}

impl Packet for LoginPluginRequest {
    const ID: i32 = 0x04;
    const STATE: State = State::Login;
    const DIRECTION: Direction = Direction::Clientbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "LoginPluginRequest",
                vec![
                    Field::new("message_id", Codec::VarInt),
                    Field::new("channel", Codec::Identifier),
                    Field::new("data", Codec::bytes()),
                ],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("message_id", self.message_id)
            .with("channel", self.channel.as_str())
            .with("data", self.data.clone())
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            message_id: record.take("message_id")?.to_i64()? as i32,
            channel: record.take("channel")?.into_string()?,
            data: record.take("data")?.into_bytes()?,
        })
    }
}
