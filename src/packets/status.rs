use super::{Direction, Packet, State};
use crate::{
    codec::Codec,
    error::Result,
    schema::{Field, Schema},
    types::Record,
};
use std::sync::OnceLock;

/// 状态请求 (0x00, serverbound)，无字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRequest;

impl Packet for StatusRequest {
    const ID: i32 = 0x00;
    const STATE: State = State::Status;
    const DIRECTION: Direction = Direction::Serverbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::new("StatusRequest", Vec::new()))
    }

    fn to_record(&self) -> Record {
        Record::new()
    }

    fn from_record(_record: Record) -> Result<Self> {
        Ok(Self)
    }
}

/// 状态响应 (0x00, clientbound)，携带JSON字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    pub json: String,
}

impl Packet for StatusResponse {
    const ID: i32 = 0x00;
    const STATE: State = State::Status;
    const DIRECTION: Direction = Direction::Clientbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new("StatusResponse", vec![Field::new("json", Codec::string())])
        })
    }

    fn to_record(&self) -> Record {
        Record::new().with("json", self.json.as_str())
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            json: record.take("json")?.into_string()?,
        })
    }
}

/// Ping请求 (0x01, serverbound)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingRequest {
    pub payload: i64,
}

impl Packet for PingRequest {
    const ID: i32 = 0x01;
    const STATE: State = State::Status;
    const DIRECTION: Direction = Direction::Serverbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::new("PingRequest", vec![Field::new("payload", Codec::Long)]))
    }

    fn to_record(&self) -> Record {
        Record::new().with("payload", self.payload)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            payload: record.take("payload")?.to_i64()?,
        })
    }
}

/// Pong响应 (0x01, clientbound)，原样返回Ping载荷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PongResponse {
    pub payload: i64,
}

impl Packet for PongResponse {
    const ID: i32 = 0x01;
    const STATE: State = State::Status;
    const DIRECTION: Direction = Direction::Clientbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::new("PongResponse", vec![Field::new("payload", Codec::Long)]))
    }

    fn to_record(&self) -> Record {
        Record::new().with("payload", self.payload)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            payload: record.take("payload")?.to_i64()?,
        })
    }
}
