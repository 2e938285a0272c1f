//! 数据包定义
//!
//! 每个数据包由固定的ID与一张有序字段表组成，按连接阶段与方向分组。
//! 同一阶段与方向下ID唯一，并决定载荷的解码方式。

pub mod handshake;
pub mod login;
pub mod status;

use crate::{
    error::{McWireError, Result},
    schema::Schema,
    types::Record,
};

pub use handshake::{Handshake, NextState};
pub use login::{
    Disconnect, EncryptionRequest, EncryptionResponse, LoginPluginRequest, LoginPluginResponse,
    LoginStart, LoginSuccess, Property, SetCompression,
};
pub use status::{PingRequest, PongResponse, StatusRequest, StatusResponse};

/// 连接阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Handshaking,
    Status,
    Login,
}

/// 数据包方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Serverbound,
    Clientbound,
}

pub trait Packet: Sized {
    const ID: i32;
    const STATE: State;
    const DIRECTION: Direction;

    /// 字段表，进程内只构造一次
    fn schema() -> &'static Schema;

    fn to_record(&self) -> Record;

    fn from_record(record: Record) -> Result<Self>;

    /// 编码数据包载荷（不含ID）
    fn encode_body(&self) -> Result<Vec<u8>> {
        Self::schema().encode(&self.to_record())
    }

    fn decode_body(body: &[u8]) -> Result<Self> {
        Self::from_record(Self::schema().decode(body)?)
    }
}

type SchemaFn = fn() -> &'static Schema;

macro_rules! registry_entry {
    ($packet:ty) => {
        (
            <$packet as Packet>::STATE,
            <$packet as Packet>::DIRECTION,
            <$packet as Packet>::ID,
            <$packet as Packet>::schema as SchemaFn,
        )
    };
}

const REGISTRY: &[(State, Direction, i32, SchemaFn)] = &[
    registry_entry!(Handshake),
    registry_entry!(StatusRequest),
    registry_entry!(StatusResponse),
    registry_entry!(PingRequest),
    registry_entry!(PongResponse),
    registry_entry!(LoginStart),
    registry_entry!(EncryptionResponse),
    registry_entry!(LoginPluginResponse),
    registry_entry!(Disconnect),
    registry_entry!(EncryptionRequest),
    registry_entry!(LoginSuccess),
    registry_entry!(SetCompression),
    registry_entry!(LoginPluginRequest),
];

/// 按阶段、方向与ID查找字段表
pub fn schema_for(state: State, direction: Direction, id: i32) -> Option<&'static Schema> {
    REGISTRY
        .iter()
        .find(|(s, d, i, _)| *s == state && *d == direction && *i == id)
        .map(|(_, _, _, schema)| schema())
}

/// 解码任意已知数据包的载荷
pub fn decode(state: State, direction: Direction, id: i32, body: &[u8]) -> Result<Record> {
    let schema = schema_for(state, direction, id).ok_or(McWireError::UnexpectedPacket {
        expected: -1,
        found: id,
    })?;
    schema.decode(body)
}
