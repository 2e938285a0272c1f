use super::{Direction, Packet, State};
use crate::{
    codec::Codec,
    error::{McWireError, Result},
    schema::{Field, Schema},
    types::{Record, Value},
};
use std::sync::OnceLock;

/// 握手后切换到的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum NextState {
    Status = 1,
    Login = 2,
}

impl TryFrom<i64> for NextState {
    type Error = McWireError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(NextState::Status),
            2 => Ok(NextState::Login),
            _ => Err(McWireError::InvalidEnumValue(value)),
        }
    }
}

/// 握手包 (0x00, serverbound)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: NextState,
}

impl Packet for Handshake {
    const ID: i32 = 0x00;
    const STATE: State = State::Handshaking;
    const DIRECTION: Direction = Direction::Serverbound;

    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::new(
                "Handshake",
                vec![
                    Field::new("protocol_version", Codec::VarInt),
                    Field::new("server_address", Codec::string_max(255)),
                    Field::new("server_port", Codec::UShort),
                    Field::new("next_state", Codec::enumerated(Codec::VarInt, [1, 2])),
                ],
            )
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("protocol_version", self.protocol_version)
            .with("server_address", self.server_address.as_str())
            .with("server_port", self.server_port)
            .with("next_state", self.next_state as i32)
    }

    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            protocol_version: record.take("protocol_version")?.to_i64()? as i32,
            server_address: record.take("server_address")?.into_string()?,
            server_port: match record.take("server_port")? {
                Value::UShort(port) => port,
                other => other.to_i64()? as u16,
            },
            next_state: NextState::try_from(record.take("next_state")?.to_i64()?)?,
        })
    }
}
