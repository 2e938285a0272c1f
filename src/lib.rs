pub mod chat;
pub mod codec;
pub mod compression;
pub mod error;
pub mod frame;
pub mod identifier;
pub mod nbt;
pub mod packets;
pub mod query;
pub mod rcon;
pub mod schema;
pub mod slp;
pub mod types;
pub mod utils;
pub mod varint;

pub use crate::codec::{Codec, ReadHint};
pub use crate::error::{McWireError, Result};
pub use crate::frame::Connection;
pub use crate::nbt::{NbtTagType, Payload, Tag};
pub use crate::packets::{Direction, Packet, State};
pub use crate::query::{BasicStat, FullStat, QueryClient, QueryOptions};
pub use crate::rcon::{RconClient, RconOptions};
pub use crate::schema::{Context, Field, Rule, Schema};
pub use crate::slp::{ping, Era, Eras, PingOptions, PingResponse, StatusJson};
pub use crate::types::{Record, Value};

/// Query默认端口（与游戏端口相同）
pub const DEFAULT_QUERY_PORT: u16 = 25565;

/// 游戏默认端口
pub const DEFAULT_GAME_PORT: u16 = 25565;

/// RCON默认端口
pub const DEFAULT_RCON_PORT: u16 = 25575;
