//! 服务器列表Ping（SLP），按协议年代从新到旧逐个尝试
//!
//! 1. 现代协议：握手 + 状态请求 + Ping/Pong，使用VarInt帧
//! 2. 1.6：`MC|PingHost` 插件消息
//! 3. 1.4/1.5：`0xFE 0x01`
//! 4. 1.4之前：`0xFE`，响应以 `§` 分隔
//!
//! 每次尝试使用独立连接；任一年代失败都只意味着"不支持"，继续尝试下一个。

use crate::{
    chat,
    error::{McWireError, Result},
    frame::Connection,
    packets::{Handshake, NextState, PingRequest, PongResponse, StatusRequest, StatusResponse},
    utils::{decode_utf16be, encode_utf16be},
};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::ops::BitOr;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// 1.6 Ping中携带的协议版本
pub const LEGACY_PROTOCOL_VERSION: u8 = 74;

const LEGACY_PING: u8 = 0xFE;
const LEGACY_PING_PAYLOAD: u8 = 0x01;
const LEGACY_PLUGIN_MESSAGE: u8 = 0xFA;
const LEGACY_KICK: u8 = 0xFF;
const PING_HOST_CHANNEL: &str = "MC|PingHost";

/// 协议年代
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Modern,
    V1_6,
    V1_4,
    Beta,
}

impl Era {
    /// 从新到旧
    pub const ALL: [Era; 4] = [Era::Modern, Era::V1_6, Era::V1_4, Era::Beta];

    fn bit(self) -> u8 {
        match self {
            Era::Modern => 0b0001,
            Era::V1_6 => 0b0010,
            Era::V1_4 => 0b0100,
            Era::Beta => 0b1000,
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Era::Modern => "modern",
            Era::V1_6 => "1.6",
            Era::V1_4 => "1.4",
            Era::Beta => "beta",
        })
    }
}

/// 启用的协议年代位掩码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eras(u8);

impl Eras {
    pub const NONE: Eras = Eras(0);
    pub const MODERN: Eras = Eras(0b0001);
    pub const V1_6: Eras = Eras(0b0010);
    pub const V1_4: Eras = Eras(0b0100);
    pub const BETA: Eras = Eras(0b1000);
    pub const ALL: Eras = Eras(0b1111);

    pub fn contains(self, era: Era) -> bool {
        self.0 & era.bit() != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl From<Era> for Eras {
    fn from(era: Era) -> Self {
        Eras(era.bit())
    }
}

impl BitOr for Eras {
    type Output = Eras;

    fn bitor(self, rhs: Eras) -> Eras {
        Eras(self.0 | rhs.0)
    }
}

impl FromStr for Eras {
    type Err = McWireError;

    /// 逗号分隔的年代名称，如 `modern,1.6`
    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(Eras::NONE, |acc, name| {
                let era = match name {
                    "all" => return Ok(Eras::ALL),
                    "modern" => Era::Modern,
                    "1.6" => Era::V1_6,
                    "1.4" | "1.5" => Era::V1_4,
                    "beta" | "legacy" => Era::Beta,
                    other => {
                        return Err(McWireError::Malformed(format!("未知的协议年代: {}", other)))
                    }
                };
                Ok(acc | era.into())
            })
    }
}

#[derive(Debug, Clone)]
pub struct PingOptions {
    pub timeout: Duration,
    pub eras: Eras,
    /// 现代握手中声明的协议版本
    pub protocol_version: i32,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            eras: Eras::ALL,
            protocol_version: 47,
        }
    }
}

impl PingOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_eras(mut self, eras: Eras) -> Self {
        self.eras = eras;
        self
    }

    pub fn with_protocol_version(mut self, protocol_version: i32) -> Self {
        self.protocol_version = protocol_version;
        self
    }
}

/// 现代状态JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusJson {
    pub version: StatusVersion,
    #[serde(default)]
    pub players: Option<StatusPlayers>,
    #[serde(default)]
    pub description: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(
        default,
        rename = "enforcesSecureChat",
        skip_serializing_if = "Option::is_none"
    )]
    pub enforces_secure_chat: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVersion {
    pub name: String,
    pub protocol: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPlayers {
    pub max: i32,
    pub online: i32,
    #[serde(default)]
    pub sample: Vec<PlayerSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSample {
    pub name: String,
    pub id: String,
}

/// Ping结果；只有完整成功的年代才会产生
#[derive(Debug, Clone, PartialEq)]
pub struct PingResponse {
    pub era: Era,
    /// 1.4之前的协议不提供
    pub protocol: Option<i32>,
    pub version: Option<String>,
    pub motd: String,
    pub online: i32,
    pub max: i32,
    /// 仅现代协议测量
    pub latency: Option<Duration>,
    pub status: Option<StatusJson>,
}

/// 依次尝试启用的年代，全部失败时返回None
pub fn ping(host: &str, port: u16, options: &PingOptions) -> Option<PingResponse> {
    for era in Era::ALL {
        if !options.eras.contains(era) {
            continue;
        }
        match ping_era(host, port, era, options) {
            Ok(response) => {
                debug!(%era, host, port, "Ping成功");
                return Some(response);
            }
            Err(e) => debug!(%era, host, port, error = %e, "该协议年代不受支持，尝试下一个"),
        }
    }
    debug!(host, port, "所有协议年代均无响应");
    None
}

/// 以指定年代执行一次Ping
pub fn ping_era(host: &str, port: u16, era: Era, options: &PingOptions) -> Result<PingResponse> {
    let stream = open(host, port, options.timeout)?;
    match era {
        Era::Modern => ping_modern(stream, host, port, options.protocol_version),
        Era::V1_6 => ping_legacy(stream, &ping_host_request(host, port)?, era),
        Era::V1_4 => ping_legacy(stream, &[LEGACY_PING, LEGACY_PING_PAYLOAD], era),
        Era::Beta => ping_legacy(stream, &[LEGACY_PING], era),
    }
}

fn open(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let mut last_err = None;
    for target in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&target, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                return Ok(stream);
            }
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err
        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "无法解析服务器地址"))
        .into())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn ping_modern(
    stream: TcpStream,
    host: &str,
    port: u16,
    protocol_version: i32,
) -> Result<PingResponse> {
    let mut conn = Connection::new(stream);
    conn.send(&Handshake {
        protocol_version,
        server_address: host.to_string(),
        server_port: port,
        next_state: NextState::Status,
    })?;
    conn.send(&StatusRequest)?;
    let response: StatusResponse = conn.recv()?;
    let status: StatusJson = serde_json::from_str(&response.json)?;

    let sent = now_millis();
    conn.send(&PingRequest { payload: sent })?;
    let pong: PongResponse = conn.recv()?;
    if pong.payload != sent {
        return Err(McWireError::Malformed(format!(
            "Pong载荷不匹配: 发送 {}, 收到 {}",
            sent, pong.payload
        )));
    }
    let latency = Duration::from_millis(now_millis().saturating_sub(sent).max(0) as u64);

    let (online, max) = status
        .players
        .as_ref()
        .map_or((0, 0), |p| (p.online, p.max));
    Ok(PingResponse {
        era: Era::Modern,
        protocol: Some(status.version.protocol),
        version: Some(status.version.name.clone()),
        motd: chat::to_plain(&status.description),
        online,
        max,
        latency: Some(latency),
        status: Some(status),
    })
}

/// 构造1.6的 `MC|PingHost` 请求
pub fn ping_host_request(host: &str, port: u16) -> Result<Vec<u8>> {
    let host_units = host.encode_utf16().count();
    let mut buf = vec![LEGACY_PING, LEGACY_PING_PAYLOAD, LEGACY_PLUGIN_MESSAGE];
    buf.write_u16::<BigEndian>(PING_HOST_CHANNEL.len() as u16)?;
    buf.extend_from_slice(&encode_utf16be(PING_HOST_CHANNEL));
    buf.write_u16::<BigEndian>((7 + 2 * host_units) as u16)?;
    buf.write_u8(LEGACY_PROTOCOL_VERSION)?;
    buf.write_u16::<BigEndian>(host_units as u16)?;
    buf.extend_from_slice(&encode_utf16be(host));
    buf.write_i32::<BigEndian>(port as i32)?;
    Ok(buf)
}

fn ping_legacy(mut stream: TcpStream, request: &[u8], era: Era) -> Result<PingResponse> {
    stream.write_all(request)?;
    stream.flush()?;
    let text = read_kick(&mut stream)?;
    match era {
        Era::Beta => parse_beta_response(&text),
        _ => parse_legacy_response(&text, era),
    }
}

/// 读取旧版踢出包：`0xFF` + `u16 字符数` + UTF-16BE文本
pub fn read_kick<R: Read>(reader: &mut R) -> Result<String> {
    let id = reader.read_u8()?;
    if id != LEGACY_KICK {
        return Err(McWireError::Malformed(format!("期望踢出包0xFF，实际 {:#04x}", id)));
    }
    let chars = reader.read_u16::<BigEndian>()? as usize;
    let mut data = vec![0u8; chars * 2];
    reader.read_exact(&mut data)?;
    decode_utf16be(&data)
}

fn parse_number(value: &str, what: &str) -> Result<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| McWireError::Malformed(format!("{} 不是有效数字: {:?}", what, value)))
}

/// 解析1.4-1.6响应：`§1\0协议\0版本\0MOTD\0在线\0最大`
pub fn parse_legacy_response(text: &str, era: Era) -> Result<PingResponse> {
    let parts: Vec<&str> = text.split('\0').collect();
    if parts.len() != 6 || parts[0] != "§1" {
        return Err(McWireError::Malformed(format!("无效的旧版响应: {:?}", text)));
    }
    Ok(PingResponse {
        era,
        protocol: Some(parse_number(parts[1], "protocol")?),
        version: Some(parts[2].to_string()),
        motd: parts[3].to_string(),
        online: parse_number(parts[4], "online")?,
        max: parse_number(parts[5], "max")?,
        latency: None,
        status: None,
    })
}

/// 解析1.4之前的响应：`MOTD§在线§最大`
pub fn parse_beta_response(text: &str) -> Result<PingResponse> {
    let mut parts = text.rsplitn(3, '§');
    let max = parts.next();
    let online = parts.next();
    let motd = parts.next();
    match (motd, online, max) {
        (Some(motd), Some(online), Some(max)) => Ok(PingResponse {
            era: Era::Beta,
            protocol: None,
            version: None,
            motd: motd.to_string(),
            online: parse_number(online, "online")?,
            max: parse_number(max, "max")?,
            latency: None,
            status: None,
        }),
        _ => Err(McWireError::Malformed(format!("无效的Beta响应: {:?}", text))),
    }
}
