//! Query协议客户端（UDP）
//!
//! 每个请求以魔数 `0xFEFD` 开头。握手（类型9）取得与会话ID绑定的令牌，
//! 之后的状态请求（类型0）携带该令牌。完整状态响应可能分片，分片头中的标记
//! 最高位为1表示最后一片。

use crate::{
    error::{McWireError, Result},
    utils::read_cstring,
};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;
use tracing::debug;

/// 请求魔数
pub const MAGIC: [u8; 2] = [0xFE, 0xFD];

/// 完整状态请求的固定填充
pub const FULL_STAT_PADDING: [u8; 4] = [0xFF, 0xFF, 0xFF, 0x01];

const TYPE_HANDSHAKE: u8 = 9;
const TYPE_STAT: u8 = 0;

/// 服务端只使用会话ID每字节的低4位
const SESSION_MASK: i32 = 0x0F0F_0F0F;

/// 分片头长度：`splitnum\0` + 标记 + 序号
const FRAGMENT_HEADER_LEN: usize = 11;
const LAST_FRAGMENT: u8 = 0x80;
const MAX_FRAGMENTS: usize = 16;

/// 玩家列表前的填充长度：空键 + `\x01player_\0\0`
const PLAYERS_PADDING_LEN: usize = 11;
const FULL_STAT_KEYS: usize = 10;

const MAX_DATAGRAM: usize = 65536;

#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub timeout: Duration,
    pub session_id: i32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            session_id: 1,
        }
    }
}

impl QueryOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置会话ID
    ///
    /// 服务端只回显每字节的低4位，连接时会按 `0x0F0F0F0F` 掩码截断；
    /// 实际发送的值见 [`QueryClient::session_id`]。
    pub fn with_session_id(mut self, session_id: i32) -> Self {
        self.session_id = session_id;
        self
    }
}

/// 基础状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicStat {
    pub motd: String,
    pub game_type: String,
    pub map: String,
    /// (在线人数, 最大人数)
    pub players: (u32, u32),
    pub host_port: u16,
    pub host_ip: String,
}

/// 完整状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullStat {
    pub motd: String,
    pub game_type: String,
    pub game_id: String,
    pub version: String,
    pub plugins: String,
    pub map: String,
    /// (在线人数, 最大人数)
    pub players: (u32, u32),
    pub host_port: u16,
    pub host_ip: String,
    pub player_names: Vec<String>,
    /// 原始键值对，按收到的顺序
    pub raw: Vec<(String, String)>,
}

/// Query会话，独占一个UDP套接字
pub struct QueryClient {
    socket: UdpSocket,
    session_id: i32,
    token: Option<i32>,
}

impl QueryClient {
    pub fn connect<A: ToSocketAddrs>(addr: A, options: QueryOptions) -> Result<Self> {
        let target = addr.to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "无法解析Query地址")
        })?;
        let local: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };

        let socket = UdpSocket::bind(local)?;
        socket.connect(target)?;
        socket.set_read_timeout(Some(options.timeout))?;
        socket.set_write_timeout(Some(options.timeout))?;
        debug!(%target, "Query套接字已就绪");

        Ok(Self {
            socket,
            session_id: options.session_id & SESSION_MASK,
            token: None,
        })
    }

    pub fn session_id(&self) -> i32 {
        self.session_id
    }

    pub fn token(&self) -> Option<i32> {
        self.token
    }

    /// 握手，取得挑战令牌
    pub fn handshake(&mut self) -> Result<i32> {
        self.send(TYPE_HANDSHAKE, &[])?;
        let body = self.receive(TYPE_HANDSHAKE)?;
        let text = read_cstring(&mut Cursor::new(body.as_slice()))?;
        let token = text
            .trim()
            .parse::<i32>()
            .map_err(|_| McWireError::QueryProtocol(format!("无效的挑战令牌: {:?}", text)))?;
        debug!(session_id = self.session_id, token, "Query握手完成");
        self.token = Some(token);
        Ok(token)
    }

    pub fn basic_stat(&mut self) -> Result<BasicStat> {
        let token = self.ensure_token()?;
        self.send(TYPE_STAT, &token.to_be_bytes())?;
        let body = self.receive(TYPE_STAT)?;
        parse_basic_stat(&body)
    }

    pub fn full_stat(&mut self) -> Result<FullStat> {
        let token = self.ensure_token()?;
        let mut payload = token.to_be_bytes().to_vec();
        payload.extend_from_slice(&FULL_STAT_PADDING);
        self.send(TYPE_STAT, &payload)?;

        let mut fragments: Vec<(u8, Vec<u8>)> = Vec::new();
        let mut header = Vec::new();
        loop {
            let body = self.receive(TYPE_STAT)?;
            if body.len() < FRAGMENT_HEADER_LEN {
                return Err(McWireError::QueryProtocol("完整状态分片过短".to_string()));
            }
            let marker = body[FRAGMENT_HEADER_LEN - 2];
            let index = body[FRAGMENT_HEADER_LEN - 1];
            if header.is_empty() {
                header = body[..FRAGMENT_HEADER_LEN].to_vec();
            }
            fragments.push((index, body[FRAGMENT_HEADER_LEN..].to_vec()));
            debug!(index, marker, "收到完整状态分片");

            if marker & LAST_FRAGMENT != 0 {
                break;
            }
            if fragments.len() >= MAX_FRAGMENTS {
                return Err(McWireError::QueryProtocol("完整状态分片过多".to_string()));
            }
        }

        fragments.sort_by_key(|(index, _)| *index);
        let mut data = header;
        for (_, fragment) in fragments {
            data.extend_from_slice(&fragment);
        }
        parse_full_stat(&data)
    }

    fn ensure_token(&mut self) -> Result<i32> {
        match self.token {
            Some(token) => Ok(token),
            None => self.handshake(),
        }
    }

    fn send(&self, kind: u8, payload: &[u8]) -> Result<()> {
        let mut packet = Vec::with_capacity(7 + payload.len());
        packet.extend_from_slice(&MAGIC);
        packet.write_u8(kind)?;
        packet.write_i32::<BigEndian>(self.session_id)?;
        packet.extend_from_slice(payload);
        self.socket.send(&packet)?;
        Ok(())
    }

    /// 接收一个数据报并校验类型与会话ID，返回其余部分
    fn receive(&self, expected: u8) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        let n = self.socket.recv(&mut buf)?;
        buf.truncate(n);

        let mut cursor = Cursor::new(buf.as_slice());
        let kind = cursor.read_u8()?;
        let session_id = cursor.read_i32::<BigEndian>()?;
        if kind != expected {
            return Err(McWireError::QueryProtocol(format!(
                "响应类型不符: 期望 {}, 实际 {}",
                expected, kind
            )));
        }
        if session_id != self.session_id {
            return Err(McWireError::QueryProtocol(format!(
                "会话ID不符: 期望 {:#010x}, 实际 {:#010x}",
                self.session_id, session_id
            )));
        }
        Ok(buf[cursor.position() as usize..].to_vec())
    }
}

fn parse_count(value: &str, key: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| McWireError::QueryProtocol(format!("{} 不是有效数字: {:?}", key, value)))
}

/// 解析基础状态响应
pub fn parse_basic_stat(data: &[u8]) -> Result<BasicStat> {
    let mut cursor = Cursor::new(data);
    let motd = read_cstring(&mut cursor)?;
    let game_type = read_cstring(&mut cursor)?;
    let map = read_cstring(&mut cursor)?;
    let online = parse_count(&read_cstring(&mut cursor)?, "numplayers")?;
    let max = parse_count(&read_cstring(&mut cursor)?, "maxplayers")?;
    let host_port = cursor.read_u16::<LittleEndian>()?;
    let host_ip = read_cstring(&mut cursor)?;
    Ok(BasicStat {
        motd,
        game_type,
        map,
        players: (online, max),
        host_port,
        host_ip,
    })
}

/// 解析拼接后的完整状态数据（以11字节分片头开头）
pub fn parse_full_stat(data: &[u8]) -> Result<FullStat> {
    let mut cursor = Cursor::new(data);
    skip(&mut cursor, FRAGMENT_HEADER_LEN)?;

    let mut raw = Vec::with_capacity(FULL_STAT_KEYS);
    for _ in 0..FULL_STAT_KEYS {
        let key = read_cstring(&mut cursor)?;
        let value = read_cstring(&mut cursor)?;
        raw.push((key, value));
    }

    skip(&mut cursor, PLAYERS_PADDING_LEN)?;

    let mut player_names = Vec::new();
    loop {
        let name = read_cstring(&mut cursor)?;
        if name.is_empty() {
            break;
        }
        player_names.push(name);
    }

    let map: HashMap<&str, &str> = raw.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let get = |key: &str| -> Result<String> {
        map.get(key)
            .map(|v| v.to_string())
            .ok_or_else(|| McWireError::QueryProtocol(format!("完整状态缺少键 {}", key)))
    };

    let online = parse_count(&get("numplayers")?, "numplayers")?;
    let max = parse_count(&get("maxplayers")?, "maxplayers")?;
    let host_port = get("hostport")?
        .trim()
        .parse()
        .map_err(|_| McWireError::QueryProtocol("hostport 不是有效端口".to_string()))?;

    Ok(FullStat {
        motd: get("hostname")?,
        game_type: get("gametype")?,
        game_id: get("game_id")?,
        version: get("version")?,
        plugins: get("plugins")?,
        map: get("map")?,
        players: (online, max),
        host_port,
        host_ip: get("hostip")?,
        player_names,
        raw,
    })
}

fn skip(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<()> {
    let mut padding = vec![0u8; len];
    cursor.read_exact(&mut padding)?;
    Ok(())
}
