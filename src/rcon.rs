//! RCON协议客户端（TCP）
//!
//! 数据包：`i32 LE 长度` + `i32 LE 请求ID` + `i32 LE 类型` + 载荷 + 两个NUL。
//! 认证成功后才能执行命令。服务端会把较长的命令输出拆成多个响应包，
//! 但不提供结束标记，因此客户端在没有更多待读数据时停止拼接。

use crate::error::{McWireError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, trace};

pub const TYPE_LOGIN: i32 = 3;
pub const TYPE_COMMAND: i32 = 2;
pub const TYPE_AUTH_RESPONSE: i32 = 2;
pub const TYPE_RESPONSE: i32 = 0;

/// 请求ID + 类型 + 两个NUL
const PACKET_OVERHEAD: usize = 10;

/// 服务端单个响应包载荷的最大长度
pub const MAX_RESPONSE_FRAGMENT: usize = 4096;

/// 接受的最大包长度
const MAX_PACKET_LENGTH: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconPacket {
    pub request_id: i32,
    pub kind: i32,
    pub payload: Vec<u8>,
}

impl RconPacket {
    pub fn new(request_id: i32, kind: i32, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            request_id,
            kind,
            payload: payload.into(),
        }
    }
}

/// 写入RCON数据包
pub fn write_packet<W: Write>(writer: &mut W, packet: &RconPacket) -> Result<()> {
    let length = packet.payload.len() + PACKET_OVERHEAD;
    if length > MAX_PACKET_LENGTH {
        return Err(McWireError::SizeViolation {
            length,
            max: MAX_PACKET_LENGTH,
        });
    }

    let mut buf = Vec::with_capacity(length + 4);
    buf.write_i32::<LittleEndian>(length as i32)?;
    buf.write_i32::<LittleEndian>(packet.request_id)?;
    buf.write_i32::<LittleEndian>(packet.kind)?;
    buf.extend_from_slice(&packet.payload);
    buf.extend_from_slice(&[0, 0]);

    writer.write_all(&buf)?;
    writer.flush()?;
    Ok(())
}

/// 读取RCON数据包
pub fn read_packet<R: Read>(reader: &mut R) -> Result<RconPacket> {
    let length = reader.read_i32::<LittleEndian>()?;
    let length = usize::try_from(length)
        .ok()
        .filter(|len| (PACKET_OVERHEAD..=MAX_PACKET_LENGTH).contains(len))
        .ok_or_else(|| McWireError::RconProtocol(format!("无效的包长度: {}", length)))?;

    let request_id = reader.read_i32::<LittleEndian>()?;
    let kind = reader.read_i32::<LittleEndian>()?;
    let mut payload = vec![0u8; length - 8];
    reader.read_exact(&mut payload)?;

    if payload[payload.len() - 2..] != [0, 0] {
        return Err(McWireError::RconProtocol("载荷缺少结尾NUL".to_string()));
    }
    payload.truncate(payload.len() - 2);

    Ok(RconPacket {
        request_id,
        kind,
        payload,
    })
}

#[derive(Debug, Clone)]
pub struct RconOptions {
    pub timeout: Duration,
}

impl Default for RconOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }
}

impl RconOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// RCON会话，独占一个TCP连接
pub struct RconClient {
    stream: TcpStream,
    next_id: i32,
    authenticated: bool,
}

impl RconClient {
    pub fn connect<A: ToSocketAddrs>(addr: A, options: RconOptions) -> Result<Self> {
        let mut last_err = None;
        for target in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&target, options.timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(options.timeout))?;
                    stream.set_write_timeout(Some(options.timeout))?;
                    stream.set_nodelay(true)?;
                    debug!(%target, "RCON连接已建立");
                    return Ok(Self {
                        stream,
                        next_id: 1,
                        authenticated: false,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err
            .unwrap_or_else(|| std::io::Error::new(ErrorKind::NotFound, "无法解析RCON地址"))
            .into())
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn next_request_id(&mut self) -> i32 {
        let id = self.next_id;
        // 跳过 -1，它在认证响应中表示失败
        self.next_id = match self.next_id.wrapping_add(1) {
            -1 | 0 => 1,
            next => next,
        };
        id
    }

    /// 使用密码认证
    pub fn authenticate(&mut self, password: &str) -> Result<()> {
        let id = self.next_request_id();
        write_packet(&mut self.stream, &RconPacket::new(id, TYPE_LOGIN, password.as_bytes()))?;

        let response = read_packet(&mut self.stream)?;
        if response.request_id == -1 {
            return Err(McWireError::RconAuth("密码错误".to_string()));
        }
        if response.request_id != id {
            return Err(McWireError::RconAuth(format!(
                "请求ID不符: 期望 {}, 实际 {}",
                id, response.request_id
            )));
        }
        if response.kind != TYPE_AUTH_RESPONSE {
            return Err(McWireError::RconAuth(format!(
                "响应类型不符: 期望 {}, 实际 {}",
                TYPE_AUTH_RESPONSE, response.kind
            )));
        }

        debug!(request_id = id, "RCON认证成功");
        self.authenticated = true;
        Ok(())
    }

    /// 执行命令并返回拼接后的输出
    pub fn command(&mut self, command: &str) -> Result<String> {
        if !self.authenticated {
            return Err(McWireError::RconProtocol("尚未认证".to_string()));
        }

        let id = self.next_request_id();
        write_packet(&mut self.stream, &RconPacket::new(id, TYPE_COMMAND, command.as_bytes()))?;

        let mut output = Vec::new();
        let mut fragments = 0usize;
        loop {
            let response = match read_packet(&mut self.stream) {
                Ok(response) => response,
                // 满载分片后没有后续：读超时即响应结束
                Err(e) if fragments > 0 && e.is_timeout() => {
                    debug!(request_id = id, "等待后续分片超时，视为响应结束");
                    break;
                }
                Err(e) => return Err(e),
            };
            if response.request_id != id || response.kind != TYPE_RESPONSE {
                return Err(McWireError::RconProtocol(format!(
                    "响应不匹配: 请求ID {} 类型 {}, 期望 {} 类型 {}",
                    response.request_id, response.kind, id, TYPE_RESPONSE
                )));
            }
            fragments += 1;
            let full = response.payload.len() >= MAX_RESPONSE_FRAGMENT;
            output.extend_from_slice(&response.payload);
            trace!(request_id = id, len = response.payload.len(), "收到命令响应分片");

            // 满载分片之后一定还有后续；否则只在已有待读数据时继续
            if !full && !self.has_pending_data()? {
                break;
            }
        }

        debug!(request_id = id, fragments, len = output.len(), "命令执行完成");
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    fn has_pending_data(&self) -> Result<bool> {
        self.stream.set_nonblocking(true)?;
        let mut next_byte = [0u8; 1];
        let result = self.stream.peek(&mut next_byte);
        self.stream.set_nonblocking(false)?;

        match result {
            Ok(n) => Ok(n > 0),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn close(self) -> Result<()> {
        self.stream.shutdown(Shutdown::Both)?;
        Ok(())
    }
}
