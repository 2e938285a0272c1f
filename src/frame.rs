//! 数据包帧
//!
//! 未压缩：`VarInt(载荷长度) + 载荷`，载荷为 `VarInt(包ID) + 字段`。
//! 压缩模式：`VarInt(外层长度) + VarInt(数据长度) + 主体`。载荷小于阈值时数据长度为0、
//! 主体为原始载荷；否则数据长度为未压缩大小、主体经zlib压缩。

use crate::{
    compression::{compress_data, decompress_data},
    error::{McWireError, Result},
    packets::Packet,
    varint::{read_varint, varint_size, write_varint},
};
use std::io::{Cursor, Read, Write};
use tracing::trace;

/// 单帧最大长度（3字节VarInt所能表示的最大值）
pub const MAX_FRAME_LENGTH: usize = 2_097_151;

/// 拼接包ID与字段载荷
pub fn encode_payload(id: i32, body: &[u8]) -> Result<Vec<u8>> {
    let mut payload = Vec::with_capacity(varint_size(id) + body.len());
    write_varint(&mut payload, id)?;
    payload.extend_from_slice(body);
    Ok(payload)
}

/// 拆分载荷为包ID与字段部分
pub fn split_payload(payload: &[u8]) -> Result<(i32, &[u8])> {
    let mut cursor = Cursor::new(payload);
    let id = read_varint(&mut cursor)?;
    Ok((id, &payload[cursor.position() as usize..]))
}

/// 构造完整帧。`threshold` 为None时使用未压缩帧
pub fn build_frame(payload: &[u8], threshold: Option<usize>) -> Result<Vec<u8>> {
    let inner = match threshold {
        None => payload.to_vec(),
        Some(threshold) if payload.len() < threshold => {
            trace!(len = payload.len(), threshold, "载荷低于阈值，不压缩");
            let mut inner = Vec::with_capacity(payload.len() + 1);
            write_varint(&mut inner, 0)?;
            inner.extend_from_slice(payload);
            inner
        }
        Some(threshold) => {
            let compressed = compress_data(payload)?;
            trace!(len = payload.len(), compressed = compressed.len(), threshold, "载荷已压缩");
            let mut inner = Vec::with_capacity(compressed.len() + 5);
            write_varint(&mut inner, frame_len(payload.len())?)?;
            inner.extend_from_slice(&compressed);
            inner
        }
    };

    let mut frame = Vec::with_capacity(inner.len() + 3);
    write_varint(&mut frame, frame_len(inner.len())?)?;
    frame.extend_from_slice(&inner);
    Ok(frame)
}

fn frame_len(len: usize) -> Result<i32> {
    if len > MAX_FRAME_LENGTH {
        return Err(McWireError::SizeViolation {
            length: len,
            max: MAX_FRAME_LENGTH,
        });
    }
    Ok(len as i32)
}

/// 写入一帧；整帧在缓冲区中构造完成后才写入流
pub fn write_frame<W: Write>(
    writer: &mut W,
    payload: &[u8],
    threshold: Option<usize>,
) -> Result<()> {
    let frame = build_frame(payload, threshold)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

/// 读取一帧，返回未压缩的载荷
pub fn read_frame<R: Read>(reader: &mut R, threshold: Option<usize>) -> Result<Vec<u8>> {
    let length = read_varint(reader)?;
    let length = checked_len(length)?;
    let mut frame = vec![0u8; length];
    reader.read_exact(&mut frame)?;

    if threshold.is_none() {
        return Ok(frame);
    }

    let mut cursor = Cursor::new(frame.as_slice());
    let data_length = checked_len(read_varint(&mut cursor)?)?;
    let body = &frame[cursor.position() as usize..];

    // 只有数据长度非零时才解压
    if data_length == 0 {
        Ok(body.to_vec())
    } else {
        trace!(compressed = body.len(), data_length, "解压帧");
        decompress_data(body, data_length)
    }
}

fn checked_len(length: i32) -> Result<usize> {
    let length = usize::try_from(length)
        .map_err(|_| McWireError::Malformed(format!("负数帧长度: {}", length)))?;
    if length > MAX_FRAME_LENGTH {
        return Err(McWireError::SizeViolation {
            length,
            max: MAX_FRAME_LENGTH,
        });
    }
    Ok(length)
}

/// 持有流与当前压缩阈值的阻塞连接
pub struct Connection<S> {
    stream: S,
    compression: Option<usize>,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            compression: None,
        }
    }

    /// 设置压缩阈值，None表示关闭压缩
    pub fn set_compression(&mut self, threshold: Option<usize>) {
        self.compression = threshold;
    }

    pub fn compression(&self) -> Option<usize> {
        self.compression
    }

    pub fn send_raw(&mut self, id: i32, body: &[u8]) -> Result<()> {
        let payload = encode_payload(id, body)?;
        trace!(id, len = payload.len(), "发送数据包");
        write_frame(&mut self.stream, &payload, self.compression)
    }

    pub fn send<P: Packet>(&mut self, packet: &P) -> Result<()> {
        let body = packet.encode_body()?;
        self.send_raw(P::ID, &body)
    }

    pub fn recv_raw(&mut self) -> Result<(i32, Vec<u8>)> {
        let payload = read_frame(&mut self.stream, self.compression)?;
        let (id, body) = split_payload(&payload)?;
        trace!(id, len = payload.len(), "收到数据包");
        Ok((id, body.to_vec()))
    }

    /// 接收指定类型的数据包，ID不符时报错
    pub fn recv<P: Packet>(&mut self) -> Result<P> {
        let (id, body) = self.recv_raw()?;
        if id != P::ID {
            return Err(McWireError::UnexpectedPacket {
                expected: P::ID,
                found: id,
            });
        }
        P::decode_body(&body)
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
