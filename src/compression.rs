use crate::error::{McWireError, Result};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// zlib压缩数据
pub fn compress_data(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| McWireError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| McWireError::Compression(e.to_string()))
}

/// zlib解压数据，`expected_size` 为帧中声明的未压缩长度
pub fn decompress_data(compressed_data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(expected_size);
    // 多读一个字节以检测声明长度偏小的情况
    ZlibDecoder::new(compressed_data)
        .take(expected_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| McWireError::Decompression(e.to_string()))?;

    if decompressed.len() != expected_size {
        return Err(McWireError::Decompression(format!(
            "解压后长度 {} 与声明长度 {} 不符",
            decompressed.len(),
            expected_size
        )));
    }
    Ok(decompressed)
}
