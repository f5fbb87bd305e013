//! Zstandard codec for compressed buffers.

use super::traits::{CodecError, StorageCodec};

/// Zstandard compression at a fixed level.
///
/// Record deflate levels 1-9 map directly onto zstd levels 1-9.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Create a codec compressing at `level`
    pub fn new(level: u8) -> Self {
        ZstdCodec {
            level: i32::from(level),
        }
    }

    /// Compression level
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        ZstdCodec::new(3)
    }
}

impl StorageCodec for ZstdCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        ::zstd::encode_all(data, self.level)
            .map_err(|e| CodecError::EncodeError(format!("zstd encode: {}", e)))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        ::zstd::decode_all(data).map_err(|e| CodecError::DecodeError(format!("zstd decode: {}", e)))
    }

    fn codec_id(&self) -> &str {
        "zstd"
    }
}
