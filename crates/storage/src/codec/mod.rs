//! Storage codec abstraction.
//!
//! Dataset buffers are encoded on write and decoded on read. The codec is
//! chosen from the record's deflate level:
//!
//! - level 0: `IdentityCodec` (stored as-is)
//! - levels 1-9: `ZstdCodec` at the same level
//!
//! # Usage
//!
//! ```ignore
//! use sdarc_storage::codec::{codec_for_level, get_codec};
//!
//! let codec = codec_for_level(5);
//! let encoded = codec.encode(b"hello world")?;
//! let decoded = get_codec(codec.codec_id())?.decode(&encoded)?;
//! ```

mod identity;
mod traits;
mod zstd_codec;

pub use identity::IdentityCodec;
pub use traits::{CodecError, StorageCodec};
pub use zstd_codec::ZstdCodec;

/// Get a codec by its identifier.
///
/// # Known Codecs
///
/// - `"identity"`: No-op codec (pass-through)
/// - `"zstd"`: Zstandard (decoding does not need the level)
pub fn get_codec(codec_id: &str) -> Result<Box<dyn StorageCodec>, CodecError> {
    match codec_id {
        "identity" => Ok(Box::new(IdentityCodec)),
        "zstd" => Ok(Box::new(ZstdCodec::default())),
        _ => Err(CodecError::UnknownCodec(codec_id.to_string())),
    }
}

/// Codec used to write a buffer at a deflate level
pub fn codec_for_level(level: u8) -> Box<dyn StorageCodec> {
    if level == 0 {
        Box::new(IdentityCodec)
    } else {
        Box::new(ZstdCodec::new(level))
    }
}
