//! Identity codec (no transformation).
//!
//! Used for buffers written with deflate level 0.

use super::traits::{CodecError, StorageCodec};

/// Identity codec - bytes pass through unchanged.
///
/// # Example
///
/// ```
/// use sdarc_storage::codec::{IdentityCodec, StorageCodec};
///
/// let codec = IdentityCodec;
/// let encoded = codec.encode(b"hello world").unwrap();
/// assert_eq!(encoded.as_slice(), b"hello world");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl StorageCodec for IdentityCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &str {
        "identity"
    }
}
