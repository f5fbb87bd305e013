//! Storage codec trait definitions.

/// Storage codec trait.
///
/// Every dataset buffer passes through a codec on its way into a container
/// and back out. The codec id is stored next to the encoded bytes so a
/// reader always decodes with the codec the writer used.
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync` so containers holding them stay `Send`.
pub trait StorageCodec: Send + Sync {
    /// Encode bytes for storage.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes from storage.
    ///
    /// Reverses the encode operation. Returns an error if the data
    /// cannot be decoded (truncated or corrupted frame).
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Unique codec identifier persisted with each buffer.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Encoding failed.
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Decoding failed (invalid or truncated frame).
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Unknown codec identifier.
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),
}
