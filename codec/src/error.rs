use core::fmt;
use std::error;

use xsched_io::FramingError;

/// Error produced while encoding or decoding a message.
#[derive(Debug)]
#[non_exhaustive]
pub enum CodecError {
    /// Underlying frame reader failed (malformed record-io header,
    /// truncated frame, or a transport error from the byte stream).
    Framing(FramingError),
    /// Cumulative frame bytes exceeded the configured maximum.
    MessageTooLarge { limit: u64, at_least: u64 },
    /// `prost` failed to decode the frame as the target message type.
    ProtobufDecode(prost::DecodeError),
    /// `prost` failed to encode the message.
    ProtobufEncode(prost::EncodeError),
    /// `serde_json` failed to decode/encode the message.
    Json(serde_json::Error),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framing(e) => write!(f, "framing error: {e}"),
            Self::MessageTooLarge { limit, at_least } => {
                write!(f, "message exceeds maximum size of {limit} bytes (read at least {at_least})")
            }
            Self::ProtobufDecode(e) => write!(f, "protobuf decode failed: {e}"),
            Self::ProtobufEncode(e) => write!(f, "protobuf encode failed: {e}"),
            Self::Json(e) => write!(f, "json codec failed: {e}"),
        }
    }
}

impl error::Error for CodecError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Framing(e) => Some(e),
            Self::ProtobufDecode(e) => Some(e),
            Self::ProtobufEncode(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::MessageTooLarge { .. } => None,
        }
    }
}

impl From<FramingError> for CodecError {
    fn from(e: FramingError) -> Self {
        Self::Framing(e)
    }
}

impl From<prost::DecodeError> for CodecError {
    fn from(e: prost::DecodeError) -> Self {
        Self::ProtobufDecode(e)
    }
}

impl From<prost::EncodeError> for CodecError {
    fn from(e: prost::EncodeError) -> Self {
        Self::ProtobufEncode(e)
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
