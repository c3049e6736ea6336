//! Message codecs: encode a message to bytes, decode a frame back into a
//! message, enforcing a maximum in-memory size while doing so.

use std::future::Future;

use bytes::Bytes;
use xsched_io::{FrameReader, ReadOutcome};

mod error;
pub mod json;
pub mod protobuf;

pub use error::CodecError;
pub use json::JsonCodec;
pub use protobuf::ProtobufCodec;

/// Default ceiling on a single decoded message: 4 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 4 * 1024 * 1024;

/// Amount the accumulation buffer grows by on each partial read, bounding
/// reallocation cost for large messages.
pub const READ_BUF_INCREMENT: usize = 4096;

/// Encodes and decodes a concrete message type `M`, advertising the media
/// types callers should put in `Content-Type`/`Accept` headers.
pub trait MessageCodec<M>: Send + Sync {
    /// Media type for an encoded request body (e.g. `application/x-protobuf`).
    fn encoder_content_type(&self) -> &'static str;
    /// Media type expected of a decoded response body.
    fn decoder_content_type(&self) -> &'static str;

    /// Encode `msg` to its wire representation.
    fn encode(&self, msg: &M) -> Result<Bytes, CodecError>;

    /// Read exactly one frame from `reader` and deserialize it.
    ///
    /// Returns `Ok(None)` when the underlying stream is exhausted with no
    /// partial frame pending (clean EOF between messages).
    fn decode<R>(&self, reader: &mut R) -> impl Future<Output = Result<Option<M>, CodecError>> + Send
    where
        R: FrameReader;
}

/// Shared decode-loop: pulls frame bytes via `reader.read_frame` into a
/// growable buffer, enforcing [`DEFAULT_MAX_MESSAGE_SIZE`] (or `max_size`)
/// cumulatively as bytes arrive, growing the buffer by
/// [`READ_BUF_INCREMENT`] per partial read.
pub(crate) async fn read_one_frame<R>(reader: &mut R, max_size: u64) -> Result<Option<Vec<u8>>, CodecError>
where
    R: FrameReader,
{
    let mut buf = Vec::with_capacity(READ_BUF_INCREMENT);
    loop {
        buf.reserve(READ_BUF_INCREMENT);
        match reader.read_frame(&mut buf).await? {
            ReadOutcome::Eof => {
                return if buf.is_empty() { Ok(None) } else { Ok(Some(buf)) };
            }
            ReadOutcome::Progress(p) => {
                if buf.len() as u64 > max_size {
                    return Err(CodecError::MessageTooLarge {
                        limit: max_size,
                        at_least: buf.len() as u64,
                    });
                }
                if p.end_of_frame {
                    return Ok(Some(buf));
                }
            }
        }
    }
}
