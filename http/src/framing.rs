use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use xsched_io::{FrameReader, FramingError, ReadOutcome, RecordIoReader, SingleFrameReader};

/// Body of a response, boxed so [`AnyFrameReader`] doesn't need to be
/// generic over the concrete `reqwest` stream type.
pub(crate) type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Which framing a call's response body uses. record-io is used for the
/// long-lived `SUBSCRIBE` response (a stream of length-prefixed `Event`
/// frames); every other call response is a single frame (or no body at
/// all, for `202 Accepted`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    RecordIo,
    Single,
}

/// Enum-dispatch over the two concrete [`FrameReader`] implementations.
/// `FrameReader::read_frame` returns `impl Future`, which isn't
/// object-safe, so this stands in for a `Box<dyn FrameReader>`.
pub(crate) enum AnyFrameReader {
    RecordIo(RecordIoReader<BodyStream>),
    Single(SingleFrameReader<BodyStream>),
}

impl AnyFrameReader {
    pub(crate) fn new(framing: Framing, body: BodyStream) -> Self {
        match framing {
            Framing::RecordIo => Self::RecordIo(RecordIoReader::new(body)),
            Framing::Single => Self::Single(SingleFrameReader::new(body)),
        }
    }
}

impl FrameReader for AnyFrameReader {
    async fn read_frame(&mut self, out: &mut Vec<u8>) -> Result<ReadOutcome, FramingError> {
        match self {
            Self::RecordIo(r) => r.read_frame(out).await,
            Self::Single(r) => r.read_frame(out).await,
        }
    }
}
