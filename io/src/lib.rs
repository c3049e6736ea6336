//! Frame reading over a chunked, fallible byte stream.
//!
//! A [`FrameReader`] turns a `Stream<Item = Result<Bytes, E>>` body (the
//! shape every HTTP client hands back for a streamed response) into a
//! sequence of logical frames. Two framings are supported: [`record_io`],
//! which prefixes every frame with a decimal ASCII length, and [`single`],
//! which treats the entire body as one frame terminated by EOF.

use core::fmt;
use std::error;

pub mod record_io;
pub mod single;

pub use record_io::RecordIoReader;
pub use single::SingleFrameReader;

/// Error produced by a frame reader while pulling bytes out of its
/// underlying stream.
#[derive(Debug)]
#[non_exhaustive]
pub enum FramingError {
    /// The underlying byte stream returned an error.
    Stream(Box<dyn error::Error + Send + Sync>),
    /// A record-io length header was not valid decimal ASCII, or did not
    /// fit in a `u64`.
    InvalidLengthHeader,
    /// The stream ended in the middle of a frame (a length header was read
    /// but fewer than that many body bytes followed before EOF).
    TruncatedFrame,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream(e) => write!(f, "frame stream error: {e}"),
            Self::InvalidLengthHeader => f.write_str("malformed record-io length header"),
            Self::TruncatedFrame => f.write_str("stream ended mid-frame"),
        }
    }
}

impl error::Error for FramingError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Stream(e) => Some(&**e),
            _ => None,
        }
    }
}

/// Outcome of a single [`FrameReader::read_frame`] step.
///
/// A reader is invoked repeatedly; each call appends some bytes (possibly
/// zero, e.g. while parsing a record-io length header) to the caller's
/// buffer and reports whether the frame currently being accumulated is now
/// complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Bytes appended to the output buffer by this step.
    pub n: usize,
    /// Whether the frame that was being accumulated is now complete.
    pub end_of_frame: bool,
}

/// Result of a [`FrameReader::read_frame`] call.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Made progress on the current frame (possibly completing it).
    Progress(Progress),
    /// The underlying stream is exhausted and no partial frame is pending.
    Eof,
}

/// A frame reader consumes an underlying byte stream and exposes it as a
/// sequence of logical frames, one `read_frame` loop per frame.
///
/// Implementations are not required to be `Sync`; a frame reader is owned
/// by exactly one decode loop at a time.
pub trait FrameReader: Send {
    /// Perform one step of reading the current frame, appending bytes to
    /// `out`. Call repeatedly until [`ReadOutcome::Progress`] reports
    /// `end_of_frame: true` or [`ReadOutcome::Eof`] is returned.
    fn read_frame(
        &mut self,
        out: &mut Vec<u8>,
    ) -> impl core::future::Future<Output = Result<ReadOutcome, FramingError>> + Send;
}
