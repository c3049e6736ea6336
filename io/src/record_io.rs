//! `record-io` framing: `<decimal ascii length>\n<body bytes>`, repeated.

use std::error;

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;

use crate::{FrameReader, FramingError, Progress, ReadOutcome};

/// Reads `record-io` framed messages off of a chunked byte stream.
///
/// One [`FrameReader::read_frame`] loop corresponds to one record: a decimal
/// length header terminated by `\n`, followed by exactly that many body
/// bytes. Crossing a chunk boundary never blocks on the *next* record's
/// header: `read_frame` returns as soon as the current record is
/// complete, leaving any already-buffered bytes from the next header in
/// `leftover` for the following call.
pub struct RecordIoReader<S> {
    stream: S,
    leftover: BytesMut,
    pending: Option<u64>,
    stream_done: bool,
}

impl<S, E> RecordIoReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: error::Error + Send + Sync + 'static,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            leftover: BytesMut::new(),
            pending: None,
            stream_done: false,
        }
    }

    async fn fill(&mut self) -> Result<bool, FramingError> {
        if self.stream_done {
            return Ok(false);
        }
        match self.stream.next().await {
            Some(Ok(chunk)) => {
                self.leftover.extend_from_slice(&chunk);
                Ok(true)
            }
            Some(Err(e)) => Err(FramingError::Stream(Box::new(e))),
            None => {
                self.stream_done = true;
                Ok(false)
            }
        }
    }

    fn try_parse_length(&mut self) -> Option<Result<u64, FramingError>> {
        let nl = self.leftover.iter().position(|&b| b == b'\n')?;
        let header = self.leftover.split_to(nl + 1);
        let digits = &header[..header.len() - 1];
        let text = std::str::from_utf8(digits).ok()?;
        Some(
            text.trim()
                .parse::<u64>()
                .map_err(|_| FramingError::InvalidLengthHeader),
        )
    }
}

impl<S, E> FrameReader for RecordIoReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: error::Error + Send + Sync + 'static,
{
    async fn read_frame(&mut self, out: &mut Vec<u8>) -> Result<ReadOutcome, FramingError> {
        loop {
            match self.pending {
                None => {
                    if self.leftover.is_empty() && self.stream_done {
                        return Ok(ReadOutcome::Eof);
                    }
                    match self.try_parse_length() {
                        Some(Ok(len)) => {
                            self.pending = Some(len);
                            // report zero-progress, non-final step: caller loops again.
                            return Ok(ReadOutcome::Progress(Progress {
                                n: 0,
                                end_of_frame: false,
                            }));
                        }
                        Some(Err(e)) => return Err(e),
                        None => {
                            if !self.fill().await? {
                                return if self.leftover.is_empty() {
                                    Ok(ReadOutcome::Eof)
                                } else {
                                    Err(FramingError::TruncatedFrame)
                                };
                            }
                        }
                    }
                }
                Some(remaining) => {
                    if remaining == 0 {
                        self.pending = None;
                        return Ok(ReadOutcome::Progress(Progress {
                            n: 0,
                            end_of_frame: true,
                        }));
                    }
                    if self.leftover.is_empty() {
                        if !self.fill().await? {
                            return Err(FramingError::TruncatedFrame);
                        }
                        continue;
                    }
                    let take = remaining.min(self.leftover.len() as u64) as usize;
                    let chunk = self.leftover.split_to(take);
                    out.extend_from_slice(&chunk);
                    let remaining = remaining - take as u64;
                    self.pending = Some(remaining);
                    return Ok(ReadOutcome::Progress(Progress {
                        n: take,
                        end_of_frame: remaining == 0,
                    }));
                }
            }
        }
    }
}
