//! `single` framing: the entire body is one frame, terminated by EOF.

use std::error;

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::{FrameReader, FramingError, Progress, ReadOutcome};

/// Forwards every chunk of the underlying stream as part of one logical
/// frame; EOF marks the frame complete.
pub struct SingleFrameReader<S> {
    stream: S,
    done: bool,
}

impl<S, E> SingleFrameReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: error::Error + Send + Sync + 'static,
{
    pub fn new(stream: S) -> Self {
        Self { stream, done: false }
    }
}

impl<S, E> FrameReader for SingleFrameReader<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send,
    E: error::Error + Send + Sync + 'static,
{
    async fn read_frame(&mut self, out: &mut Vec<u8>) -> Result<ReadOutcome, FramingError> {
        if self.done {
            return Ok(ReadOutcome::Eof);
        }
        match self.stream.next().await {
            Some(Ok(chunk)) => {
                out.extend_from_slice(&chunk);
                Ok(ReadOutcome::Progress(Progress {
                    n: chunk.len(),
                    end_of_frame: false,
                }))
            }
            Some(Err(e)) => Err(FramingError::Stream(Box::new(e))),
            None => {
                self.done = true;
                if out.is_empty() {
                    Ok(ReadOutcome::Eof)
                } else {
                    Ok(ReadOutcome::Progress(Progress {
                        n: 0,
                        end_of_frame: true,
                    }))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    type E = std::io::Error;

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = Result<Bytes, E>> + Unpin + Send {
        let owned: Vec<_> = parts.iter().map(|p| Ok(Bytes::copy_from_slice(p))).collect();
        Box::pin(stream::iter(owned))
    }

    async fn read_one(mut r: impl FrameReader) -> Option<Vec<u8>> {
        let mut buf = Vec::new();
        loop {
            match r.read_frame(&mut buf).await.unwrap() {
                ReadOutcome::Progress(Progress { end_of_frame: true, .. }) => return Some(buf),
                ReadOutcome::Progress(_) => continue,
                ReadOutcome::Eof => return if buf.is_empty() { None } else { Some(buf) },
            }
        }
    }

    #[tokio::test]
    async fn whole_body_is_one_frame() {
        let s = chunks(&[b"hel", b"lo", b" world"]);
        let r = SingleFrameReader::new(s);
        assert_eq!(read_one(r).await, Some(b"hello world".to_vec()));
    }

    #[tokio::test]
    async fn empty_body_yields_no_frame() {
        let s = chunks(&[]);
        let r = SingleFrameReader::new(s);
        assert_eq!(read_one(r).await, None);
    }

    #[tokio::test]
    async fn second_call_after_eof_is_eof() {
        let s = chunks(&[b"a"]);
        let mut r = SingleFrameReader::new(s);
        let mut buf = Vec::new();
        loop {
            match r.read_frame(&mut buf).await.unwrap() {
                ReadOutcome::Progress(Progress { end_of_frame: true, .. }) => break,
                _ => continue,
            }
        }
        let mut buf2 = Vec::new();
        assert!(matches!(r.read_frame(&mut buf2).await.unwrap(), ReadOutcome::Eof));
    }
}
