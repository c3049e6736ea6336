use reqwest::header::HeaderMap;
use xsched_codec::MessageCodec;

use crate::framing::{AnyFrameReader, BodyStream, Framing};
use crate::request::MESOS_STREAM_ID_HEADER;
use crate::Error;

/// The result of a successful [`crate::Client::send`] call.
///
/// Dropping a `Response` is the single source of truth for cancellation:
/// it drops the underlying body stream, which tears down the connection's
/// read side same as an explicit `context.CancelFunc` would in the
/// implementation this is modeled on. There's no separate `close()` to
/// forget to call.
pub struct Response {
    headers: HeaderMap,
    reader: Option<AnyFrameReader>,
}

impl Response {
    pub(crate) fn new(headers: HeaderMap, body: Option<(Framing, BodyStream)>) -> Self {
        Self {
            headers,
            reader: body.map(|(framing, body)| AnyFrameReader::new(framing, body)),
        }
    }

    /// The `Mesos-Stream-Id` header, present on a successful `SUBSCRIBE`
    /// response and required on every subsequent call for this session.
    pub fn stream_id(&self) -> Option<&str> {
        self.headers.get(MESOS_STREAM_ID_HEADER)?.to_str().ok()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// `true` for a `202 Accepted` response, which carries no body.
    pub fn is_empty(&self) -> bool {
        self.reader.is_none()
    }

    /// Decode exactly one message out of the response body using `codec`.
    ///
    /// Returns `Ok(None)` if this response carries no body (`202`), or if
    /// the body stream ended with no frame pending.
    pub async fn read<M>(&mut self, codec: &impl MessageCodec<M>) -> Result<Option<M>, Error> {
        match self.reader.as_mut() {
            None => Ok(None),
            Some(reader) => Ok(codec.decode(reader).await?),
        }
    }

    /// Read every remaining message out of a record-io streamed body, one
    /// at a time, stopping at the first `Ok(None)`. Used by tests and by
    /// callers that want a synchronous drain instead of a push loop.
    pub async fn drain_into<M>(mut self, codec: &impl MessageCodec<M>, out: &mut Vec<M>) -> Result<(), Error> {
        while let Some(msg) = self.read(codec).await? {
            out.push(msg);
        }
        Ok(())
    }
}

pub(crate) fn body_stream(res: reqwest::Response) -> BodyStream {
    Box::pin(res.bytes_stream())
}
