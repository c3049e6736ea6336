use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use xsched_codec::ProtobufCodec;
use xsched_http::{with_close, with_stream_id, Framing};
use xsched_leader::LeaderClient;
use xsched_proto::{Call, Msg};
use xsched_service::Flow;

use crate::Error;

/// Default capacity of the bounded event buffer backing [`Session::pull`].
pub const DEFAULT_EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Unsubscribed,
    Subscribing,
    Subscribed { stream_id: String },
    Closed,
}

struct Inner {
    leader: LeaderClient,
    call_codec: ProtobufCodec<Call>,
    event_codec: ProtobufCodec<xsched_proto::Event>,
    state: RwLock<State>,
    tx: mpsc::Sender<Msg>,
    rx: Mutex<mpsc::Receiver<Msg>>,
    cancel: CancellationToken,
}

/// The central concurrency object: a long-lived bidirectional channel
/// built on a single subscribe response.
///
/// Cheap to clone; every clone shares the same state, event buffer, and
/// cancellation token. Many producers may [`Session::push`] concurrently
/// with one consumer [`Session::pull`]ing events.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    leader: LeaderClient,
    event_buffer: usize,
}

impl SessionBuilder {
    pub fn new(leader: LeaderClient) -> Self {
        Self {
            leader,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Capacity of the bounded event buffer. `0` makes every loopback push
    /// synchronously backpressured (it fails immediately unless a pull is
    /// already waiting).
    pub fn set_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn finish(self) -> Session {
        let (tx, rx) = mpsc::channel(self.event_buffer.max(1));
        Session {
            inner: Arc::new(Inner {
                leader: self.leader,
                call_codec: ProtobufCodec::new(),
                event_codec: ProtobufCodec::new(),
                state: RwLock::new(State::Unsubscribed),
                tx,
                rx: Mutex::new(rx),
                cancel: CancellationToken::new(),
            }),
        }
    }
}

async fn cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(t) => t.cancelled().await,
        None => std::future::pending().await,
    }
}

impl Session {
    /// Send `msg`, thread-safe and callable concurrently by many producers.
    ///
    /// A `Call` other than the first `SUBSCRIBE` is POSTed to the current
    /// leader carrying the stream-id header. Any other message is the
    /// internal-only loopback path (see [`Session::inject`]) and is placed
    /// directly into the event buffer, but only once a subscription is
    /// established: the very first message pushed through a fresh session
    /// must be `SUBSCRIBE`, loopback or not.
    pub async fn push(&self, msg: Msg, cancel: Option<&CancellationToken>) -> Result<(), Error> {
        if self.inner.cancel.is_cancelled() {
            return Err(Error::Closed);
        }
        match msg {
            Msg::Call(call) => self.push_call(call, cancel).await,
            other => {
                match &*self.inner.state.read().await {
                    State::Unsubscribed | State::Subscribing => return Err(Error::FirstMessageMustBeSubscribe),
                    State::Closed => return Err(Error::Closed),
                    State::Subscribed { .. } => {}
                }
                self.inject(other)
            }
        }
    }

    /// Place `msg` directly into the event buffer without a round trip
    /// through the HTTP path. Non-blocking: fails with [`Error::BufferFull`]
    /// rather than waiting for room.
    pub fn inject(&self, msg: impl Into<Msg>) -> Result<(), Error> {
        self.inner.tx.try_send(msg.into()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::BufferFull,
            mpsc::error::TrySendError::Closed(_) => Error::Closed,
        })
    }

    async fn push_call(&self, call: Call, cancel: Option<&CancellationToken>) -> Result<(), Error> {
        let is_subscribe = call.is_subscribe();

        if is_subscribe {
            return self.subscribe(call, cancel).await;
        }

        let stream_id = {
            let state = self.inner.state.read().await;
            match &*state {
                State::Unsubscribed | State::Subscribing => return Err(Error::FirstMessageMustBeSubscribe),
                State::Closed => return Err(Error::Closed),
                State::Subscribed { stream_id } => stream_id.clone(),
            }
        };

        let opts = [with_stream_id(stream_id)];
        self.call_with_cancel(cancel, self.inner.leader.send(&self.inner.call_codec, &call, Framing::Single, &opts))
            .await?;
        Ok(())
    }

    async fn subscribe(&self, call: Call, cancel: Option<&CancellationToken>) -> Result<(), Error> {
        {
            let mut state = self.inner.state.write().await;
            match &*state {
                State::Unsubscribed => *state = State::Subscribing,
                State::Subscribing | State::Subscribed { .. } => return Err(Error::AlreadySubscribing),
                State::Closed => return Err(Error::Closed),
            }
        }

        let opts = [with_close(true)];
        let result = self
            .call_with_cancel(
                cancel,
                self.inner.leader.send(&self.inner.call_codec, &call, Framing::RecordIo, &opts),
            )
            .await;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                self.fail();
                return Err(e);
            }
        };

        let Some(stream_id) = response.stream_id().filter(|s| !s.is_empty()).map(String::from) else {
            self.fail();
            return Err(Error::EmptyStreamId);
        };

        *self.inner.state.write().await = State::Subscribed {
            stream_id: stream_id.clone(),
        };
        debug!(stream_id, "subscribed");
        self.spawn_reader(response);
        Ok(())
    }

    fn fail(&self) {
        self.inner.cancel.cancel();
    }

    fn spawn_reader(&self, mut response: xsched_http::Response) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = inner.cancel.cancelled() => break,
                    outcome = response.read(&inner.event_codec) => {
                        match outcome {
                            Ok(Some(event)) => {
                                if inner.tx.send(Msg::Event(event)).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {
                                warn!("subscribe stream ended, closing session");
                                inner.cancel.cancel();
                                break;
                            }
                            Err(e) => {
                                warn!(error = %e, "subscribe stream decode failed, closing session");
                                inner.cancel.cancel();
                                break;
                            }
                        }
                    }
                }
            }
            *inner.state.write().await = State::Closed;
        });
    }

    /// Consume the next event from the buffer, waiting for one if none is
    /// pending. Already-buffered events are always drained first, even
    /// after cancellation.
    pub async fn pull(&self, cancel: Option<&CancellationToken>) -> Result<Msg, Error> {
        let mut rx = self.inner.rx.lock().await;

        if let Ok(msg) = rx.try_recv() {
            return Ok(msg);
        }

        tokio::select! {
            biased;
            msg = rx.recv() => msg.ok_or(Error::Closed),
            () = cancelled(cancel) => Err(Error::Cancelled),
            () = self.inner.cancel.cancelled() => Err(Error::Cancelled),
        }
    }

    /// Idempotent. Cancels the session context: the reader task exits,
    /// in-flight pushes observe cancellation, and buffered events remain
    /// drainable via [`Session::pull`] until the buffer empties.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    async fn call_with_cancel<T>(
        &self,
        cancel: Option<&CancellationToken>,
        fut: impl Future<Output = Result<T, xsched_leader::Error>> + Send,
    ) -> Result<T, Error> {
        tokio::select! {
            () = self.inner.cancel.cancelled() => Err(Error::Cancelled),
            () = cancelled(cancel) => Err(Error::Cancelled),
            result = fut => result.map_err(Error::from),
        }
    }
}

impl Flow for Session {
    type Message = Msg;

    async fn pull(&mut self) -> Result<Msg, xsched_service::Error> {
        Session::pull(self, None).await.map_err(Into::into)
    }

    async fn push(&mut self, msg: Msg) -> Result<(), xsched_service::Error> {
        Session::push(self, msg, None).await.map_err(Into::into)
    }

    fn close(&mut self) {
        Session::close(self)
    }
}

#[cfg(test)]
mod tests {
    use xsched_leader::LeaderClientBuilder;

    use super::*;

    fn session(event_buffer: usize) -> Session {
        let leader = LeaderClientBuilder::new(vec!["http://127.0.0.1:1/api/v1/scheduler".to_string()]).finish();
        SessionBuilder::new(leader).set_event_buffer(event_buffer).finish()
    }

    fn ping() -> Msg {
        Msg::Event(xsched_proto::Event {
            r#type: xsched_proto::gen::event::Type::Unknown as i32,
            subscribed: None,
            offers: None,
            update: None,
            error: None,
        })
    }

    #[test]
    fn inject_fails_once_the_buffer_is_full() {
        let session = session(1);
        session.inject(ping()).unwrap();
        assert!(matches!(session.inject(ping()), Err(Error::BufferFull)));
    }

    #[tokio::test]
    async fn non_call_message_before_subscribed_is_rejected() {
        let session = session(4);
        let result = session.push(ping(), None).await;
        assert!(matches!(result, Err(Error::FirstMessageMustBeSubscribe)));
    }

    #[tokio::test]
    async fn non_subscribe_call_before_subscribed_is_rejected() {
        let session = session(4);
        let result = session.push(Msg::Call(xsched_proto::revive()), None).await;
        assert!(matches!(result, Err(Error::FirstMessageMustBeSubscribe)));
    }

    #[tokio::test]
    async fn close_is_idempotent_and_drains_buffered_events_first() {
        let session = session(4);
        session.inject(ping()).unwrap();
        session.close();
        session.close();

        assert!(session.pull(None).await.is_ok());
        assert!(matches!(session.pull(None).await, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn push_after_close_is_rejected() {
        let session = session(4);
        session.close();
        let result = session.push(Msg::Call(xsched_proto::revive()), None).await;
        assert!(matches!(result, Err(Error::Closed)));
    }

    mod http_layer {
        use prost::Message;
        use wiremock::matchers::{header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};
        use xsched_leader::LeaderClientBuilder;

        use super::*;

        fn record_io_frame(bytes: &[u8]) -> Vec<u8> {
            let mut framed = format!("{}\n", bytes.len()).into_bytes();
            framed.extend_from_slice(bytes);
            framed
        }

        fn subscribed_event(stream_id_framework: &str) -> xsched_proto::Event {
            xsched_proto::Event {
                r#type: xsched_proto::gen::event::Type::Subscribed as i32,
                subscribed: Some(xsched_proto::Subscribed {
                    framework_id: xsched_proto::FrameworkID {
                        value: stream_id_framework.to_string(),
                    },
                    heartbeat_interval_seconds: None,
                }),
                offers: None,
                update: None,
                error: None,
            }
        }

        async fn session_against(server: &MockServer) -> Session {
            let endpoint = format!("{}/api/v1/scheduler", server.uri());
            let leader = LeaderClientBuilder::new(vec![endpoint]).finish();
            SessionBuilder::new(leader).finish()
        }

        #[tokio::test]
        async fn subscribe_extracts_the_stream_id_and_delivers_the_event() {
            let server = MockServer::start().await;
            let event = subscribed_event("f-1");
            let body = record_io_frame(&event.encode_to_vec());

            Mock::given(method("POST"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("Mesos-Stream-Id", "stream-xyz")
                        .insert_header("Content-Type", "application/x-protobuf")
                        .set_body_bytes(body),
                )
                .mount(&server)
                .await;

            let session = session_against(&server).await;
            let framework_info = xsched_proto::FrameworkInfo {
                id: None,
                user: "root".to_string(),
                name: "test".to_string(),
                failover_timeout: None,
                checkpoint: None,
                roles: Vec::new(),
            };

            session
                .push(Msg::Call(xsched_proto::subscribe(framework_info)), None)
                .await
                .unwrap();

            assert!(matches!(&*session.inner.state.read().await, State::Subscribed { stream_id } if stream_id == "stream-xyz"));

            let msg = session.pull(None).await.unwrap();
            assert!(matches!(msg, Msg::Event(e) if e.is_subscribed()));
        }

        #[tokio::test]
        async fn call_after_subscribed_carries_the_stream_id_header() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(header("mesos-stream-id", "stream-xyz"))
                .respond_with(ResponseTemplate::new(202))
                .mount(&server)
                .await;

            let session = session_against(&server).await;
            *session.inner.state.write().await = State::Subscribed {
                stream_id: "stream-xyz".to_string(),
            };

            let result = session.push(Msg::Call(xsched_proto::revive()), None).await;
            assert!(result.is_ok());
        }
    }
}
