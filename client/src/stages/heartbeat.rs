use std::time::Duration;

use xsched_proto::Msg;
use xsched_service::{Error, Flow, Stage};

/// Derives a pull deadline from the first `Subscribed` event's
/// `heartbeat_interval_seconds` and enforces it on every subsequent pull.
pub struct HeartbeatStage {
    max_missed: u32,
    deadline: Option<Duration>,
}

impl HeartbeatStage {
    pub fn new() -> Self {
        Self {
            max_missed: 1,
            deadline: None,
        }
    }

    /// How many heartbeats may be missed before a pull times out. Default 1.
    pub fn set_max_missed(mut self, max_missed: u32) -> Self {
        self.max_missed = max_missed;
        self
    }

    /// Pin the deadline up front instead of deriving it from the subscribe
    /// response. Once set, the derived value is never applied.
    pub fn set_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl<D: Flow<Message = Msg>> Stage<D> for HeartbeatStage {
    type Wired = HeartbeatFlow<D>;

    fn via(self, downstream: D) -> Self::Wired {
        HeartbeatFlow {
            downstream,
            max_missed: self.max_missed,
            deadline: self.deadline,
        }
    }
}

pub struct HeartbeatFlow<D> {
    downstream: D,
    max_missed: u32,
    deadline: Option<Duration>,
}

impl<D: Flow<Message = Msg>> Flow for HeartbeatFlow<D> {
    type Message = Msg;

    async fn pull(&mut self) -> Result<Msg, Error> {
        let msg = match self.deadline {
            Some(d) => tokio::time::timeout(d, self.downstream.pull())
                .await
                .map_err(|_| Error::DeadlineExceeded)??,
            None => self.downstream.pull().await?,
        };

        if self.deadline.is_none() {
            if let Msg::Event(event) = &msg {
                if event.is_subscribed() {
                    if let Some(interval) = event.subscribed.as_ref().and_then(|s| s.heartbeat_interval_seconds) {
                        let secs = interval * (self.max_missed as f64 + 1.0);
                        self.deadline = Some(Duration::from_secs_f64(secs));
                    }
                }
            }
        }

        Ok(msg)
    }

    async fn push(&mut self, msg: Msg) -> Result<(), Error> {
        self.downstream.push(msg).await
    }

    fn close(&mut self) {
        self.downstream.close()
    }
}
