use std::ops::ControlFlow;

use tracing::{debug, warn};
use xsched_backoff::Backoff;
use xsched_proto::{Call, Msg};
use xsched_service::{Blueprint, Flow, MatOpts};

use crate::Error;

/// Re-materializes a [`Blueprint`] on every reconnect attempt, feeding
/// every pulled message to `on_event` until it asks to stop, the flow
/// errors, or the backoff schedule is exhausted.
pub struct RetryDriver<B> {
    blueprint: B,
    backoff: Backoff,
    opts: MatOpts,
}

impl<B: Blueprint> RetryDriver<B>
where
    B::Flow: Flow<Message = Msg>,
{
    pub fn new(blueprint: B, backoff: Backoff) -> Self {
        Self {
            blueprint,
            backoff,
            opts: MatOpts::new(),
        }
    }

    pub fn set_mat_opts(mut self, opts: MatOpts) -> Self {
        self.opts = opts;
        self
    }

    /// Run the subscribe/pull loop until `on_event` returns
    /// `ControlFlow::Break` or the backoff schedule is exhausted.
    ///
    /// `on_event` reacts to a pulled message by returning the calls to push
    /// back (e.g. `ACCEPT`/`DECLINE` for an `OFFERS` event), or
    /// `ControlFlow::Break` to stop the driver entirely.
    pub async fn run<F>(&mut self, subscribe: Call, mut on_event: F) -> Result<(), Error>
    where
        F: FnMut(Msg) -> ControlFlow<(), Vec<Call>>,
    {
        loop {
            let Some(attempt) = self.backoff.next().await else {
                return Err(Error::RetriesExhausted);
            };
            debug!(attempt, "materializing flow");

            let mut flow = self.blueprint.materialize(&self.opts);

            if let Err(e) = flow.push(Msg::Call(subscribe.clone())).await {
                warn!(error = %e, "subscribe push failed, retrying");
                flow.close();
                continue;
            }

            let outcome = self.drain(&mut flow, &mut on_event).await;
            flow.close();

            match outcome {
                ControlFlow::Break(()) => return Ok(()),
                ControlFlow::Continue(()) => continue,
            }
        }
    }

    async fn drain<F>(&mut self, flow: &mut B::Flow, on_event: &mut F) -> ControlFlow<()>
    where
        F: FnMut(Msg) -> ControlFlow<(), Vec<Call>>,
    {
        loop {
            match flow.pull().await {
                Ok(msg) => {
                    if let Msg::Event(event) = &msg {
                        if event.is_subscribed() {
                            self.backoff.reset();
                            debug!("subscribed, resetting backoff");
                        }
                    }
                    let calls = match on_event(msg) {
                        ControlFlow::Break(()) => return ControlFlow::Break(()),
                        ControlFlow::Continue(calls) => calls,
                    };
                    for call in calls {
                        if let Err(e) = flow.push(Msg::Call(call)).await {
                            warn!(error = %e, "reaction push failed, reconnecting");
                            return ControlFlow::Continue(());
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "pull failed, reconnecting");
                    return ControlFlow::Continue(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use xsched_backoff::BackoffConfig;
    use xsched_service::{fn_blueprint, Error as ServiceError};

    use super::*;

    struct OneShot {
        events: Vec<Msg>,
        idx: usize,
    }

    impl Flow for OneShot {
        type Message = Msg;

        async fn pull(&mut self) -> Result<Msg, ServiceError> {
            if self.idx < self.events.len() {
                let msg = self.events[self.idx].clone();
                self.idx += 1;
                Ok(msg)
            } else {
                Err(ServiceError::Closed)
            }
        }

        async fn push(&mut self, _msg: Msg) -> Result<(), ServiceError> {
            Ok(())
        }

        fn close(&mut self) {}
    }

    fn subscribed_event() -> Msg {
        use xsched_proto::gen::event;
        Msg::Event(xsched_proto::Event {
            r#type: event::Type::Subscribed as i32,
            subscribed: Some(xsched_proto::Subscribed {
                framework_id: xsched_proto::FrameworkID { value: "f1".into() },
                heartbeat_interval_seconds: None,
            }),
            offers: None,
            update: None,
            error: None,
        })
    }

    #[tokio::test]
    async fn stops_after_on_event_breaks() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = seen.clone();
        let blueprint = fn_blueprint(move |_opts: &MatOpts| OneShot {
            events: vec![subscribed_event()],
            idx: 0,
        });
        let mut driver = RetryDriver::new(blueprint, BackoffConfig::new().build());

        driver
            .run(xsched_proto::revive(), move |_msg| {
                seen2.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Break(())
            })
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
