use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use xsched_proto::Msg;
use xsched_service::{Error, Flow, Stage};

/// A scalar resource total keyed by name and role, accumulated across
/// every `Offers` event observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceUsage {
    pub name: String,
    pub role: String,
    pub total: f64,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub pushes: HashMap<&'static str, u64>,
    pub pulls: HashMap<&'static str, u64>,
    pub push_errors: u64,
    pub pull_errors: u64,
    pub declined_offers: u64,
    pub push_latency: Duration,
    pub pull_latency: Duration,
    resources: HashMap<(String, String), f64>,
}

impl Counters {
    /// Snapshot accumulated scalar resources, one entry per name/role pair.
    pub fn resource_usage(&self) -> Vec<ResourceUsage> {
        self.resources
            .iter()
            .map(|((name, role), total)| ResourceUsage {
                name: name.clone(),
                role: role.clone(),
                total: *total,
            })
            .collect()
    }
}

/// Cloneable read handle onto a [`MonitorFlow`]'s counters.
#[derive(Clone)]
pub struct MonitorHandle {
    counters: Arc<Mutex<Counters>>,
}

impl MonitorHandle {
    /// Run `f` against a consistent snapshot of the counters under the
    /// lock. Keep `f` short: the lock is never held across an `.await`.
    pub fn with_counters<R>(&self, f: impl FnOnce(&Counters) -> R) -> R {
        f(&self.counters.lock())
    }
}

pub struct MonitorStage;

impl MonitorStage {
    pub fn new() -> Self {
        Self
    }
}

impl<D: Flow<Message = Msg>> Stage<D> for MonitorStage {
    type Wired = MonitorFlow<D>;

    fn via(self, downstream: D) -> Self::Wired {
        MonitorFlow {
            downstream,
            counters: Arc::new(Mutex::new(Counters::default())),
        }
    }
}

pub struct MonitorFlow<D> {
    downstream: D,
    counters: Arc<Mutex<Counters>>,
}

impl<D> MonitorFlow<D> {
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            counters: self.counters.clone(),
        }
    }
}

impl<D: Flow<Message = Msg>> Flow for MonitorFlow<D> {
    type Message = Msg;

    async fn pull(&mut self) -> Result<Msg, Error> {
        let start = Instant::now();
        let result = self.downstream.pull().await;
        let elapsed = start.elapsed();

        let mut counters = self.counters.lock();
        counters.pull_latency += elapsed;
        match &result {
            Ok(msg) => {
                *counters.pulls.entry(msg.name()).or_insert(0) += 1;
                if let Msg::Event(event) = msg {
                    if event.is_offers() {
                        if let Some(offers) = &event.offers {
                            for offer in &offers.offers {
                                for resource in &offer.resources {
                                    if let Some(scalar) = &resource.scalar {
                                        let key = (resource.name.clone(), resource.role.clone().unwrap_or_default());
                                        *counters.resources.entry(key).or_insert(0.0) += scalar.value;
                                    }
                                }
                            }
                        }
                    }
                }
            }
            Err(_) => counters.pull_errors += 1,
        }
        drop(counters);

        result
    }

    async fn push(&mut self, msg: Msg) -> Result<(), Error> {
        let start = Instant::now();
        let is_decline = msg.as_call().map(|c| c.is_decline()).unwrap_or(false);
        let name = msg.name();
        let result = self.downstream.push(msg).await;
        let elapsed = start.elapsed();

        let mut counters = self.counters.lock();
        counters.push_latency += elapsed;
        *counters.pushes.entry(name).or_insert(0) += 1;
        if result.is_err() {
            counters.push_errors += 1;
        } else if is_decline {
            counters.declined_offers += 1;
        }

        result
    }

    fn close(&mut self) {
        self.downstream.close()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use xsched_proto::gen::event;
    use xsched_proto::{Event, Offer, Offers, OfferID, Resource, Scalar};

    use super::*;

    struct Fixed(VecDeque<Msg>);

    impl Flow for Fixed {
        type Message = Msg;

        async fn pull(&mut self) -> Result<Msg, Error> {
            self.0.pop_front().ok_or(Error::Closed)
        }

        async fn push(&mut self, _msg: Msg) -> Result<(), Error> {
            Ok(())
        }

        fn close(&mut self) {}
    }

    fn offers_event(value: f64) -> Msg {
        Msg::Event(Event {
            r#type: event::Type::Offers as i32,
            subscribed: None,
            offers: Some(Offers {
                offers: vec![Offer {
                    id: OfferID { value: "o1".into() },
                    framework_id: xsched_proto::FrameworkID { value: "f1".into() },
                    agent_id: xsched_proto::AgentID { value: "a1".into() },
                    hostname: "host".into(),
                    resources: vec![Resource {
                        name: "cpus".into(),
                        role: Some("*".into()),
                        scalar: Some(Scalar { value }),
                    }],
                }],
            }),
            update: None,
            error: None,
        })
    }

    #[tokio::test]
    async fn counts_pulls_and_accumulates_resources() {
        let mut flow = MonitorStage::new().via(Fixed(VecDeque::from([offers_event(4.0)])));
        let handle = flow.handle();
        flow.pull().await.unwrap();

        handle.with_counters(|c| {
            assert_eq!(*c.pulls.get("OFFERS").unwrap(), 1);
            let usage = c.resource_usage();
            assert_eq!(usage.len(), 1);
            assert_eq!(usage[0].total, 4.0);
        });
    }

    #[tokio::test]
    async fn counts_declined_offers() {
        let mut flow = MonitorStage::new().via(Fixed(VecDeque::new()));
        let handle = flow.handle();
        flow.push(Msg::Call(xsched_proto::decline(vec![]))).await.unwrap();
        handle.with_counters(|c| assert_eq!(c.declined_offers, 1));
    }
}
