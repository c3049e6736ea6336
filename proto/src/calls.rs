//! Call builders, `CallOpt` modifiers, and `Event`/`Call` predicates.
//!
//! These mirror `original_source/scheduler/calls.go`: small free functions
//! instead of a builder type per call, since every Mesos call is a flat
//! `oneof`-shaped message with at most a handful of fields.

use std::sync::Arc;

use crate::gen::{call, event, offer_operation, task_status};
use crate::{AgentID, Call, Event, ExecutorInfo, Filters, FrameworkID, FrameworkInfo, KillPolicy, OfferID, Ping};

/// A modifier applied to an outbound [`Call`] (see component K, "CallOpt
/// stage", in the design). Stored and re-applied to every call pushed
/// through a flow, so it must be `Fn`, not `FnOnce`.
pub type CallOpt = Arc<dyn Fn(&mut Call) + Send + Sync>;

/// Set `Filters.refuse_seconds` on an `Accept` or `Decline` call.
pub fn filters(refuse_seconds: f64) -> CallOpt {
    Arc::new(move |c: &mut Call| {
        let filters = Some(Filters { refuse_seconds: Some(refuse_seconds) });
        match c.r#type() {
            call::Type::Accept => {
                if let Some(a) = c.accept.as_mut() {
                    a.filters = filters;
                }
            }
            call::Type::Decline => {
                if let Some(d) = c.decline.as_mut() {
                    d.filters = filters;
                }
            }
            _ => {}
        }
    })
}

/// Set a grace period on a `Kill` call.
pub fn kill_policy(grace_period_seconds: f64) -> CallOpt {
    Arc::new(move |c: &mut Call| {
        if c.r#type() == call::Type::Kill {
            if let Some(k) = c.kill.as_mut() {
                k.kill_policy = Some(KillPolicy {
                    grace_period_seconds: Some(grace_period_seconds),
                });
            }
        }
    })
}

/// Stamp a specific framework id onto every call it's applied to.
pub fn framework_id(id: FrameworkID) -> CallOpt {
    Arc::new(move |c: &mut Call| c.framework_id = Some(id.clone()))
}

/// Apply a list of [`CallOpt`]s to a freshly built call.
pub fn apply_opts(mut call: Call, opts: &[CallOpt]) -> Call {
    for opt in opts {
        opt(&mut call);
    }
    call
}

pub fn subscribe(info: FrameworkInfo) -> Call {
    Call {
        r#type: call::Type::Subscribe as i32,
        framework_id: info.id.clone(),
        subscribe: Some(call::Subscribe { framework_info: info }),
        ..Default::default()
    }
}

pub fn accept(offer_ids: Vec<OfferID>, operations: Vec<crate::OfferOperation>) -> Call {
    Call {
        r#type: call::Type::Accept as i32,
        accept: Some(call::Accept {
            offer_ids,
            operations,
            filters: None,
        }),
        ..Default::default()
    }
}

pub fn decline(offer_ids: Vec<OfferID>) -> Call {
    Call {
        r#type: call::Type::Decline as i32,
        decline: Some(call::Decline { offer_ids, filters: None }),
        ..Default::default()
    }
}

pub fn acknowledge(agent_id: AgentID, task_id: crate::TaskID, uuid: Vec<u8>) -> Call {
    Call {
        r#type: call::Type::Acknowledge as i32,
        acknowledge: Some(call::Acknowledge {
            agent_id,
            task_id,
            uuid: uuid.into(),
        }),
        ..Default::default()
    }
}

pub fn kill(task_id: crate::TaskID, agent_id: Option<AgentID>) -> Call {
    Call {
        r#type: call::Type::Kill as i32,
        kill: Some(call::Kill {
            task_id,
            agent_id,
            kill_policy: None,
        }),
        ..Default::default()
    }
}

pub fn revive() -> Call {
    Call {
        r#type: call::Type::Revive as i32,
        ..Default::default()
    }
}

pub fn teardown() -> Call {
    Call {
        r#type: call::Type::Teardown as i32,
        ..Default::default()
    }
}

/// Build a `LaunchGroup` accept operation stamping the given executor.
pub fn launch_group(executor: ExecutorInfo) -> crate::OfferOperation {
    crate::OfferOperation {
        r#type: offer_operation::Type::LaunchGroup as i32,
        launch_group: Some(offer_operation::LaunchGroup { executor }),
    }
}

impl Call {
    pub fn type_name(&self) -> &'static str {
        match self.r#type() {
            call::Type::Unknown => "UNKNOWN",
            call::Type::Subscribe => "SUBSCRIBE",
            call::Type::Teardown => "TEARDOWN",
            call::Type::Accept => "ACCEPT",
            call::Type::Decline => "DECLINE",
            call::Type::Revive => "REVIVE",
            call::Type::Kill => "KILL",
            call::Type::Acknowledge => "ACKNOWLEDGE",
        }
    }

    pub fn is_subscribe(&self) -> bool {
        self.r#type() == call::Type::Subscribe
    }

    pub fn is_decline(&self) -> bool {
        self.r#type() == call::Type::Decline
    }

    pub fn is_accept(&self) -> bool {
        self.r#type() == call::Type::Accept
    }
}

impl Event {
    pub fn type_name(&self) -> &'static str {
        match self.r#type() {
            event::Type::Unknown => "UNKNOWN",
            event::Type::Subscribed => "SUBSCRIBED",
            event::Type::Offers => "OFFERS",
            event::Type::Update => "UPDATE",
            event::Type::Heartbeat => "HEARTBEAT",
            event::Type::Error => "ERROR",
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.r#type() == event::Type::Subscribed
    }

    pub fn is_update(&self) -> bool {
        self.r#type() == event::Type::Update
    }

    pub fn is_offers(&self) -> bool {
        self.r#type() == event::Type::Offers
    }
}

impl crate::TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state(),
            task_status::State::TaskFinished
                | task_status::State::TaskFailed
                | task_status::State::TaskKilled
                | task_status::State::TaskLost
        )
    }
}

impl Ping {
    pub fn new(note: impl Into<String>) -> Self {
        Self { note: Some(note.into()) }
    }
}
