//! Scheduler session and flow stages built on [`xsched_service::Flow`]:
//! the subscribe/pull/push session itself (component F), the heartbeat,
//! implicit-ack, framework-id, monitor and call-opt stages (H-K), and a
//! blueprint-driven retry driver (L) that re-subscribes after a dropped
//! connection.

mod error;
mod retry;
mod session;
mod stages;

pub use error::Error;
pub use retry::RetryDriver;
pub use session::{Session, SessionBuilder, DEFAULT_EVENT_BUFFER};
pub use stages::{
    CallOptFlow, CallOptStage, Counters, FrameworkIdFlow, FrameworkIdStage, HeartbeatFlow, HeartbeatStage,
    ImplicitAckFlow, ImplicitAckStage, MonitorFlow, MonitorHandle, MonitorStage, ResourceUsage,
};
