//! Pipeline stages wired around a [`crate::Session`] with
//! [`xsched_service::Stage::via`]: heartbeat deadlines, implicit
//! acknowledgement, framework-id stamping, monitoring, and call option
//! application.

mod call_opt;
mod framework_id;
mod heartbeat;
mod implicit_ack;
mod monitor;

pub use call_opt::{CallOptFlow, CallOptStage};
pub use framework_id::{FrameworkIdFlow, FrameworkIdStage};
pub use heartbeat::{HeartbeatFlow, HeartbeatStage};
pub use implicit_ack::{ImplicitAckFlow, ImplicitAckStage};
pub use monitor::{Counters, MonitorFlow, MonitorHandle, MonitorStage, ResourceUsage};
