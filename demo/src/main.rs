//! A worked example scheduler: subscribes, declines every offer it's
//! given, acknowledges updates implicitly, and reconnects with backoff
//! if the connection drops.

use std::ops::ControlFlow;

use tracing::info;
use xsched_backoff::BackoffConfig;
use xsched_client::{FrameworkIdStage, HeartbeatStage, ImplicitAckStage, MonitorStage, RetryDriver, SessionBuilder};
use xsched_leader::LeaderClientBuilder;
use xsched_proto::{Call, FrameworkInfo, Msg};
use xsched_service::{fn_blueprint, MatOpts, Stage};

fn masters_from_env() -> Vec<String> {
    std::env::var("XSCHED_MASTERS")
        .unwrap_or_else(|_| "http://127.0.0.1:5050/api/v1/scheduler".to_string())
        .split(',')
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let masters = masters_from_env();

    let blueprint = fn_blueprint(move |_opts: &MatOpts| {
        let leader = LeaderClientBuilder::new(masters.clone()).finish();
        let session = SessionBuilder::new(leader).finish();
        let flow = MonitorStage::new().via(session);
        let flow = FrameworkIdStage::new().via(flow);
        let flow = ImplicitAckStage::new().via(flow);
        HeartbeatStage::new().via(flow)
    });

    let framework_info = FrameworkInfo {
        id: None,
        user: "root".to_string(),
        name: "xsched-demo-scheduler".to_string(),
        failover_timeout: Some(120.0),
        checkpoint: Some(true),
        roles: vec!["*".to_string()],
    };
    let subscribe = xsched_proto::subscribe(framework_info);

    let mut driver = RetryDriver::new(blueprint, BackoffConfig::new().forever().build());

    driver.run(subscribe, on_event).await?;
    Ok(())
}

/// Decline every offer, log every update, ignore everything else.
fn on_event(msg: Msg) -> ControlFlow<(), Vec<Call>> {
    match msg {
        Msg::Event(event) if event.is_offers() => {
            let ids = event
                .offers
                .as_ref()
                .map(|offers| offers.offers.iter().map(|o| o.id.clone()).collect())
                .unwrap_or_default();
            info!(count = ids.len(), "declining offers");
            ControlFlow::Continue(vec![xsched_proto::decline(ids)])
        }
        Msg::Event(event) if event.is_update() => {
            if let Some(update) = &event.update {
                info!(task = %update.status.task_id.value, state = ?update.status.state(), "task update");
            }
            ControlFlow::Continue(Vec::new())
        }
        _ => ControlFlow::Continue(Vec::new()),
    }
}
