use xsched_proto::{apply_opts, CallOpt, Msg};
use xsched_service::{Error, Flow, Stage};

/// Applies a fixed list of [`CallOpt`]s to every outbound call, passing
/// everything else through unchanged.
pub struct CallOptStage {
    opts: Vec<CallOpt>,
}

impl CallOptStage {
    pub fn new(opts: Vec<CallOpt>) -> Self {
        Self { opts }
    }
}

impl<D: Flow<Message = Msg>> Stage<D> for CallOptStage {
    type Wired = CallOptFlow<D>;

    fn via(self, downstream: D) -> Self::Wired {
        CallOptFlow {
            downstream,
            opts: self.opts,
        }
    }
}

pub struct CallOptFlow<D> {
    downstream: D,
    opts: Vec<CallOpt>,
}

impl<D: Flow<Message = Msg>> Flow for CallOptFlow<D> {
    type Message = Msg;

    async fn pull(&mut self) -> Result<Msg, Error> {
        self.downstream.pull().await
    }

    async fn push(&mut self, msg: Msg) -> Result<(), Error> {
        let msg = match msg {
            Msg::Call(call) => Msg::Call(apply_opts(call, &self.opts)),
            other => other,
        };
        self.downstream.push(msg).await
    }

    fn close(&mut self) {
        self.downstream.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recording {
        pushed: Vec<Msg>,
    }

    impl Flow for Recording {
        type Message = Msg;

        async fn pull(&mut self) -> Result<Msg, Error> {
            Err(Error::Closed)
        }

        async fn push(&mut self, msg: Msg) -> Result<(), Error> {
            self.pushed.push(msg);
            Ok(())
        }

        fn close(&mut self) {}
    }

    #[tokio::test]
    async fn applies_every_opt_to_outbound_calls() {
        let downstream = Recording { pushed: Vec::new() };
        let opts = vec![xsched_proto::framework_id(xsched_proto::FrameworkID { value: "f1".into() })];
        let mut flow = CallOptStage::new(opts).via(downstream);
        flow.push(Msg::Call(xsched_proto::revive())).await.unwrap();

        let call = flow.downstream.pushed[0].as_call().unwrap();
        assert_eq!(call.framework_id.as_ref().unwrap().value, "f1");
    }
}
