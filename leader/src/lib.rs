//! Leader-following wrapper over [`xsched_http::Client`].
//!
//! A Mesos master cluster exposes many candidate endpoints but only one
//! leader at a time; calling a non-leader returns `307` with the leader's
//! address in `Location`. [`LeaderClient`] tracks the last known-good
//! endpoint and, on failure, walks the redirect chain (bounded by
//! `max_redirects`) starting from each candidate in turn until one
//! accepts the call.
//!
//! Concurrent callers that all see the same stale endpoint would
//! otherwise all kick off a redundant rediscovery at once; the
//! `generation` counter coalesces them down to a single discovery, with
//! the rest re-checking the fast path once it completes (mirrors the
//! `sync.RWMutex` + sequence-number pattern this is modeled on).

mod error;

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, trace};
use xsched_codec::MessageCodec;
use xsched_http::{Client, ClientBuilder, Framing, RequestOpt, Response, TimeoutConfig};

pub use error::Error;

/// Builds an [`xsched_http::Client`] bound to a specific endpoint. Lets
/// callers inject client-wide [`RequestOpt`]s / [`TimeoutConfig`] without
/// `LeaderClient` needing to know about every `ClientBuilder` knob.
pub type ClientFactory = Arc<dyn Fn(&str) -> Result<Client, xsched_http::Error> + Send + Sync>;

struct LeaderState {
    endpoint: Option<String>,
    generation: u64,
}

/// A client that always sends to the current Mesos leader, rediscovering
/// it via redirect-following when the cached endpoint stops working.
pub struct LeaderClient {
    masters: Vec<String>,
    max_redirects: usize,
    client_factory: ClientFactory,
    state: RwLock<LeaderState>,
}

/// Builder for [`LeaderClient`].
pub struct LeaderClientBuilder {
    masters: Vec<String>,
    max_redirects: usize,
    client_factory: ClientFactory,
}

impl LeaderClientBuilder {
    /// # Panics
    /// When `masters` is empty.
    pub fn new(masters: Vec<String>) -> Self {
        assert!(!masters.is_empty(), "at least one candidate master endpoint is required");
        Self {
            masters,
            max_redirects: 5,
            client_factory: default_client_factory(TimeoutConfig::new(), Vec::new()),
        }
    }

    /// Maximum redirects followed per candidate endpoint before moving on
    /// to the next one. Default 5.
    pub fn set_max_redirects(mut self, n: usize) -> Self {
        self.max_redirects = n;
        self
    }

    /// Replace how an [`xsched_http::Client`] is built for a candidate
    /// endpoint. Use this to install client-wide timeouts or request
    /// options instead of [`LeaderClientBuilder::set_client_opts`].
    pub fn set_client_factory(mut self, factory: ClientFactory) -> Self {
        self.client_factory = factory;
        self
    }

    /// Convenience over [`LeaderClientBuilder::set_client_factory`]: every
    /// constructed client shares `timeout` and `request_opts`.
    pub fn set_client_opts(mut self, timeout: TimeoutConfig, request_opts: Vec<RequestOpt>) -> Self {
        self.client_factory = default_client_factory(timeout, request_opts);
        self
    }

    pub fn finish(self) -> LeaderClient {
        LeaderClient {
            masters: self.masters,
            max_redirects: self.max_redirects,
            client_factory: self.client_factory,
            state: RwLock::new(LeaderState {
                endpoint: None,
                generation: 0,
            }),
        }
    }
}

fn default_client_factory(timeout: TimeoutConfig, request_opts: Vec<RequestOpt>) -> ClientFactory {
    Arc::new(move |endpoint| {
        let mut builder = ClientBuilder::new(endpoint).set_timeout(timeout);
        for opt in &request_opts {
            builder = builder.with_request_opt(opt.clone());
        }
        builder.finish()
    })
}

impl LeaderClient {
    /// Send `msg` to the current leader, rediscovering it on failure.
    pub async fn send<M>(
        &self,
        codec: &impl MessageCodec<M>,
        msg: &M,
        framing: Framing,
        opts: &[RequestOpt],
    ) -> Result<Response, Error> {
        loop {
            let (endpoint, last_seq) = {
                let state = self.state.read().await;
                (state.endpoint.clone(), state.generation)
            };

            if let Some(endpoint) = endpoint {
                match self.try_send(&endpoint, codec, msg, framing, opts).await {
                    Ok(resp) => return Ok(resp),
                    Err(e) => debug!(%endpoint, error = %e, "call to cached leader failed, rediscovering"),
                }
            }

            let mut state = self.state.write().await;
            if state.generation > last_seq {
                // another caller already finished a rediscovery while we
                // were waiting for the lock; retry the fast path.
                continue;
            }

            match self.find_leader(codec, msg, framing, opts).await {
                Ok((resp, new_endpoint)) => {
                    trace!(endpoint = %new_endpoint, "leader found");
                    state.endpoint = Some(new_endpoint);
                    state.generation = last_seq + 1;
                    return Ok(resp);
                }
                Err(e) => {
                    state.endpoint = None;
                    return Err(e);
                }
            }
        }
    }

    async fn try_send<M>(
        &self,
        endpoint: &str,
        codec: &impl MessageCodec<M>,
        msg: &M,
        framing: Framing,
        opts: &[RequestOpt],
    ) -> Result<Response, xsched_http::Error> {
        let client = (self.client_factory)(endpoint)?;
        client.send(codec, msg, framing, opts).await
    }

    async fn find_leader<M>(
        &self,
        codec: &impl MessageCodec<M>,
        msg: &M,
        framing: Framing,
        opts: &[RequestOpt],
    ) -> Result<(Response, String), Error> {
        let mut last_error = None;

        for master in &self.masters {
            let mut endpoint = master.clone();

            for attempt in 0..self.max_redirects {
                match self.try_send(&endpoint, codec, msg, framing, opts).await {
                    Ok(resp) => return Ok((resp, endpoint)),
                    Err(xsched_http::Error::Redirect { leader_host_port }) => {
                        let to = redirect_endpoint(&endpoint, &leader_host_port)?;
                        debug!(from = %endpoint, to = %to, attempt, "following leader redirect");
                        endpoint = to;
                    }
                    Err(e) => {
                        debug!(%endpoint, error = %e, "candidate master rejected call");
                        last_error = Some(e);
                        break;
                    }
                }
            }
        }

        match last_error {
            Some(e) => Err(Error::NoAvailableLeader { last_error: Box::new(e) }),
            None => Err(Error::NoCandidatesTried),
        }
    }
}

/// Rewrite `endpoint`'s authority to `host_port`, keeping its scheme and
/// path (the redirect only ever changes which host:port is the leader).
fn redirect_endpoint(endpoint: &str, host_port: &str) -> Result<String, Error> {
    let (host, port) = host_port
        .rsplit_once(':')
        .ok_or_else(|| Error::InvalidRedirectTarget(host_port.to_string()))?;
    let port: u16 = port
        .parse()
        .map_err(|_| Error::InvalidRedirectTarget(host_port.to_string()))?;

    let mut url = url::Url::parse(endpoint).map_err(|_| Error::InvalidRedirectTarget(endpoint.to_string()))?;
    url.set_host(Some(host))
        .map_err(|_| Error::InvalidRedirectTarget(host_port.to_string()))?;
    url.set_port(Some(port))
        .map_err(|_| Error::InvalidRedirectTarget(host_port.to_string()))?;
    Ok(url.to_string())
}
