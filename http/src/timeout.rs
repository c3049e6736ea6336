use std::time::Duration;

/// Timeouts applied to a single call. Mirrors the granularity of the
/// underlying dialer/transport: separate budgets for resolving the
/// address, establishing the connection, completing a TLS handshake, and
/// the two request-lifecycle phases (sending the request and receiving the
/// response body).
///
/// `resolve_timeout` and `tls_connect_timeout` fold into the transport's
/// single `connect_timeout` knob (the underlying HTTP client does not
/// expose resolve and TLS handshake budgets independently); they're kept
/// as distinct fields for parity with the wire client this is modeled on,
/// and so a caller can reason about them independently even though they
/// can't be enforced independently.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Default to 5 seconds.
    pub resolve_timeout: Duration,
    /// Default to 5 seconds.
    pub connect_timeout: Duration,
    /// Default to 5 seconds.
    pub tls_connect_timeout: Duration,
    /// Timeout for the request to reach the server and the response head
    /// to return. Default to 5 seconds.
    pub request_timeout: Duration,
    /// Timeout for collecting/streaming the response body. Default to 5
    /// seconds.
    pub response_timeout: Duration,
}

impl TimeoutConfig {
    pub const fn new() -> Self {
        Self {
            resolve_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            tls_connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(5),
        }
    }

    pub fn set_resolve_timeout(mut self, dur: Duration) -> Self {
        self.resolve_timeout = dur;
        self
    }

    pub fn set_connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = dur;
        self
    }

    pub fn set_tls_connect_timeout(mut self, dur: Duration) -> Self {
        self.tls_connect_timeout = dur;
        self
    }

    pub fn set_request_timeout(mut self, dur: Duration) -> Self {
        self.request_timeout = dur;
        self
    }

    pub fn set_response_timeout(mut self, dur: Duration) -> Self {
        self.response_timeout = dur;
        self
    }

    pub(crate) fn connect_budget(&self) -> Duration {
        self.connect_timeout.max(self.tls_connect_timeout)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self::new()
    }
}
