use std::sync::Arc;

use reqwest::RequestBuilder;

pub const MESOS_STREAM_ID_HEADER: &str = "Mesos-Stream-Id";

/// A modifier applied to an outbound request, built and owned before the
/// request's body or URL are known. Stored per-client (applied to every
/// call) or passed per-call, in that order.
pub type RequestOpt = Arc<dyn Fn(RequestBuilder) -> RequestBuilder + Send + Sync>;

/// Apply every header option in order, client-wide then per-call.
pub(crate) fn apply(mut req: RequestBuilder, client_opts: &[RequestOpt], call_opts: &[RequestOpt]) -> RequestBuilder {
    for opt in client_opts.iter().chain(call_opts.iter()) {
        req = opt(req);
    }
    req
}

/// Add a header to the request.
pub fn with_header(key: &'static str, value: impl Into<String>) -> RequestOpt {
    let value = value.into();
    Arc::new(move |req| req.header(key, value.clone()))
}

/// Stamp the `Mesos-Stream-Id` header a subscribe response handed back.
pub fn with_stream_id(id: impl Into<String>) -> RequestOpt {
    with_header(MESOS_STREAM_ID_HEADER, id)
}

/// Set the `Authorization` header.
pub fn with_authorization(auth: impl Into<String>) -> RequestOpt {
    with_header("Authorization", auth)
}

/// Close the underlying connection after this request completes.
pub fn with_close(close: bool) -> RequestOpt {
    Arc::new(move |req| if close { req.header("Connection", "close") } else { req })
}
