//! HTTP request/response plumbing for a single, fixed scheduler endpoint.
//!
//! A [`Client`] knows nothing about leader discovery, retrying, or the
//! shape of Call/Event messages: it POSTs an encoded message and maps
//! the response status code to a typed [`Error`], exactly once per
//! [`Client::send`] call. Leader-following (component D) wraps this by
//! rebuilding a `Client` against a new endpoint on [`Error::Redirect`].

mod error;
mod framing;
mod request;
mod response;
mod timeout;

use reqwest::StatusCode;
use tracing::{debug, trace};
use xsched_codec::MessageCodec;

pub use error::Error;
pub use framing::Framing;
pub use request::{with_authorization, with_close, with_header, with_stream_id, RequestOpt};
pub use response::Response;
pub use timeout::TimeoutConfig;

use response::body_stream;

/// A client bound to one scheduler API endpoint (one master or agent).
pub struct Client {
    http: reqwest::Client,
    endpoint: String,
    request_opts: Vec<RequestOpt>,
    timeout: TimeoutConfig,
}

/// Builder for [`Client`]. Mirrors `DefaultClient`'s functional-option
/// construction: everything has a sane default, callers override only
/// what they need.
pub struct ClientBuilder {
    endpoint: String,
    request_opts: Vec<RequestOpt>,
    timeout: TimeoutConfig,
}

impl ClientBuilder {
    /// # Panics
    /// When `endpoint` is empty.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        assert!(!endpoint.is_empty(), "endpoint cannot be blank");
        Self {
            endpoint,
            request_opts: Vec::new(),
            timeout: TimeoutConfig::new(),
        }
    }

    /// Add a request option applied to every call this client makes.
    pub fn with_request_opt(mut self, opt: RequestOpt) -> Self {
        self.request_opts.push(opt);
        self
    }

    pub fn set_timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn finish(self) -> Result<Client, Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(self.timeout.connect_budget())
            .build()?;
        Ok(Client {
            http,
            endpoint: self.endpoint,
            request_opts: self.request_opts,
            timeout: self.timeout,
        })
    }
}

impl Client {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Encode `msg` with `codec`, POST it to this client's endpoint, and
    /// map the response status code into a [`Response`] or an [`Error`].
    ///
    /// `framing` picks how the *response* body is chunked into frames;
    /// callers pass [`Framing::RecordIo`] for a `SUBSCRIBE` call and
    /// [`Framing::Single`] for everything else.
    pub async fn send<M>(
        &self,
        codec: &impl MessageCodec<M>,
        msg: &M,
        framing: Framing,
        opts: &[RequestOpt],
    ) -> Result<Response, Error> {
        let body = codec.encode(msg)?;

        let mut req = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, codec.encoder_content_type())
            .header(reqwest::header::ACCEPT, codec.decoder_content_type())
            .body(body);
        req = request::apply(req, &self.request_opts, opts);

        let send = self.http.execute(req.build()?);
        let res = tokio::time::timeout(self.timeout.request_timeout, send)
            .await
            .map_err(|_| {
                debug!(endpoint = %self.endpoint, "scheduler call timed out waiting for response head");
                Error::Timeout("request")
            })??;

        trace!(status = %res.status(), endpoint = %self.endpoint, "scheduler call response");
        self.handle_response(res, codec.decoder_content_type(), framing).await
    }

    async fn handle_response(
        &self,
        res: reqwest::Response,
        expect_content_type: &str,
        framing: Framing,
    ) -> Result<Response, Error> {
        let status = res.status();

        if status == StatusCode::BAD_REQUEST {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Malformed(body));
        }
        if status == StatusCode::TEMPORARY_REDIRECT {
            return Err(redirect_err(&res));
        }
        if let Err(e) = map_status(status, res.headers()) {
            return Err(e);
        }

        let headers = res.headers().clone();

        if status == StatusCode::ACCEPTED {
            return Ok(Response::new(headers, None));
        }

        // StatusCode::OK: a body is present only if Content-Length says so;
        // chunked/unknown-length bodies (content_length() == None) are
        // assumed present, matching a `-1` content length in the Go client.
        let has_body = res.content_length() != Some(0);
        if !has_body {
            return Ok(Response::new(headers, None));
        }

        let ct = headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !ct.starts_with(expect_content_type) {
            return Err(Error::MediaType(ct.to_string()));
        }

        debug!(endpoint = %self.endpoint, ?framing, "decoding response body");
        Ok(Response::new(headers, Some((framing, body_stream(res)))))
    }
}

/// Maps a response's status code onto the scheduler API's error contract,
/// for the codes that carry no extra context beyond the code itself.
/// `Ok(())` for the two success codes (`200`, `202`).
fn map_status(status: StatusCode, headers: &reqwest::header::HeaderMap) -> Result<(), Error> {
    match status {
        StatusCode::OK | StatusCode::ACCEPTED => Ok(()),
        StatusCode::UNAUTHORIZED => Err(Error::Unauthenticated),
        StatusCode::FORBIDDEN => Err(Error::Unsubscribed),
        StatusCode::NOT_FOUND => Err(Error::NotFound),
        StatusCode::NOT_ACCEPTABLE => Err(Error::MediaType(
            headers
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string(),
        )),
        StatusCode::CONFLICT => Err(Error::Version),
        StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited),
        StatusCode::SERVICE_UNAVAILABLE => Err(Error::Unavailable),
        other => Err(Error::Protocol(other.as_u16())),
    }
}

fn redirect_err(res: &reqwest::Response) -> Error {
    let loc = res
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok());
    redirect_from_location(loc)
}

fn redirect_from_location(loc: Option<&str>) -> Error {
    let Some(loc) = loc else {
        return Error::InvalidRedirectLocation(String::new());
    };

    match reqwest::Url::parse(loc) {
        Ok(url) => match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => Error::Redirect {
                leader_host_port: format!("{host}:{port}"),
            },
            _ => Error::InvalidRedirectLocation(loc.to_string()),
        },
        Err(_) => Error::InvalidRedirectLocation(loc.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};

    #[test]
    fn redirect_location_parses_host_and_default_port() {
        let err = redirect_from_location(Some("http://10.0.0.2:5050/"));
        assert!(matches!(err, Error::Redirect { leader_host_port } if leader_host_port == "10.0.0.2:5050"));
    }

    #[test]
    fn redirect_location_falls_back_to_scheme_default_port() {
        let err = redirect_from_location(Some("https://master.example"));
        assert!(matches!(err, Error::Redirect { leader_host_port } if leader_host_port == "master.example:443"));
    }

    #[test]
    fn missing_redirect_location_is_invalid() {
        assert!(matches!(redirect_from_location(None), Error::InvalidRedirectLocation(_)));
    }

    #[test]
    fn known_status_codes_map_to_specific_errors() {
        let headers = HeaderMap::new();
        assert!(matches!(map_status(StatusCode::OK, &headers), Ok(())));
        assert!(matches!(map_status(StatusCode::ACCEPTED, &headers), Ok(())));
        assert!(matches!(map_status(StatusCode::UNAUTHORIZED, &headers), Err(Error::Unauthenticated)));
        assert!(matches!(map_status(StatusCode::FORBIDDEN, &headers), Err(Error::Unsubscribed)));
        assert!(matches!(map_status(StatusCode::CONFLICT, &headers), Err(Error::Version)));
        assert!(matches!(map_status(StatusCode::TOO_MANY_REQUESTS, &headers), Err(Error::RateLimited)));
        assert!(matches!(
            map_status(StatusCode::SERVICE_UNAVAILABLE, &headers),
            Err(Error::Unavailable)
        ));
        assert!(matches!(map_status(StatusCode::IM_A_TEAPOT, &headers), Err(Error::Protocol(418))));
    }

    #[test]
    fn not_acceptable_carries_the_rejected_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let err = map_status(StatusCode::NOT_ACCEPTABLE, &headers).unwrap_err();
        assert!(matches!(err, Error::MediaType(ct) if ct == "text/plain"));
    }
}
