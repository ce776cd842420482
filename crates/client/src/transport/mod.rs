// Transport abstraction: how a method call reaches the service.
//
// A transport only moves one JSON-RPC call and hands back the raw `result`
// value. Concurrency policy, timeouts, and payload decoding stay in the
// request manager, so tests can swap in fixtures without touching it.

pub mod fixture;
pub mod http;
#[cfg(unix)]
pub mod socket;

use std::future::Future;
use std::sync::atomic::{AtomicI64, Ordering};

use flame_common::protocol::jsonrpc::{Outcome, Request, RequestId, Response};
use serde_json::Value;
use thiserror::Error;

use crate::config::Endpoint;

pub use fixture::FixtureTransport;
pub use http::HttpTransport;
#[cfg(unix)]
pub use socket::SocketTransport;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("service rejected request ({code}): {message}")]
    Rejected { code: i32, message: String },
}

/// Capability to send one call to the service and return its raw result.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        method: &'static str,
        params: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Monotonic JSON-RPC request ids, one sequence per transport.
#[derive(Debug)]
pub(crate) struct RequestIds(AtomicI64);

impl Default for RequestIds {
    fn default() -> Self {
        Self(AtomicI64::new(1))
    }
}

impl RequestIds {
    pub(crate) fn next_request(&self, method: &str, params: Value) -> Request {
        let id = self.0.fetch_add(1, Ordering::SeqCst);
        Request::new(method, Some(params), RequestId::Number(id))
    }
}

/// Decode a JSON-RPC response body into the raw result value.
pub(crate) fn decode_response(body: &[u8]) -> Result<Value, TransportError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(TransportError::Protocol("empty json-rpc response".into()));
    }

    let response: Response = serde_json::from_slice(body)
        .map_err(|error| TransportError::Protocol(format!("invalid json-rpc response: {error}")))?;

    match response.into_outcome() {
        Outcome::Result(value) => Ok(value),
        Outcome::Error(error) => {
            Err(TransportError::Rejected { code: error.code, message: error.message })
        }
        Outcome::Empty => {
            Err(TransportError::Protocol("json-rpc response missing `result` field".into()))
        }
    }
}

/// Transport selected from configuration at runtime.
#[derive(Debug)]
pub enum EndpointTransport {
    Http(HttpTransport),
    #[cfg(unix)]
    Socket(SocketTransport),
    Fixture(FixtureTransport),
}

impl EndpointTransport {
    pub fn connect(endpoint: &Endpoint) -> Result<Self, TransportError> {
        match endpoint {
            Endpoint::Http(url) => HttpTransport::new(url.clone()).map(Self::Http),
            #[cfg(unix)]
            Endpoint::Socket(path) => Ok(Self::Socket(SocketTransport::new(path.clone()))),
            #[cfg(not(unix))]
            Endpoint::Socket(path) => Err(TransportError::Unavailable(format!(
                "unix socket `{}` is not supported on this platform",
                path.display()
            ))),
            Endpoint::Fixture => Ok(Self::Fixture(FixtureTransport::with_defaults())),
        }
    }
}

impl Transport for EndpointTransport {
    fn send(
        &self,
        method: &'static str,
        params: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        async move {
            match self {
                Self::Http(transport) => transport.send(method, params).await,
                #[cfg(unix)]
                Self::Socket(transport) => transport.send(method, params).await,
                Self::Fixture(transport) => transport.send(method, params).await,
            }
        }
    }
}
