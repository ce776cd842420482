// In-process transport serving canned responses.
//
// Used by tests and by `flame --fixture` to browse without a server. The
// default responses are the sample project data front-end work started from.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use flame_common::protocol::jsonrpc::METHOD_NOT_FOUND;
use flame_common::protocol::methods;
use serde_json::{json, Value};
use tracing::trace;

use super::{Transport, TransportError};

/// A call observed by the fixture, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Default)]
pub struct FixtureTransport {
    responses: Mutex<HashMap<String, Result<Value, TransportError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Option<Duration>,
}

impl FixtureTransport {
    /// A fixture with no responses. Every method is rejected as unknown
    /// until configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fixture preloaded with the sample project data.
    pub fn with_defaults() -> Self {
        Self::new()
            .respond(methods::USER_CHECK_LOGIN, json!(true))
            .respond(methods::PROJECT_GET_LIST, json!(["test1", "test2", "test3"]))
            .respond(
                methods::PROJECT_GET_DIRECTORY_CONTENTS,
                json!([{ "name": "next/" }, { "name": "pcakge.json" }, { "name": "README.md" }]),
            )
            .respond(
                methods::PROJECT_GET_FILE_CONTENTS,
                json!({ "binary": false, "data": "This is a test readme file." }),
            )
            .respond(
                methods::PROJECT_SEARCH,
                json!({
                    "matchRegexp": "[Tt]his is",
                    "items": [
                        { "path": "/test1/README.md", "matches": [
                            { "L": 1, "T": "This is a test readme file." }
                        ] }
                    ]
                }),
            )
    }

    pub fn respond(self, method: &str, result: Value) -> Self {
        self.set_response(method, result);
        self
    }

    pub fn fail(self, method: &str, error: TransportError) -> Self {
        self.set_failure(method, error);
        self
    }

    /// Delay every response. Pairs well with a paused tokio clock.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_response(&self, method: &str, result: Value) {
        lock(&self.responses).insert(method.to_string(), Ok(result));
    }

    pub fn set_failure(&self, method: &str, error: TransportError) {
        lock(&self.responses).insert(method.to_string(), Err(error));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        lock(&self.calls).iter().filter(|call| call.method == method).count()
    }

    fn lookup(&self, method: &str) -> Result<Value, TransportError> {
        lock(&self.responses).get(method).cloned().unwrap_or_else(|| {
            Err(TransportError::Rejected {
                code: METHOD_NOT_FOUND,
                message: format!("fixture has no response for `{method}`"),
            })
        })
    }
}

impl Transport for FixtureTransport {
    fn send(
        &self,
        method: &'static str,
        params: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        async move {
            trace!(method, %params, "fixture call");
            lock(&self.calls).push(RecordedCall { method: method.to_string(), params });
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            // Read the response after the delay so tests can swap it mid-flight.
            self.lookup(method)
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
