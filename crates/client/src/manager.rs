// Request manager: dispatch, per-class concurrency policy, timeouts.
//
// `invoke` never blocks. It registers the caller in the in-flight table and,
// when a network call is needed, spawns a task that drives the transport and
// fans the single result out to every waiter still attached to its entry.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::TimeoutConfig;
use crate::fault::Fault;
use crate::inflight::{Delivery, InFlightTable};
use crate::operation::{InFlightKey, Operation, Policy};
use crate::payload::Payload;
use crate::transport::Transport;

/// Shared handle; clones dispatch through the same in-flight table.
pub struct RequestManager<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    transport: T,
    timeouts: TimeoutConfig,
    table: Mutex<InFlightTable>,
}

impl<T> Clone for RequestManager<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<T: Transport> RequestManager<T> {
    pub fn new(transport: T) -> Self {
        Self::with_timeouts(transport, TimeoutConfig::default())
    }

    pub fn with_timeouts(transport: T, timeouts: TimeoutConfig) -> Self {
        Self {
            inner: Arc::new(Inner { transport, timeouts, table: Mutex::new(InFlightTable::new()) }),
        }
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.inner.timeouts
    }

    /// Issue `operation` and return a handle to its eventual result.
    ///
    /// Must be called from within a tokio runtime.
    pub fn invoke(&self, operation: Operation) -> Pending {
        let operation = match operation.normalize() {
            Ok(operation) => operation,
            Err(fault) => {
                debug!(%fault, "rejected operation before dispatch");
                return Pending::ready(Err(fault));
            }
        };

        let key = operation.key();
        let (waiter, receiver) = oneshot::channel();
        let mut table = self.inner.lock_table();

        let waiter = match operation.policy() {
            Policy::Coalesce => match table.join(&key, waiter) {
                Ok(generation) => {
                    debug!(%key, generation, waiters = table.waiter_count(&key), "joined pending request");
                    return Pending::waiting(receiver);
                }
                Err(waiter) => waiter,
            },
            Policy::CancelPrevious => waiter,
        };

        let (generation, evicted) = table.replace(key.clone(), waiter);
        if let Some(evicted) = evicted {
            let notified = evicted.cancel();
            debug!(%key, generation, notified, "superseded pending request");
        }

        debug!(%key, generation, "issuing request");
        let task = tokio::spawn(drive(Arc::clone(&self.inner), operation, key.clone(), generation));
        table.attach_task(&key, generation, task.abort_handle());

        Pending::waiting(receiver)
    }

    /// Number of keys with an outstanding request.
    pub fn in_flight(&self) -> usize {
        self.inner.lock_table().len()
    }

    pub fn is_in_flight(&self, operation: &Operation) -> bool {
        match operation.clone().normalize() {
            Ok(operation) => self.inner.lock_table().contains(&operation.key()),
            Err(_) => false,
        }
    }

    /// Cancel every outstanding request; all waiters receive `Cancelled`.
    pub fn cancel_all(&self) -> usize {
        let evicted = self.inner.lock_table().drain();
        let keys = evicted.len();
        let notified: usize = evicted.into_iter().map(|entry| entry.cancel()).sum();
        debug!(keys, notified, "cancelled all pending requests");
        keys
    }
}

impl<T> Inner<T> {
    fn lock_table(&self) -> MutexGuard<'_, InFlightTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn drive<T: Transport>(
    inner: Arc<Inner<T>>,
    operation: Operation,
    key: InFlightKey,
    generation: u64,
) {
    let mut unfinished =
        UnfinishedGuard { inner: Arc::clone(&inner), key: key.clone(), generation, armed: true };
    let kind = operation.kind();
    let call = inner.transport.send(kind.method(), operation.params());

    let outcome = match inner.timeouts.timeout_for(kind) {
        Some(deadline) => match tokio::time::timeout(deadline, call).await {
            Ok(outcome) => outcome.map_err(Fault::from),
            Err(_) => Err(Fault::timeout(deadline)),
        },
        None => call.await.map_err(Fault::from),
    };
    let delivery: Delivery = outcome.and_then(|raw| Payload::decode(kind, raw));

    if let Err(fault) = &delivery {
        warn!(%key, %fault, "request failed");
    }

    unfinished.armed = false;
    let Some(waiters) = inner.lock_table().complete(&key, generation) else {
        debug!(%key, generation, "discarding stale result");
        return;
    };

    debug!(%key, generation, waiters = waiters.len(), ok = delivery.is_ok(), "request completed");
    for waiter in waiters {
        // A dropped handle just means the caller stopped listening.
        let _ = waiter.send(delivery.clone());
    }
}

/// Fails the entry owned by a `drive` task that stopped before delivering,
/// e.g. because the transport panicked. Aborted tasks have already lost
/// their entry, so completing by generation is a no-op for them.
struct UnfinishedGuard<T> {
    inner: Arc<Inner<T>>,
    key: InFlightKey,
    generation: u64,
    armed: bool,
}

impl<T> Drop for UnfinishedGuard<T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(waiters) = self.inner.lock_table().complete(&self.key, self.generation) else {
            return;
        };
        warn!(key = %self.key, generation = self.generation, "request task ended without a result");
        let fault = Fault::unavailable("request task ended without a result");
        for waiter in waiters {
            let _ = waiter.send(Err(fault.clone()));
        }
    }
}

/// Handle to a result that is delivered asynchronously.
///
/// Resolves to `Cancelled` if the request was superseded or cancelled.
#[must_use = "a pending request does nothing unless awaited"]
pub struct Pending<T = Payload> {
    state: PendingState,
    extract: fn(Payload) -> Result<T, Fault>,
}

enum PendingState {
    Ready(Option<Delivery>),
    Waiting(oneshot::Receiver<Delivery>),
}

impl Pending<Payload> {
    pub(crate) fn ready(delivery: Delivery) -> Self {
        Self { state: PendingState::Ready(Some(delivery)), extract: Ok }
    }

    pub(crate) fn waiting(receiver: oneshot::Receiver<Delivery>) -> Self {
        Self { state: PendingState::Waiting(receiver), extract: Ok }
    }

    /// Narrow the payload to a concrete type.
    pub fn typed<U>(self, extract: fn(Payload) -> Result<U, Fault>) -> Pending<U> {
        Pending { state: self.state, extract }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, Fault>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let delivery = match &mut this.state {
            PendingState::Ready(delivery) => {
                delivery.take().unwrap_or_else(|| Err(Fault::cancelled()))
            }
            PendingState::Waiting(receiver) => match Pin::new(receiver).poll(cx) {
                Poll::Ready(delivery) => delivery.unwrap_or_else(|_| Err(Fault::cancelled())),
                Poll::Pending => return Poll::Pending,
            },
        };
        Poll::Ready(delivery.and_then(this.extract))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;
    use crate::transport::fixture::FixtureTransport;
    use crate::transport::TransportError;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn manager() -> RequestManager<FixtureTransport> {
        RequestManager::new(FixtureTransport::with_defaults())
    }

    #[tokio::test]
    async fn invoke_delivers_decoded_payload() {
        let manager = manager();
        let payload = manager.invoke(Operation::ListProjects).await.unwrap();
        assert_eq!(payload, Payload::Projects(vec!["test1".into(), "test2".into(), "test3".into()]));
        assert_eq!(manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn invalid_operation_never_reaches_transport() {
        let manager = manager();
        let fault = manager.invoke(Operation::search("", 10)).await.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::InvalidRequest);
        assert!(manager.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn coalesced_calls_share_one_transport_call() {
        let manager = manager();
        let first = manager.invoke(Operation::read_file("proj", "README.md"));
        let second = manager.invoke(Operation::read_file("proj", "/README.md"));
        assert_eq!(manager.in_flight(), 1);

        let (a, b) = tokio::join!(first, second);
        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(manager.transport().call_count("project.getFileContents"), 1);
    }

    #[tokio::test]
    async fn superseded_query_resolves_cancelled() {
        let manager = manager();
        let stale = manager.invoke(Operation::search("readme", 10));
        let fresh = manager.invoke(Operation::search("readme", 10));

        assert!(stale.await.unwrap_err().is_cancelled());
        assert!(matches!(fresh.await.unwrap(), Payload::Search(_)));
        assert_eq!(manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_unavailable_fault() {
        let manager = RequestManager::new(
            FixtureTransport::new()
                .fail("user.checkLogin", TransportError::Unavailable("connection refused".into())),
        );
        let fault = manager.invoke(Operation::CheckLogin).await.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::Unavailable);
        assert_eq!(manager.in_flight(), 0);
    }

    #[tokio::test]
    async fn malformed_payload_is_protocol_fault() {
        let manager =
            RequestManager::new(FixtureTransport::new().respond("project.getList", json!("oops")));
        let fault = manager.invoke(Operation::ListProjects).await.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::Protocol);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_is_timeout_and_clears_entry() {
        let manager = RequestManager::with_timeouts(
            FixtureTransport::with_defaults().with_latency(Duration::from_secs(30)),
            TimeoutConfig::uniform(1_000),
        );
        let pending = manager.invoke(Operation::CheckLogin);
        assert!(manager.is_in_flight(&Operation::CheckLogin));

        let fault = pending.await.unwrap_err();
        assert_eq!(fault.kind(), FaultKind::Timeout);
        assert!(!manager.is_in_flight(&Operation::CheckLogin));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_resolves_every_waiter() {
        let manager = RequestManager::new(
            FixtureTransport::with_defaults().with_latency(Duration::from_secs(5)),
        );
        let read_a = manager.invoke(Operation::read_file("proj", "a.md"));
        let read_b = manager.invoke(Operation::read_file("proj", "a.md"));
        let listing = manager.invoke(Operation::list_directory("proj", "/"));

        assert_eq!(manager.cancel_all(), 2);
        assert_eq!(manager.in_flight(), 0);
        for fault in [read_a.await, read_b.await, listing.await].into_iter().map(Result::unwrap_err) {
            assert!(fault.is_cancelled());
        }
    }

    #[derive(Default)]
    struct PanicsOnFirstSend {
        fired: AtomicBool,
    }

    impl Transport for PanicsOnFirstSend {
        fn send(
            &self,
            _method: &'static str,
            _params: Value,
        ) -> impl Future<Output = Result<Value, TransportError>> + Send {
            let first = !self.fired.swap(true, Ordering::SeqCst);
            async move {
                if first {
                    panic!("transport failed mid-call");
                }
                Ok(json!(true))
            }
        }
    }

    #[tokio::test]
    async fn panicking_transport_fails_waiters_and_clears_entry() {
        let manager = RequestManager::new(PanicsOnFirstSend::default());
        let first = manager.invoke(Operation::CheckLogin);
        let joined = manager.invoke(Operation::CheckLogin);

        let (first, joined) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(first, joined)
        })
        .await
        .expect("waiters must not hang after a panic");
        assert_eq!(first.unwrap_err().kind(), FaultKind::Unavailable);
        assert_eq!(joined.unwrap_err().kind(), FaultKind::Unavailable);
        assert_eq!(manager.in_flight(), 0);

        let retry = manager.invoke(Operation::CheckLogin).await.unwrap();
        assert_eq!(retry, Payload::LoggedIn(true));
    }

    #[tokio::test]
    async fn typed_pending_extracts_payload() {
        let manager = manager();
        let logged_in = manager.invoke(Operation::CheckLogin).typed(Payload::into_logged_in).await;
        assert_eq!(logged_in, Ok(true));
    }
}
