//! Read hook: fetch an endpoint and keep `{data, loading, error}` for a UI.
//!
//! # Design
//! `UseApi` owns a `StateCell` and spawns each fetch as a Tokio task that
//! runs the blocking `ApiService::get` on the blocking pool. Overlapping
//! fetches are allowed; the cell's sequence numbers make the latest-issued
//! one win. Dropping the hook disposes the cell and aborts outstanding tasks,
//! so nothing writes state after its owner is gone.
//!
//! Hooks must be created and driven from within a Tokio runtime.

use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::service::ApiService;
use crate::state::{RequestState, StateCell};
use crate::transport::{Transport, UreqTransport};

/// Handle to one issued fetch.
///
/// Dropping it does not cancel the fetch; `settled` waits until the fetch has
/// either written state or been discarded as stale.
#[derive(Debug)]
pub struct Fetch(Option<JoinHandle<()>>);

impl Fetch {
    pub async fn settled(self) {
        let Some(handle) = self.0 else {
            return;
        };
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                warn!(error = %e, "fetch task failed");
            }
        }
    }
}

pub struct UseApi<T, X: Transport = UreqTransport> {
    service: ApiService<X>,
    endpoint: String,
    immediate: bool,
    cell: Arc<StateCell<T>>,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl<T, X> UseApi<T, X>
where
    T: DeserializeOwned + Send + Sync + 'static,
    X: Transport,
{
    /// Create the hook. With `immediate` set the first fetch is issued right
    /// away; otherwise nothing touches the network until `refetch`.
    pub fn new(service: ApiService<X>, endpoint: impl Into<String>, immediate: bool) -> Self {
        let hook = Self {
            service,
            endpoint: endpoint.into(),
            immediate,
            cell: Arc::new(StateCell::new()),
            tasks: Mutex::new(Vec::new()),
        };
        if immediate {
            hook.refetch();
        }
        hook
    }

    /// Shorthand for `new(service, endpoint, true)`.
    pub fn immediate(service: ApiService<X>, endpoint: impl Into<String>) -> Self {
        Self::new(service, endpoint, true)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_immediate(&self) -> bool {
        self.immediate
    }

    /// Point the hook at another endpoint. Fetches again when the endpoint
    /// actually changed and the hook is immediate.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        if endpoint == self.endpoint {
            return;
        }
        self.endpoint = endpoint;
        if self.immediate {
            self.refetch();
        }
    }

    /// Toggle auto-fetching. Switching it on fetches once.
    pub fn set_immediate(&mut self, immediate: bool) {
        if immediate == self.immediate {
            return;
        }
        self.immediate = immediate;
        if immediate {
            self.refetch();
        }
    }

    /// Issue a fetch of the current endpoint regardless of state.
    pub fn refetch(&self) -> Fetch {
        let Some(seq) = self.cell.begin() else {
            return Fetch(None);
        };
        let service = self.service.clone();
        let endpoint = self.endpoint.clone();
        let cell = Arc::clone(&self.cell);

        let handle = tokio::spawn(async move {
            let path = endpoint.clone();
            let outcome = match tokio::task::spawn_blocking(move || service.get::<T>(&path)).await {
                Ok(result) => result,
                Err(e) => Err(ApiError::TaskFailed(e.to_string())),
            };
            if !cell.settle(seq, outcome.map_err(|e| e.message())) {
                debug!(seq, %endpoint, "discarding stale response");
            }
        });
        self.track(handle.abort_handle());
        Fetch(Some(handle))
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.cell.subscribe()
    }

    fn track(&self, handle: AbortHandle) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

impl<T: Clone, X: Transport> UseApi<T, X> {
    pub fn state(&self) -> RequestState<T> {
        self.cell.snapshot()
    }
}

impl<T, X: Transport> Drop for UseApi<T, X> {
    fn drop(&mut self) {
        self.cell.dispose();
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}
