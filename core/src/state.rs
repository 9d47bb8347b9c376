//! Observable request state shared by the read and write hooks.
//!
//! # Design
//! A hook's state lives in a `StateCell`: a `watch` channel plus a request
//! sequence counter and a disposed flag. Issuing a request, settling one and
//! disposing the hook all happen under the channel's write lock, so:
//!
//! - only the most recently issued request may write settled state; a slower
//!   older response is discarded instead of overwriting a newer one;
//! - once disposed, no request can touch the state again.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;

/// Where a hook is in its request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Nothing issued yet.
    Idle,
    /// A request is in flight; `data`/`error` are stale.
    Loading,
    Success,
    Error,
}

/// What a UI renders: the latest data, whether a request is in flight, and
/// the latest error message.
///
/// Once settled exactly one of `data`/`error` is set. Both are `None` only
/// before the first request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> RequestState<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }

    pub fn status(&self) -> RequestStatus {
        if self.loading {
            RequestStatus::Loading
        } else if self.error.is_some() {
            RequestStatus::Error
        } else if self.data.is_some() {
            RequestStatus::Success
        } else {
            RequestStatus::Idle
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.status(), RequestStatus::Success | RequestStatus::Error)
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

pub(crate) struct StateCell<T> {
    tx: watch::Sender<RequestState<T>>,
    issued: AtomicU64,
    disposed: AtomicBool,
}

impl<T> StateCell<T> {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(RequestState::idle());
        Self {
            tx,
            issued: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    /// Issue a new request: mark the state loading and hand out its sequence
    /// number. `None` once disposed.
    pub(crate) fn begin(&self) -> Option<u64> {
        let mut seq = None;
        self.tx.send_if_modified(|state| {
            if self.disposed.load(Ordering::Acquire) {
                return false;
            }
            seq = Some(self.issued.fetch_add(1, Ordering::AcqRel) + 1);
            state.loading = true;
            state.error = None;
            true
        });
        seq
    }

    /// Write the outcome of request `seq`. Returns false (and leaves the
    /// state untouched) when a newer request has been issued since, or the
    /// cell is disposed.
    pub(crate) fn settle(&self, seq: u64, outcome: Result<T, String>) -> bool {
        self.tx.send_if_modified(move |state| {
            if self.disposed.load(Ordering::Acquire) || self.issued.load(Ordering::Acquire) != seq {
                return false;
            }
            *state = match outcome {
                Ok(data) => RequestState {
                    data: Some(data),
                    loading: false,
                    error: None,
                },
                Err(message) => RequestState {
                    data: None,
                    loading: false,
                    error: Some(message),
                },
            };
            true
        })
    }

    pub(crate) fn dispose(&self) {
        self.tx.send_if_modified(|_| {
            self.disposed.store(true, Ordering::Release);
            false
        });
    }

    #[cfg(test)]
    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.tx.subscribe()
    }
}

impl<T: Clone> StateCell<T> {
    pub(crate) fn snapshot(&self) -> RequestState<T> {
        self.tx.borrow().clone()
    }
}
