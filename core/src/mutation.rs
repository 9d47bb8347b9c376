//! Write hook: create, update or delete through the API while tracking
//! `{data, loading, error}`.
//!
//! `mutate` both records the outcome in the hook's state and returns it, so a
//! caller can skip dependent work (refreshing a list, say) when it failed.
//! Nothing is retried.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::client::ApiResult;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::service::ApiService;
use crate::state::{RequestState, StateCell};
use crate::transport::{Transport, UreqTransport};

/// The verbs a mutation may use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationMethod {
    #[default]
    Post,
    Put,
    Delete,
}

impl From<MutationMethod> for HttpMethod {
    fn from(method: MutationMethod) -> Self {
        match method {
            MutationMethod::Post => HttpMethod::Post,
            MutationMethod::Put => HttpMethod::Put,
            MutationMethod::Delete => HttpMethod::Delete,
        }
    }
}

impl TryFrom<HttpMethod> for MutationMethod {
    type Error = ApiError;

    fn try_from(method: HttpMethod) -> Result<Self, Self::Error> {
        match method {
            HttpMethod::Post => Ok(MutationMethod::Post),
            HttpMethod::Put => Ok(MutationMethod::Put),
            HttpMethod::Delete => Ok(MutationMethod::Delete),
            HttpMethod::Get => Err(ApiError::UnsupportedMethod(method.to_string())),
        }
    }
}

impl FromStr for MutationMethod {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<HttpMethod>()?.try_into()
    }
}

impl fmt::Display for MutationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(HttpMethod::from(*self).as_str())
    }
}

pub struct UseApiMutation<T, X: Transport = UreqTransport> {
    service: ApiService<X>,
    cell: Arc<StateCell<T>>,
    tasks: Mutex<Vec<AbortHandle>>,
}

impl<T, X> UseApiMutation<T, X>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
    X: Transport,
{
    pub fn new(service: ApiService<X>) -> Self {
        Self {
            service,
            cell: Arc::new(StateCell::new()),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Send `data` to `endpoint` with `method`. `Delete` ignores `data`.
    ///
    /// On success the payload is stored and returned; on failure the message
    /// is stored and the error returned. A body that fails to serialize is
    /// reported the same way without reaching the network.
    ///
    /// The request runs on its own task, so dropping the returned future does
    /// not leave the hook loading: the outcome is still written when it lands.
    pub async fn mutate<D>(
        &self,
        endpoint: &str,
        data: Option<&D>,
        method: MutationMethod,
    ) -> ApiResult<T>
    where
        D: Serialize + ?Sized,
    {
        let Some(seq) = self.cell.begin() else {
            return Err(ApiError::TaskFailed("mutation hook disposed".to_string()));
        };

        let request = match method {
            MutationMethod::Delete => Ok(self.service.client().build_delete(endpoint)),
            MutationMethod::Post | MutationMethod::Put => {
                self.service.client().build_request(method.into(), endpoint, data)
            }
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => {
                self.cell.settle(seq, Err(e.message()));
                return Err(e);
            }
        };

        let service = self.service.clone();
        let cell = Arc::clone(&self.cell);
        let endpoint = endpoint.to_string();
        let handle = tokio::spawn(async move {
            let result = match tokio::task::spawn_blocking(move || service.send::<T>(request)).await {
                Ok(result) => result,
                Err(e) => Err(ApiError::TaskFailed(e.to_string())),
            };
            let outcome = match &result {
                Ok(data) => Ok(data.clone()),
                Err(e) => Err(e.message()),
            };
            if !cell.settle(seq, outcome) {
                debug!(seq, %method, %endpoint, "discarding stale mutation outcome");
            }
            result
        });
        self.track(handle.abort_handle());

        match handle.await {
            Ok(result) => result,
            Err(e) => Err(ApiError::TaskFailed(e.to_string())),
        }
    }

    /// Like `mutate`, but takes the verb as a string. Anything other than
    /// POST, PUT or DELETE is rejected here, before a future exists, so the
    /// state is never touched and no request is built.
    pub fn mutate_with<'a, D>(
        &'a self,
        endpoint: &'a str,
        data: Option<&'a D>,
        method: &str,
    ) -> Result<impl Future<Output = ApiResult<T>> + 'a, ApiError>
    where
        D: Serialize + ?Sized,
    {
        let method = method.parse::<MutationMethod>()?;
        Ok(self.mutate(endpoint, data, method))
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.cell.subscribe()
    }

    pub fn state(&self) -> RequestState<T> {
        self.cell.snapshot()
    }

    fn track(&self, handle: AbortHandle) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

impl<T, X: Transport> Drop for UseApiMutation<T, X> {
    fn drop(&mut self) {
        self.cell.dispose();
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}
