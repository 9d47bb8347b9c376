//! The single choke point for outbound calls to the backend.
//!
//! `ApiService` pairs an `ApiClient` with a `Transport` and exposes
//! `get`/`post`/`put`/`delete` returning the `ApiResult` envelope. Every
//! failure, including a transport that never got a response, comes back as
//! `Err`; nothing panics past this boundary. No retry, caching or timeout.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::{ApiClient, ApiResult};
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::{Transport, UreqTransport};
use crate::types::{CreatePostRequest, DeleteAck, HealthStatus, Post, UpdatePostRequest, User};

pub struct ApiService<X: Transport = UreqTransport> {
    client: ApiClient,
    transport: Arc<X>,
}

impl<X: Transport> Clone for ApiService<X> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<X: Transport> std::fmt::Debug for ApiService<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiService")
            .field("base_url", &self.client.base_url())
            .finish_non_exhaustive()
    }
}

impl ApiService<UreqTransport> {
    /// Service talking to `config.base_url` over a fresh ureq agent.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(ApiClient::new(&config.base_url), UreqTransport::new())
    }
}

impl<X: Transport> ApiService<X> {
    pub fn new(client: ApiClient, transport: X) -> Self {
        Self {
            client,
            transport: Arc::new(transport),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.client.build_get(path))
    }

    pub fn post<T, B>(&self, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Post, path, body)
    }

    pub fn put<T, B>(&self, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(HttpMethod::Put, path, body)
    }

    pub fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(self.client.build_delete(path))
    }

    /// Build and send a request for any supported method. `Delete` and `Get`
    /// never carry a body.
    pub fn request<T, B>(&self, method: HttpMethod, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let request = match method {
            HttpMethod::Get => self.client.build_get(path),
            HttpMethod::Delete => self.client.build_delete(path),
            HttpMethod::Post | HttpMethod::Put => self.client.build_request(method, path, body)?,
        };
        self.send(request)
    }

    /// Execute a prepared request and normalize the outcome.
    pub fn send<T: DeserializeOwned>(&self, request: HttpRequest) -> ApiResult<T> {
        let method = request.method;
        let url = request.url.clone();
        debug!(%method, %url, "sending request");

        let response = match self.transport.execute(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(%method, %url, error = %e, "request failed before a response arrived");
                return Err(ApiError::Network(e));
            }
        };

        let status = response.status;
        let result = self.client.parse_response(response);
        match &result {
            Ok(_) => debug!(%method, %url, status, "request succeeded"),
            Err(e) => warn!(%method, %url, status, error = %e, "request failed"),
        }
        result
    }

    pub fn list_posts(&self) -> ApiResult<Vec<Post>> {
        self.get("/posts")
    }

    pub fn get_post(&self, id: &str) -> ApiResult<Post> {
        self.get(&format!("/posts/{id}"))
    }

    pub fn create_post(&self, input: &CreatePostRequest) -> ApiResult<Post> {
        self.post("/posts", Some(input))
    }

    pub fn update_post(&self, id: &str, input: &UpdatePostRequest) -> ApiResult<Post> {
        self.put(&format!("/posts/{id}"), Some(input))
    }

    pub fn delete_post(&self, id: &str) -> ApiResult<DeleteAck> {
        self.delete(&format!("/posts/{id}"))
    }

    pub fn list_users(&self) -> ApiResult<Vec<User>> {
        self.get("/users")
    }

    pub fn health(&self) -> ApiResult<HealthStatus> {
        self.send(self.client.build_health())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::TransportError;
    use crate::http::HttpResponse;

    /// Records every request and answers with a fixed outcome.
    struct Fixed {
        outcome: Result<HttpResponse, TransportError>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Transport for Fixed {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            self.outcome.clone()
        }
    }

    fn service(outcome: Result<HttpResponse, TransportError>) -> (ApiService<Arc<Fixed>>, Arc<Fixed>) {
        let fixed = Arc::new(Fixed {
            outcome,
            seen: Mutex::new(Vec::new()),
        });
        let service = ApiService::new(
            ApiClient::new("http://backend.test/api"),
            Arc::clone(&fixed),
        );
        (service, fixed)
    }

    #[test]
    fn transport_failure_becomes_network_error() {
        let (service, _) = service(Err(TransportError("connection refused".to_string())));
        let err = service.list_posts().unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(err.message(), crate::error::NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn delete_ignores_body() {
        let (service, fixed) = service(Ok(HttpResponse::new(
            200,
            r#"{"success":true,"message":"Post deleted successfully"}"#,
        )));
        let ack: DeleteAck = service
            .request(HttpMethod::Delete, "/posts/1", Some(&serde_json::json!({"x": 1})))
            .unwrap();
        assert!(ack.success);
        let seen = fixed.seen.lock().unwrap();
        assert_eq!(seen[0].method, HttpMethod::Delete);
        assert_eq!(seen[0].url, "http://backend.test/api/posts/1");
        assert!(seen[0].body.is_none());
    }

    #[test]
    fn update_sends_only_present_fields() {
        let (service, fixed) = service(Ok(HttpResponse::new(500, "")));
        let input = UpdatePostRequest {
            title: Some("New".to_string()),
            content: None,
        };
        let err = service.update_post("abc", &input).unwrap_err();
        assert_eq!(err.message(), "Request failed with status 500");

        let seen = fixed.seen.lock().unwrap();
        assert_eq!(seen[0].method, HttpMethod::Put);
        let body: serde_json::Value = serde_json::from_str(seen[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"title": "New"}));
    }

    #[test]
    fn health_targets_server_root() {
        let (service, fixed) = service(Ok(HttpResponse::new(
            200,
            r#"{"status":"OK","message":"Mallu Backend is running!","timestamp":"2024-01-01T00:00:00Z"}"#,
        )));
        let health = service.health().unwrap();
        assert_eq!(health.status, "OK");
        assert_eq!(fixed.seen.lock().unwrap()[0].url, "http://backend.test/health");
    }
}
