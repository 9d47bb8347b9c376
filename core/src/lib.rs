//! API client core for the Mallu backend.
//!
//! # Overview
//! Two layers a UI builds on:
//! - an HTTP client wrapper that turns every call into an `ApiResult`
//!   envelope, never panicking past its boundary;
//! - two hooks holding `{data, loading, error}` request state: `UseApi` for
//!   reads (auto-fetch plus `refetch`) and `UseApiMutation` for writes.
//!
//! # Design
//! - `ApiClient` is stateless and does no I/O: `build_request` produces an
//!   `HttpRequest`, `parse_response` consumes an `HttpResponse`.
//! - A `Transport` executes the round-trip; `UreqTransport` is the default.
//! - `ApiService` composes the two and is what the hooks call.
//! - Hook state is sequence-numbered: the latest-issued request wins and a
//!   dropped hook never sees another state write.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod mutation;
pub mod query;
pub mod service;
pub mod state;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ApiResult};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mutation::{MutationMethod, UseApiMutation};
pub use query::{Fetch, UseApi};
pub use service::ApiService;
pub use state::{RequestState, RequestStatus};
pub use transport::{Transport, UreqTransport};
pub use types::{
    CreatePostRequest, DeleteAck, ErrorBody, HealthStatus, Post, UpdatePostRequest, User,
};
