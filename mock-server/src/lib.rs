pub mod config;
pub mod repository;

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::repository::{InMemoryRepository, NewPost, PostChanges, PostRepository, RepositoryError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields are optional so a missing one is answered with the API's own 400
/// rather than a deserialization rejection.
#[derive(Deserialize)]
pub struct CreatePost {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteAck {
    pub success: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A failed request, rendered as `{success: false, message, error?}`.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    message: String,
    error: Option<String>,
}

impl ApiFailure {
    fn new(status: StatusCode, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            error: None,
        }
    }

    fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Post not found")
    }

    fn storage(message: &str, err: RepositoryError) -> Self {
        tracing::error!(error = %err, "{}", message);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            error: Some(err.to_string()),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PostRepository>,
    pub list_delay: Duration,
}

impl AppState {
    pub fn new(repo: Arc<dyn PostRepository>, list_delay: Duration) -> Self {
        Self { repo, list_delay }
    }
}

/// Seeded in-memory app with no artificial latency.
pub fn app() -> Router {
    router(AppState::new(Arc::new(InMemoryRepository::seeded()), Duration::ZERO))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post).put(update_post).delete(delete_post))
        .route("/users", get(list_users));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve a seeded store with the latency from `config`.
pub async fn run_with(listener: TcpListener, config: &ServerConfig) -> Result<(), std::io::Error> {
    let state = AppState::new(Arc::new(InMemoryRepository::seeded()), config.list_delay);
    axum::serve(listener, router(state)).await
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "OK".to_string(),
        message: "Mallu Backend is running!".to_string(),
        timestamp: Utc::now(),
    })
}

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, ApiFailure> {
    if !state.list_delay.is_zero() {
        tokio::time::sleep(state.list_delay).await;
    }
    let posts = state
        .repo
        .list()
        .await
        .map_err(|e| ApiFailure::storage("Failed to fetch posts", e))?;
    Ok(Json(posts))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiFailure> {
    state
        .repo
        .get(&id)
        .await
        .map_err(|e| ApiFailure::storage("Failed to fetch post", e))?
        .map(Json)
        .ok_or_else(ApiFailure::not_found)
}

async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePost>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), ApiFailure> {
    let required = || ApiFailure::new(StatusCode::BAD_REQUEST, "Title and content are required");
    let Json(input) = payload.map_err(|_| required())?;
    let (Some(title), Some(content)) = (non_empty(input.title), non_empty(input.content)) else {
        return Err(required());
    };

    let post = state
        .repo
        .create(NewPost { title, content })
        .await
        .map_err(|e| ApiFailure::storage("Failed to create post", e))?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePost>, JsonRejection>,
) -> Result<Json<Post>, ApiFailure> {
    let Json(input) =
        payload.map_err(|_| ApiFailure::new(StatusCode::BAD_REQUEST, "Invalid request body"))?;
    let changes = PostChanges {
        title: non_empty(input.title),
        content: non_empty(input.content),
    };
    state
        .repo
        .update(&id, changes)
        .await
        .map_err(|e| ApiFailure::storage("Failed to update post", e))?
        .map(Json)
        .ok_or_else(ApiFailure::not_found)
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, ApiFailure> {
    let removed = state
        .repo
        .delete(&id)
        .await
        .map_err(|e| ApiFailure::storage("Failed to delete post", e))?;
    if !removed {
        return Err(ApiFailure::not_found());
    }
    Ok(Json(DeleteAck {
        success: true,
        message: "Post deleted successfully".to_string(),
    }))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiFailure> {
    let users = state
        .repo
        .list_users()
        .await
        .map_err(|e| ApiFailure::storage("Failed to fetch users", e))?;
    Ok(Json(users))
}

async fn route_not_found() -> ApiFailure {
    ApiFailure::new(StatusCode::NOT_FOUND, "Route not found")
}

/// Empty strings count as absent, matching how the API treats blank fields.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
