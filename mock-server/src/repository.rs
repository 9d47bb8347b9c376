//! Storage port for posts and users, plus the in-memory adapter the demo
//! server runs on.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Post, User};

/// Id of the seeded user every new post is attributed to.
pub const SYSTEM_USER_ID: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Fields of a post to create; validated by the caller.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

/// Changes to apply to a post. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, newest first.
    async fn list(&self) -> Result<Vec<Post>, RepositoryError>;

    async fn get(&self, id: &str) -> Result<Option<Post>, RepositoryError>;

    async fn create(&self, post: NewPost) -> Result<Post, RepositoryError>;

    /// `Ok(None)` when no post has `id`.
    async fn update(&self, id: &str, changes: PostChanges) -> Result<Option<Post>, RepositoryError>;

    /// `Ok(false)` when no post has `id`.
    async fn delete(&self, id: &str) -> Result<bool, RepositoryError>;

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
}

/// Process-local store. Posts are kept newest first.
#[derive(Debug)]
pub struct InMemoryRepository {
    posts: RwLock<Vec<Post>>,
    users: Vec<User>,
}

impl InMemoryRepository {
    /// The system user and a welcome post.
    pub fn seeded() -> Self {
        let system = system_user();
        let now = Utc::now();
        let welcome = Post {
            id: Uuid::new_v4().to_string(),
            title: "Welcome to Mallu Backend".to_string(),
            content: "This is your first post! Your app is successfully connected to the backend."
                .to_string(),
            author_id: system.id.clone(),
            author: Some(system.clone()),
            created_at: now,
            updated_at: now,
        };
        Self {
            posts: RwLock::new(vec![welcome]),
            users: vec![system],
        }
    }

    /// The system user and no posts.
    pub fn empty() -> Self {
        Self {
            posts: RwLock::new(Vec::new()),
            users: vec![system_user()],
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::seeded()
    }
}

fn system_user() -> User {
    User {
        id: SYSTEM_USER_ID.to_string(),
        name: "System".to_string(),
        email: "system@mallu.app".to_string(),
        avatar: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn list(&self) -> Result<Vec<Post>, RepositoryError> {
        Ok(self.posts.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<Post>, RepositoryError> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, post: NewPost) -> Result<Post, RepositoryError> {
        let now = Utc::now();
        let created = Post {
            id: Uuid::new_v4().to_string(),
            title: post.title,
            content: post.content,
            author_id: SYSTEM_USER_ID.to_string(),
            author: self.users.iter().find(|u| u.id == SYSTEM_USER_ID).cloned(),
            created_at: now,
            updated_at: now,
        };
        self.posts.write().await.insert(0, created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, changes: PostChanges) -> Result<Option<Post>, RepositoryError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() != before)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.users.clone())
    }
}
