// Repository pattern - every storage side effect goes through these traits
pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::db::models::*;

pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Criteria for the filtered feed. Every field is bound as a query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub category: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Option<UserId>,
    pub liked_by: Option<UserId>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `StoreError::Conflict` when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> Result<UserId, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Stores the user's country settings. With `rewrite_posts` the author's
    /// posts take the new donation country in the same transaction, so either
    /// both land or neither does. Returns the number of posts rewritten.
    async fn save_country_preferences(
        &self,
        id: UserId,
        country: &str,
        show_donations_in_country_only: bool,
        rewrite_posts: bool,
    ) -> Result<u64, StoreError>;

    /// Missing consent row reads as "not given".
    async fn has_cookie_consent(&self, id: UserId) -> Result<bool, StoreError>;

    async fn save_cookie_consent(&self, id: UserId, given: bool) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_session_user(&self, token: &str) -> Result<Option<UserId>, StoreError>;

    /// Replaces any token the user already had.
    async fn upsert_session(&self, user_id: UserId, token: &str) -> Result<(), StoreError>;

    /// Deleting an unknown token is not an error.
    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ReactionRepository: Send + Sync {
    async fn find_reaction(
        &self,
        subject: Subject,
        user_id: UserId,
    ) -> Result<Option<ReactionKind>, StoreError>;

    async fn insert_reaction(
        &self,
        subject: Subject,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<(), StoreError>;

    async fn update_reaction(
        &self,
        subject: Subject,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<(), StoreError>;

    async fn count_reactions(&self, subject: Subject) -> Result<ReactionCounts, StoreError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: &NewPost) -> Result<PostId, StoreError>;

    async fn find_post(&self, id: PostId) -> Result<Option<Post>, StoreError>;

    async fn update_post(&self, id: PostId, edit: &PostEdit) -> Result<(), StoreError>;

    /// Removes the post, its comments, and every reaction on either.
    async fn delete_post(&self, id: PostId) -> Result<(), StoreError>;

    /// Newest first.
    async fn filter_posts(&self, filter: &PostFilter) -> Result<Vec<Post>, StoreError>;

    async fn top_liked_posts(&self, limit: u32) -> Result<Vec<Post>, StoreError>;

    async fn search_posts(&self, query: &str) -> Result<Vec<Post>, StoreError>;

    async fn posts_reacted_by(
        &self,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<Vec<Post>, StoreError>;

    async fn categories(&self) -> Result<Vec<String>, StoreError>;

    /// Rewrites the donation country on every post by `user_id`. Returns rows touched.
    async fn update_donation_country_for_author(
        &self,
        user_id: UserId,
        country: &str,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        content: &str,
    ) -> Result<CommentId, StoreError>;

    async fn find_comment(&self, id: CommentId) -> Result<Option<Comment>, StoreError>;

    /// Oldest first.
    async fn comments_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError>;

    /// Newest first.
    async fn comments_by_user(&self, user_id: UserId) -> Result<Vec<Comment>, StoreError>;

    async fn delete_comment(&self, id: CommentId) -> Result<(), StoreError>;
}
