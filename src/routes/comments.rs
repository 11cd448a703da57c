use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::repository::{CommentRepository, PostRepository};
use crate::routes::parse_id;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/comments", post(add_comment))
        .route("/comments/{id}/delete", post(delete_comment))
}

async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Redirect> {
    let post_id = parse_id(&id, "post")?;
    let content = form.content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Comment cannot be empty".to_string()));
    }
    if state.store.find_post(post_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let comment_id = state.store.create_comment(post_id, user.id, content).await?;
    tracing::debug!("User {} commented {} on post {}", user.id, comment_id, post_id);

    Ok(Redirect::to(&format!("/posts/{post_id}")))
}

async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let comment_id = parse_id(&id, "comment")?;
    let comment = state
        .store
        .find_comment(comment_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if comment.user_id != user.id {
        tracing::warn!("User {} tried to delete comment {}", user.id, comment.id);
        return Err(AppError::Forbidden);
    }

    state.store.delete_comment(comment.id).await?;
    Ok(Redirect::to(&format!("/posts/{}", comment.post_id)))
}
