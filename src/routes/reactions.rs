use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

use crate::db::models::{ReactionKind, Subject};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::repository::{CommentRepository, PostRepository};
use crate::routes::{parse_id, referer_path};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PostReactionForm {
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub reaction: String,
}

#[derive(Deserialize)]
pub struct CommentReactionForm {
    #[serde(default)]
    pub comment_id: String,
    #[serde(default)]
    pub reaction: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/react", post(react_to_post))
        .route("/react-comment", post(react_to_comment))
}

fn parse_kind(raw: &str) -> AppResult<ReactionKind> {
    raw.parse::<ReactionKind>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn react_to_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Form(form): Form<PostReactionForm>,
) -> AppResult<Redirect> {
    let kind = parse_kind(&form.reaction)?;
    let post_id = parse_id(&form.post_id, "post")?;
    if state.store.find_post(post_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    state
        .reactions
        .set_reaction(user.id, Subject::Post(post_id), kind)
        .await?;
    Ok(Redirect::to(&referer_path(&headers)))
}

async fn react_to_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Form(form): Form<CommentReactionForm>,
) -> AppResult<Redirect> {
    let kind = parse_kind(&form.reaction)?;
    let comment_id = parse_id(&form.comment_id, "comment")?;
    if state.store.find_comment(comment_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    state
        .reactions
        .set_reaction(user.id, Subject::Comment(comment_id), kind)
        .await?;
    Ok(Redirect::to(&referer_path(&headers)))
}
