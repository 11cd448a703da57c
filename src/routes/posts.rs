use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::{Identity, SessionUser};
use crate::db::models::{NewPost, Post, PostEdit, PostId};
use crate::donations::normalize_country;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::feed::PostCard;
use crate::repository::PostRepository;
use crate::routes::home::Html;
use crate::routes::{parse_id, Nav};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub nav: Nav,
    pub post: PostCard,
}

#[derive(Template)]
#[template(path = "pages/post_form.html")]
pub struct PostFormTemplate {
    pub nav: Nav,
    pub heading: String,
    pub action: String,
    pub error: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub is_donation: bool,
}

#[derive(Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    /// Checkbox: present when ticked.
    pub is_donation: Option<String>,
}

impl PostForm {
    fn is_donation(&self) -> bool {
        self.is_donation.is_some()
    }

    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/new", get(new_post_page).post(create_post))
        .route("/posts/{id}", get(show_post))
        .route("/posts/{id}/edit", get(edit_post_page).post(update_post))
        .route("/posts/{id}/delete", post(delete_post))
}

fn form_page(
    user: &SessionUser,
    heading: &str,
    action: String,
    error: &str,
    form: &PostForm,
) -> Html<PostFormTemplate> {
    Html(PostFormTemplate {
        nav: Nav::from(&Identity::Authenticated(user.clone())),
        heading: heading.to_string(),
        action,
        error: error.to_string(),
        title: form.title.clone(),
        content: form.content.clone(),
        category: form.category.clone(),
        is_donation: form.is_donation(),
    })
}

const MISSING_FIELDS: &str = "Title and content are required.";

async fn new_post_page(CurrentUser(user): CurrentUser) -> Html<PostFormTemplate> {
    let blank = PostForm {
        title: String::new(),
        content: String::new(),
        category: String::new(),
        is_donation: None,
    };
    form_page(&user, "New post", "/posts/new".to_string(), "", &blank)
}

async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    if !form.is_complete() {
        let page = form_page(&user, "New post", "/posts/new".to_string(), MISSING_FIELDS, &form);
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    let id = state
        .store
        .create_post(&NewPost {
            user_id: user.id,
            title: form.title.trim().to_string(),
            content: form.content.trim().to_string(),
            category: form.category.trim().to_string(),
            is_donation: form.is_donation(),
            donation_country: normalize_country(&user.country),
        })
        .await?;

    tracing::info!("User {} created post {}", user.id, id);
    Ok(Redirect::to(&format!("/posts/{id}")).into_response())
}

async fn load_post(state: &AppState, raw_id: &str) -> AppResult<Post> {
    let id: PostId = parse_id(raw_id, "post")?;
    state.store.find_post(id).await?.ok_or(AppError::NotFound)
}

async fn load_own_post(state: &AppState, raw_id: &str, user: &SessionUser) -> AppResult<Post> {
    let post = load_post(state, raw_id).await?;
    if post.user_id != user.id {
        tracing::warn!("User {} tried to modify post {}", user.id, post.id);
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

async fn show_post(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(id): Path<String>,
) -> AppResult<Html<PostTemplate>> {
    let post = load_post(&state, &id).await?;
    let card = state.feed.card(post, &maybe_user.identity, true).await?;

    Ok(Html(PostTemplate {
        nav: Nav::from(&maybe_user.identity),
        post: card,
    }))
}

async fn edit_post_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Html<PostFormTemplate>> {
    let post = load_own_post(&state, &id, &user).await?;
    let current = PostForm {
        title: post.title,
        content: post.content,
        category: post.category,
        is_donation: post.is_donation.then(|| "on".to_string()),
    };
    Ok(form_page(
        &user,
        "Edit post",
        format!("/posts/{}/edit", post.id),
        "",
        &current,
    ))
}

async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let post = load_own_post(&state, &id, &user).await?;
    if !form.is_complete() {
        let action = format!("/posts/{}/edit", post.id);
        let page = form_page(&user, "Edit post", action, MISSING_FIELDS, &form);
        return Ok((StatusCode::BAD_REQUEST, page).into_response());
    }

    state
        .store
        .update_post(
            post.id,
            &PostEdit {
                title: form.title.trim().to_string(),
                content: form.content.trim().to_string(),
                category: form.category.trim().to_string(),
                is_donation: form.is_donation(),
                donation_country: normalize_country(&user.country),
            },
        )
        .await?;

    Ok(Redirect::to(&format!("/posts/{}", post.id)).into_response())
}

async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Redirect> {
    let post = load_own_post(&state, &id, &user).await?;
    state.store.delete_post(post.id).await?;
    tracing::info!("User {} deleted post {}", user.id, post.id);
    Ok(Redirect::to("/"))
}
