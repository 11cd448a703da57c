use askama::Template;
use axum::extract::State;
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::Identity;
use crate::db::models::{format_timestamp, ReactionKind, NO_LOCATION};
use crate::donations::update_country_preferences;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::feed::{CommentCard, PostCard};
use crate::repository::{CommentRepository, PostFilter, PostRepository, UserRepository};
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub nav: Nav,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
    pub member_since: String,
    /// Blank when the user has not picked a country.
    pub country: String,
    pub show_donations_in_country_only: bool,
    pub posts: Vec<PostCard>,
    pub comments: Vec<CommentCard>,
    pub liked_posts: Vec<PostCard>,
    pub disliked_posts: Vec<PostCard>,
}

#[derive(Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub country: String,
    /// Checkbox: present when ticked.
    pub show_donations_in_country_only: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route("/profile/settings", post(update_settings))
}

async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Html<ProfileTemplate>> {
    let account = state
        .store
        .find_user_by_id(user.id)
        .await?
        .ok_or(AppError::Unauthenticated)?;
    let viewer = Identity::Authenticated(user);

    let own = state
        .store
        .filter_posts(&PostFilter {
            created_by: Some(account.id),
            ..Default::default()
        })
        .await?;
    let liked = state.store.posts_reacted_by(account.id, ReactionKind::Like).await?;
    let disliked = state
        .store
        .posts_reacted_by(account.id, ReactionKind::Dislike)
        .await?;
    let comments = state.store.comments_by_user(account.id).await?;

    let country = if account.country == NO_LOCATION {
        String::new()
    } else {
        account.country
    };

    Ok(Html(ProfileTemplate {
        nav: Nav::from(&viewer),
        member_since: format_timestamp(&account.created_at),
        posts: state.feed.cards(own, &viewer, false).await?,
        comments: state.feed.comment_cards(comments, &viewer).await?,
        liked_posts: state.feed.cards(liked, &viewer, false).await?,
        disliked_posts: state.feed.cards(disliked, &viewer, false).await?,
        username: account.username,
        email: account.email,
        profile_picture: account.profile_picture,
        country,
        show_donations_in_country_only: account.show_donations_in_country_only,
    }))
}

async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<SettingsForm>,
) -> AppResult<Redirect> {
    update_country_preferences(
        &*state.store,
        &user,
        &form.country,
        form.show_donations_in_country_only.is_some(),
    )
    .await?;

    Ok(Redirect::to("/profile"))
}
