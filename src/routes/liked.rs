use askama::Template;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;

use crate::auth::Identity;
use crate::babybox::{curated_items, selected_categories, BoxCategory, CuratedItem};
use crate::db::models::ReactionKind;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::feed::PostCard;
use crate::repository::PostRepository;
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

pub struct BoxChoice {
    pub label: &'static str,
    pub checked: bool,
}

#[derive(Template)]
#[template(path = "pages/liked_posts.html")]
pub struct LikedPostsTemplate {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub choices: Vec<BoxChoice>,
    pub items: Vec<CuratedItem>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/liked-posts", get(liked_posts))
}

/// `category` may repeat, so the query is taken as raw pairs.
async fn liked_posts(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Html<LikedPostsTemplate>> {
    let picked = selected_categories(
        query
            .iter()
            .filter(|(key, _)| key == "category")
            .map(|(_, value)| value.as_str()),
    );

    let liked = state.store.posts_reacted_by(user.id, ReactionKind::Like).await?;
    let viewer = Identity::Authenticated(user);

    Ok(Html(LikedPostsTemplate {
        nav: Nav::from(&viewer),
        posts: state.feed.cards(liked, &viewer, false).await?,
        choices: BoxCategory::ALL
            .into_iter()
            .map(|c| BoxChoice {
                label: c.label(),
                checked: picked.contains(&c),
            })
            .collect(),
        items: curated_items(&picked),
    }))
}
