use askama::Template;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::Identity;
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::feed::PostCard;
use crate::repository::{PostFilter, PostRepository};
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/results.html")]
pub struct ResultsTemplate {
    pub nav: Nav,
    pub heading: String,
    pub posts: Vec<PostCard>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Raw filter form. Blank fields mean "no constraint".
#[derive(Deserialize, Default)]
pub struct FilterQuery {
    pub category: Option<String>,
    pub created_posts: Option<String>,
    pub liked_posts: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(value: Option<String>, field: &str) -> AppResult<Option<NaiveDate>> {
    non_blank(value)
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Invalid {field}, expected YYYY-MM-DD")))
        })
        .transpose()
}

fn is_checked(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("true") | Some("on"))
}

impl FilterQuery {
    /// Author and liked filters only apply to a signed-in viewer.
    pub fn into_filter(self, viewer: &Identity) -> AppResult<PostFilter> {
        let user_id = viewer.user_id();
        Ok(PostFilter {
            created_by: user_id.filter(|_| is_checked(&self.created_posts)),
            liked_by: user_id.filter(|_| is_checked(&self.liked_posts)),
            start_date: parse_date(self.start_date, "start date")?,
            end_date: parse_date(self.end_date, "end date")?,
            category: non_blank(self.category),
        })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/filter", get(filter))
}

async fn search(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Html<ResultsTemplate>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest("Search query cannot be empty".to_string()));
    }

    let posts = state.store.search_posts(q).await?;
    let posts = state.feed.cards(posts, &maybe_user.identity, false).await?;

    Ok(Html(ResultsTemplate {
        nav: Nav::from(&maybe_user.identity),
        heading: format!("Results for \"{q}\""),
        posts,
    }))
}

async fn filter(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Query(query): Query<FilterQuery>,
) -> AppResult<Html<ResultsTemplate>> {
    let filter = query.into_filter(&maybe_user.identity)?;
    tracing::debug!("Filtering posts: {:?}", filter);

    let posts = state.store.filter_posts(&filter).await?;
    let posts = state.feed.cards(posts, &maybe_user.identity, false).await?;

    Ok(Html(ResultsTemplate {
        nav: Nav::from(&maybe_user.identity),
        heading: "Filtered posts".to_string(),
        posts,
    }))
}
