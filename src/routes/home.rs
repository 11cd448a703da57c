use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::auth::cookies::{get_cookie_value, session_cookie, CONSENT_COOKIE};
use crate::auth::Identity;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::feed::PostCard;
use crate::repository::{PostFilter, PostRepository, UserRepository};
use crate::routes::Nav;
use crate::state::AppState;

const TOP_LIKED: u32 = 5;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub nav: Nav,
    pub posts: Vec<PostCard>,
    pub top_posts: Vec<PostCard>,
    pub categories: Vec<String>,
    pub show_consent_banner: bool,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/about", get(about))
}

pub async fn index(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    headers: HeaderMap,
) -> AppResult<Response> {
    let viewer = &maybe_user.identity;

    let posts = state.store.filter_posts(&PostFilter::default()).await?;
    let posts = state.feed.cards(posts, viewer, true).await?;
    let top_posts = state.store.top_liked_posts(TOP_LIKED).await?;
    let top_posts = state.feed.cards(top_posts, viewer, false).await?;
    let categories = state.store.categories().await?;

    let show_consent_banner = match viewer {
        Identity::Authenticated(user) => !state.store.has_cookie_consent(user.id).await?,
        Identity::Anonymous => get_cookie_value(&headers, CONSENT_COOKIE) != Some("true"),
    };

    let page = Html(HomeTemplate {
        nav: Nav::from(viewer),
        posts,
        top_posts,
        categories,
        show_consent_banner,
    });

    // First visit: hand out a guest token so later requests carry a cookie.
    if maybe_user.token.is_none() {
        let token = state.sessions.issue_guest_token();
        let cookie = session_cookie(
            &state.config.auth.cookie_name,
            &token,
            state.config.auth.session_hours,
        );
        return Ok(([(header::SET_COOKIE, cookie)], page).into_response());
    }

    Ok(page.into_response())
}

async fn about(maybe_user: MaybeUser) -> Html<AboutTemplate> {
    Html(AboutTemplate {
        nav: Nav::from(&maybe_user.identity),
    })
}
