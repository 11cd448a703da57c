use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::post;
use axum::Router;

use crate::auth::cookies::consent_cookie;
use crate::auth::Identity;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::repository::UserRepository;
use crate::routes::referer_path;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/accept-cookies", post(accept_cookies))
}

/// Members get a stored consent row; guests get a long-lived cookie.
async fn accept_cookies(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    headers: HeaderMap,
) -> AppResult<Response> {
    let back = Redirect::to(&referer_path(&headers));

    match maybe_user.identity {
        Identity::Authenticated(user) => {
            state.store.save_cookie_consent(user.id, true).await?;
            Ok(back.into_response())
        }
        Identity::Anonymous => {
            let cookie = consent_cookie(state.config.auth.consent_days);
            Ok(([(header::SET_COOKIE, cookie)], back).into_response())
        }
    }
}
