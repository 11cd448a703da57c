use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::cookies::get_cookie_value;
use crate::auth::{Identity, SessionUser};
use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
/// Anonymous visitors are redirected to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser { identity, .. } = MaybeUser::from_request_parts(parts, state).await?;
        match identity {
            Identity::Authenticated(user) => Ok(CurrentUser(user)),
            Identity::Anonymous => Err(AppError::Unauthenticated),
        }
    }
}

/// Optional user extractor: anonymous instead of a redirect.
///
/// `token` is whatever the session cookie held, even when it resolved to no
/// one, so pages can tell a returning guest from a first visit.
#[derive(Debug, Clone)]
pub struct MaybeUser {
    pub identity: Identity,
    pub token: Option<String>,
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = get_cookie_value(&parts.headers, &state.config.auth.cookie_name)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let identity = state.sessions.resolve(token.as_deref()).await?;
        Ok(MaybeUser { identity, token })
    }
}
