pub mod auth;
pub mod comments;
pub mod consent;
pub mod home;
pub mod liked;
pub mod posts;
pub mod profile;
pub mod reactions;
pub mod search;

use axum::http::{header, HeaderMap};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::Identity;
use crate::error::AppError;
use crate::state::AppState;

/// The whole site, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(home::router())
        .merge(auth::router())
        .merge(consent::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(reactions::router())
        .merge(search::router())
        .merge(profile::router())
        .merge(liked::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Header bar data shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub signed_in: bool,
    pub username: String,
    pub profile_picture: String,
}

impl From<&Identity> for Nav {
    fn from(identity: &Identity) -> Self {
        match identity.user() {
            Some(user) => Nav {
                signed_in: true,
                username: user.username.clone(),
                profile_picture: user.profile_picture.clone(),
            },
            None => Nav::default(),
        }
    }
}

/// Parse a numeric id from a path segment or form field.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} id")))
}

/// Path part of the `Referer` header, or `/`. Never points off-site.
pub(crate) fn referer_path(headers: &HeaderMap) -> String {
    let Some(referer) = headers.get(header::REFERER).and_then(|v| v.to_str().ok()) else {
        return "/".to_string();
    };

    let path = match referer.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => referer,
    };

    if path.starts_with('/') && !path.starts_with("//") {
        path.to_string()
    } else {
        "/".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_referer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn referer_path_keeps_path_and_query() {
        assert_eq!(
            referer_path(&with_referer("http://localhost:8080/search?q=pram")),
            "/search?q=pram"
        );
        assert_eq!(referer_path(&with_referer("/posts/3")), "/posts/3");
    }

    #[test]
    fn referer_path_falls_back_to_root() {
        assert_eq!(referer_path(&HeaderMap::new()), "/");
        assert_eq!(referer_path(&with_referer("https://example.com")), "/");
        assert_eq!(referer_path(&with_referer("//evil.example/")), "/");
        assert_eq!(referer_path(&with_referer("garbage")), "/");
    }

    #[test]
    fn parse_id_rejects_non_numbers() {
        assert_eq!(parse_id(" 42 ", "post").unwrap(), 42);
        assert!(matches!(
            parse_id("abc", "post"),
            Err(AppError::BadRequest(_))
        ));
    }
}
