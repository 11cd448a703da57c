use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::cookies::{clear_session_cookie, session_cookie};
use crate::auth::{register, AuthError, Registration, RegistrationError};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

const REGISTERED_REDIRECT: &str = "/login?message=Registration%20successful.%20Please%20log%20in.";

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub message: String,
    pub error: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub error: String,
    pub username: String,
    pub email: String,
}

#[derive(Deserialize)]
pub struct MessageQuery {
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register_submit))
        .route("/login", get(login_page).post(login_submit))
        .route("/logout", post(logout))
}

async fn register_page(maybe_user: MaybeUser) -> Html<RegisterTemplate> {
    Html(RegisterTemplate {
        nav: Nav::from(&maybe_user.identity),
        error: String::new(),
        username: String::new(),
        email: String::new(),
    })
}

async fn register_submit(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let registration = Registration {
        username: form.username,
        email: form.email,
        password: form.password,
    };

    match register(&*state.store, &registration, state.config.auth.bcrypt_cost).await {
        Ok(_) => Ok(Redirect::to(REGISTERED_REDIRECT).into_response()),
        Err(e @ (RegistrationError::MissingField | RegistrationError::AlreadyRegistered)) => {
            let page = Html(RegisterTemplate {
                nav: Nav::from(&maybe_user.identity),
                error: e.to_string(),
                username: registration.username,
                email: registration.email,
            });
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn login_page(maybe_user: MaybeUser, Query(query): Query<MessageQuery>) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        nav: Nav::from(&maybe_user.identity),
        message: query.message,
        error: String::new(),
        email: String::new(),
    })
}

async fn login_submit(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    match state.sessions.login(&form.email, &form.password).await {
        Ok(token) => {
            let cookie = session_cookie(
                &state.config.auth.cookie_name,
                &token,
                state.config.auth.session_hours,
            );
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Failed login attempt");
            let page = Html(LoginTemplate {
                nav: Nav::from(&maybe_user.identity),
                message: String::new(),
                error: AppError::InvalidCredentials.to_string(),
                email: form.email,
            });
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn logout(State(state): State<AppState>, maybe_user: MaybeUser) -> AppResult<Response> {
    if let Some(token) = maybe_user.token.as_deref() {
        state.sessions.logout(token).await?;
    }
    if let Some(user) = maybe_user.identity.user() {
        tracing::info!("User {} logged out", user.id);
    }

    let cookie = clear_session_cookie(&state.config.auth.cookie_name);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}
