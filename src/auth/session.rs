use std::sync::Arc;

use rand::Rng;

use crate::auth::password;
use crate::db::models::{User, UserId};
use crate::repository::{SessionRepository, StoreError, UserRepository};

/// The signed-in user as every page sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub username: String,
    pub profile_picture: String,
    pub country: String,
    pub show_donations_in_country_only: bool,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            profile_picture: user.profile_picture,
            country: user.country,
            show_donations_in_country_only: user.show_donations_in_country_only,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(SessionUser),
    Anonymous,
}

impl Identity {
    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Turns session cookies into identities and owns the login/logout lifecycle.
///
/// Sessions are a plain token -> user mapping with one live token per user:
/// logging in again replaces the stored token, so the previous cookie stops
/// resolving immediately. Tokens are never expired server-side; the cookie's
/// `Expires` is the only TTL.
#[derive(Clone)]
pub struct SessionResolver {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl SessionResolver {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { users, sessions }
    }

    /// Anonymous on a missing, unknown, or orphaned token. Storage failures
    /// are returned as errors, never folded into Anonymous.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Identity, StoreError> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(Identity::Anonymous),
        };

        let Some(user_id) = self.sessions.find_session_user(token).await? else {
            tracing::debug!("Session token not found");
            return Ok(Identity::Anonymous);
        };

        match self.users.find_user_by_id(user_id).await? {
            Some(user) => Ok(Identity::Authenticated(user.into())),
            None => {
                tracing::warn!("Session points at missing user {}", user_id);
                Ok(Identity::Anonymous)
            }
        }
    }

    /// A fresh token for a first-time visitor. Never written to the session store.
    pub fn issue_guest_token(&self) -> String {
        generate_token()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        self.sessions.upsert_session(user.id, &token).await?;
        tracing::info!("User {} logged in", user.id);

        Ok(token)
    }

    /// Idempotent: an unknown token is not an error.
    pub async fn logout(&self, token: &str) -> Result<(), StoreError> {
        self.sessions.delete_session(token).await
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generate a cryptographically random 32-byte hex token.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
