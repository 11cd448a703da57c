use rand::seq::SliceRandom;

use crate::auth::password;
use crate::auth::session::normalize_email;
use crate::db::models::{NewUser, UserId};
use crate::repository::{StoreError, UserRepository};

/// Stock avatars handed out at sign-up.
pub const PROFILE_PICTURES: &[&str] = &["1.png", "2.png", "3.png"];

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Username, email and password are all required.")]
    MissingField,

    #[error("Email or username already in use. Please try a different one.")]
    AlreadyRegistered,

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => RegistrationError::AlreadyRegistered,
            other => RegistrationError::Store(other),
        }
    }
}

/// Create an account. New users start with no country and the donation filter off.
pub async fn register(
    users: &dyn UserRepository,
    form: &Registration,
    bcrypt_cost: u32,
) -> Result<UserId, RegistrationError> {
    let username = form.username.trim();
    let email = normalize_email(&form.email);
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(RegistrationError::MissingField);
    }

    let password_hash = password::hash_password(&form.password, bcrypt_cost)?;
    let profile_picture = PROFILE_PICTURES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("1.png")
        .to_string();

    let id = users
        .create_user(&NewUser {
            username: username.to_string(),
            email,
            password_hash,
            profile_picture,
        })
        .await?;

    tracing::info!("Registered user {} ({})", id, username);
    Ok(id)
}
