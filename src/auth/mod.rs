pub mod cookies;
pub mod password;
pub mod register;
pub mod session;

pub use register::{register, Registration, RegistrationError};
pub use session::{AuthError, Identity, SessionResolver, SessionUser};
