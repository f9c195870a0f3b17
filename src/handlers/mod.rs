pub mod admin;
pub mod auth;
pub mod proxy;

/// Minimum accepted password length for local users.
pub(crate) const MIN_PASSWORD_LEN: usize = 6;
