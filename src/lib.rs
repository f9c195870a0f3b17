pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod session;
pub mod vault;

pub use error::PlazaError;
pub use vault::CredentialVault;
