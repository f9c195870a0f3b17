pub mod cors;

pub use cors::{CorsPolicy, cors_middleware};
