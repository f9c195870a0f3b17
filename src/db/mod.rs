//! Database module: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and their public shapes
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `storage.rs`: parameterized queries over the pooled connection

pub mod models;
pub mod schema;
pub mod storage;

pub use models::{LoginCandidate, SessionJoinRow, StorePublic, StoreRow, UserPublic};
pub use schema::SQLITE_INIT;
pub use storage::{PlazaStorage, SqlitePool};
