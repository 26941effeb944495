//! Content graph and engagement backend: users author posts, attach tags,
//! comment and like; denormalized counters and tag links stay consistent
//! under concurrent mutation. HTTP routing, password hashing and file
//! storage are the embedding application's concern.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod models;
pub mod services;

pub use config::Config;
pub use db::Repository;
pub use error::{AppError, Result};
pub use identity::{Principal, Role};
