mod auth;
mod blobs;

pub use auth::{Authenticator, Credentials};
pub use blobs::BlobStore;
