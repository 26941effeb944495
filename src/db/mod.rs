mod comments;
mod likes;
mod posts;
mod queries;
mod repository;
mod schema;
mod tags;
mod users;

pub use repository::Repository;
