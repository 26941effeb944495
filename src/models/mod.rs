mod comment;
mod post;
mod user;

pub use comment::Comment;
pub use post::{Post, PostDraft, PostPage};
pub use user::{Stats, User, UserPosts};
