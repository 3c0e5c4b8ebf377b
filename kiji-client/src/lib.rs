mod comment;
pub use comment::Comment;

mod session;
pub use session::Session;

mod tree;
pub use tree::{CommentTree, LikeDelta};

pub mod optimistic;

mod fuzz;

pub mod api {
    pub use kiji_api::*;
}
