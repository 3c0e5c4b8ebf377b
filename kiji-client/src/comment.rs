use std::collections::HashSet;

use crate::api::{self, BlogId, CommentId, Time, User, UserId};

/// One displayed comment: the backend record plus the presentation state
/// that only exists client-side
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub blog: BlogId,
    pub author: User,
    pub text: String,
    pub created_at: Time,

    pub like_count: u64,
    pub liked_by: HashSet<UserId>,

    /// Direct replies in creation order, not necessarily loaded
    pub children: Vec<CommentId>,

    /// Distance from the root comment this one transitively replies to;
    /// root comments are at depth 0
    pub depth: usize,

    /// Whether this comment's replies are currently materialized in the
    /// flattened list directly following it
    pub replies_expanded: bool,
}

impl Comment {
    pub fn from_api(c: api::Comment, depth: usize) -> Comment {
        Comment {
            id: c.id,
            blog: c.blog,
            author: c.author,
            text: c.text,
            created_at: c.created_at,
            like_count: c.like_count,
            liked_by: c.liked_by,
            children: c.children,
            depth,
            replies_expanded: false,
        }
    }

    pub fn liked_by_me(&self, me: &UserId) -> bool {
        self.liked_by.contains(me)
    }
}
