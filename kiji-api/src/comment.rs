use std::collections::HashSet;

use uuid::Uuid;

use crate::{BlogId, Error, Time, User, UserId, STUB_UUID};

/// Number of comments the backend returns per page, both for root comments
/// and for the replies of one comment
pub const COMMENT_PAGE_SIZE: usize = 5;

#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct CommentId(#[generator(bolero::generator::gen_arbitrary())] pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
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
}

/// One page of root comments, newest first
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,

    /// Total number of root comments on the blog, as counted by the server
    pub total_roots: u64,
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub blog: BlogId,
    pub replying_to: Option<CommentId>,
    #[generator(bolero::generator::gen_with::<String>().len(1..100usize))]
    pub text: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.text)?;
        match self.text.trim().is_empty() {
            true => Err(Error::InvalidSubmission(String::from(
                "comment text cannot be empty",
            ))),
            false => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, serde::Deserialize, serde::Serialize)]
pub struct CommentsRequest {
    pub blog: BlogId,
    pub skip: usize,
}

#[derive(Clone, Copy, Debug, serde::Deserialize, serde::Serialize)]
pub struct RepliesRequest {
    pub comment: CommentId,
    pub skip: usize,
}
