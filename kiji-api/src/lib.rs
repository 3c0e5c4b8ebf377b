use chrono::Utc;

mod auth;
mod blog;
mod comment;
mod error;
mod feed;
mod message;
mod notification;
mod report;
mod user;

pub use auth::{AuthToken, NewSession};
pub use blog::{
    Block, Blog, BlogId, BlogStats, BlogView, LatestBlogsRequest, NewBlog, BLOG_PAGE_SIZE,
    MAX_BLOG_DESCRIPTION_CHARS, MAX_BLOG_TAGS,
};
pub use comment::{
    Comment, CommentId, CommentPage, CommentsRequest, NewComment, RepliesRequest,
    COMMENT_PAGE_SIZE,
};
pub use error::Error;
pub use feed::FeedMessage;
pub use message::{ConversationRequest, DirectMessage, MessageId, NewMessage, MESSAGE_PAGE_SIZE};
pub use notification::{Notification, NotificationId, NotificationKind};
pub use report::{NewReport, Report, ReportId, ReportReason, ReportStatus, ReportTarget};
pub use user::{NewUser, User, UserId};

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

/// The backend stores strings in a medium that cannot represent null bytes
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}
