use uuid::Uuid;

use crate::{BlogId, CommentId, Time, User, UserId, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn stub() -> NotificationId {
        NotificationId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum NotificationKind {
    BlogLiked(BlogId),
    NewComment {
        blog: BlogId,
        comment: CommentId,
    },
    NewReply {
        blog: BlogId,
        comment: CommentId,
        replying_to: CommentId,
    },
    NewFollower,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub actor: User,
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub seen: bool,
    pub created_at: Time,
}
