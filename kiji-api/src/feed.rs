use crate::{DirectMessage, Notification};

/// What the backend pushes over the realtime channel
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum FeedMessage {
    Pong,
    Notification(Notification),
    Message(DirectMessage),
}
