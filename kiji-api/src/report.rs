use uuid::Uuid;

use crate::{BlogId, CommentId, Error, Time, UserId, STUB_UUID};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ReportId(pub Uuid);

impl ReportId {
    pub fn stub() -> ReportId {
        ReportId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ReportTarget {
    Blog(BlogId),
    Comment(CommentId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ReportReason {
    Spam,
    Harassment,
    Misinformation,
    Other,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum ReportStatus {
    Open,
    Dismissed,
    ContentRemoved,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct NewReport {
    pub target: ReportTarget,
    pub reason: ReportReason,
    pub details: String,
}

impl NewReport {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.details)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter: UserId,
    pub target: ReportTarget,
    pub reason: ReportReason,
    pub details: String,
    pub status: ReportStatus,
    pub created_at: Time,
}
