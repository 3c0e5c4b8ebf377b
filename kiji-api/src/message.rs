use uuid::Uuid;

use crate::{Error, Time, UserId, STUB_UUID};

/// Number of messages the backend returns per conversation page
pub const MESSAGE_PAGE_SIZE: usize = 20;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn stub() -> MessageId {
        MessageId(STUB_UUID)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DirectMessage {
    pub id: MessageId,
    pub from: UserId,
    pub to: UserId,
    pub text: String,
    pub sent_at: Time,
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator, serde::Deserialize, serde::Serialize)]
pub struct NewMessage {
    pub to: UserId,
    #[generator(bolero::generator::gen_with::<String>().len(1..100usize))]
    pub text: String,
}

impl NewMessage {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.text)?;
        match self.text.trim().is_empty() {
            true => Err(Error::InvalidSubmission(String::from(
                "message text cannot be empty",
            ))),
            false => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, serde::Deserialize, serde::Serialize)]
pub struct ConversationRequest {
    pub with: UserId,
    pub skip: usize,
}
