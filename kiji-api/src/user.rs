use uuid::Uuid;

use crate::{Error, STUB_UUID};

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
pub struct UserId(#[generator(bolero::generator::gen_arbitrary())] pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

/// Denormalized author snapshot embedded in blogs, comments and notifications
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: String,
    pub is_moderator: bool,
}

impl User {
    pub fn stub() -> User {
        User {
            id: UserId::stub(),
            username: String::from("stub"),
            display_name: String::from("Stub"),
            avatar_url: String::new(),
            is_moderator: false,
        }
    }
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator, serde::Deserialize, serde::Serialize)]
pub struct NewUser {
    pub id: UserId,
    #[generator(bolero::generator::gen_with::<String>().len(1..20usize))]
    pub username: String,
    #[generator(bolero::generator::gen_with::<String>().len(0..50usize))]
    pub display_name: String,
    pub initial_password_hash: String,
    pub is_moderator: bool,
}

impl NewUser {
    // Usernames end up in profile urls, so they are restricted to a simple charset
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.username)?;
        crate::validate_string(&self.display_name)?;
        crate::validate_string(&self.initial_password_hash)?;
        if self.username.is_empty()
            || !self
                .username
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(Error::InvalidName(self.username.clone()));
        }
        if self.display_name.is_empty() {
            return Err(Error::InvalidSubmission(String::from(
                "a display name is required",
            )));
        }
        Ok(())
    }
}
