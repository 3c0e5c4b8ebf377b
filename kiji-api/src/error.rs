use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Eq, PartialEq, bolero::generator::TypeGenerator, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Unknown blog {0}")]
    UnknownBlog(#[generator(bolero::generator::gen_arbitrary())] Uuid),

    #[error("Unknown comment {0}")]
    UnknownComment(#[generator(bolero::generator::gen_arbitrary())] Uuid),

    #[error("Unknown user {0}")]
    UnknownUser(#[generator(bolero::generator::gen_arbitrary())] Uuid),

    #[error("Uuid already used {0}")]
    UuidAlreadyUsed(#[generator(bolero::generator::gen_arbitrary())] Uuid),

    #[error("Name already used {0}")]
    NameAlreadyUsed(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Invalid character in name {0:?}")]
    InvalidName(String),

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::UnknownBlog(_) => StatusCode::NOT_FOUND,
            Error::UnknownComment(_) => StatusCode::NOT_FOUND,
            Error::UnknownUser(_) => StatusCode::NOT_FOUND,
            Error::UuidAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::NameAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::InvalidName(_) => StatusCode::BAD_REQUEST,
            Error::InvalidSubmission(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::UnknownBlog(u) => json!({
                "message": "unknown blog",
                "type": "unknown-blog",
                "uuid": u,
            }),
            Error::UnknownComment(u) => json!({
                "message": "unknown comment",
                "type": "unknown-comment",
                "uuid": u,
            }),
            Error::UnknownUser(u) => json!({
                "message": "unknown user",
                "type": "unknown-user",
                "uuid": u,
            }),
            Error::UuidAlreadyUsed(u) => json!({
                "message": "uuid conflict",
                "type": "conflict-uuid",
                "uuid": u,
            }),
            Error::NameAlreadyUsed(n) => json!({
                "message": "name already used",
                "type": "conflict-name",
                "name": n,
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::InvalidName(n) => json!({
                "message": "there was an invalid character in a user name",
                "type": "invalid-name",
                "name": n,
            }),
            Error::InvalidSubmission(msg) => json!({
                "message": msg,
                "type": "invalid-submission",
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let uuid_field = |data: &serde_json::Value, what: &'static str| {
            data.get("uuid")
                .and_then(|uuid| uuid.as_str())
                .and_then(|uuid| Uuid::from_str(uuid).ok())
                .ok_or_else(|| anyhow!("error is {what} without a proper uuid"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "unknown-blog" => Error::UnknownBlog(uuid_field(&data, "an unknown-blog error")?),
                "unknown-comment" => {
                    Error::UnknownComment(uuid_field(&data, "an unknown-comment error")?)
                }
                "unknown-user" => Error::UnknownUser(uuid_field(&data, "an unknown-user error")?),
                "conflict-uuid" => Error::UuidAlreadyUsed(uuid_field(&data, "a uuid conflict")?),
                "conflict-name" => Error::NameAlreadyUsed(String::from(
                    data.get("name")
                        .and_then(|n| n.as_str())
                        .ok_or_else(|| anyhow!("error is a name conflict without a name"))?,
                )),
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "invalid-name" => Error::InvalidName(String::from(
                    data.get("name").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is about an invalid name but no name was provided")
                    })?,
                )),
                "invalid-submission" => Error::InvalidSubmission(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_error_round_trips_through_json() {
        bolero::check!().with_type::<Error>().for_each(|e| {
            let reparsed = Error::parse(&e.contents()).expect("parsing freshly serialized error");
            assert_eq!(&reparsed, e);
        })
    }
}
