use uuid::Uuid;

use crate::{Error, Time, User, STUB_UUID};

/// Number of blogs the backend returns per latest-blogs page
pub const BLOG_PAGE_SIZE: usize = 5;

pub const MAX_BLOG_DESCRIPTION_CHARS: usize = 200;
pub const MAX_BLOG_TAGS: usize = 10;

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
pub struct BlogId(#[generator(bolero::generator::gen_arbitrary())] pub Uuid);

impl BlogId {
    pub fn stub() -> BlogId {
        BlogId(STUB_UUID)
    }
}

/// One content block as produced by the block editor
#[derive(
    Clone,
    Debug,
    Eq,
    PartialEq,
    bolero::generator::TypeGenerator,
    serde::Deserialize,
    serde::Serialize,
)]
pub enum Block {
    Paragraph(#[generator(bolero::generator::gen_with::<String>().len(0..100usize))] String),
    Heading {
        level: u8,
        #[generator(bolero::generator::gen_with::<String>().len(0..100usize))]
        text: String,
    },
    Image {
        url: String,
        caption: String,
    },
    Quote(#[generator(bolero::generator::gen_with::<String>().len(0..100usize))] String),
    Code {
        language: String,
        #[generator(bolero::generator::gen_with::<String>().len(0..100usize))]
        code: String,
    },
}

impl Block {
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            Block::Paragraph(text) => crate::validate_string(text),
            Block::Heading { level, text } => {
                crate::validate_string(text)?;
                match (1..=6).contains(level) {
                    true => Ok(()),
                    false => Err(Error::InvalidSubmission(format!(
                        "heading level {level} is out of range"
                    ))),
                }
            }
            Block::Image { url, caption } => {
                crate::validate_string(url)?;
                crate::validate_string(caption)
            }
            Block::Quote(text) => crate::validate_string(text),
            Block::Code { language, code } => {
                crate::validate_string(language)?;
                crate::validate_string(code)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BlogStats {
    pub total_likes: u64,
    pub total_comments: u64,
    pub total_parent_comments: u64,
    pub total_reads: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Blog {
    pub id: BlogId,
    pub author: User,
    pub title: String,
    pub description: String,
    pub banner_url: String,
    pub content: Vec<Block>,
    pub tags: Vec<String>,
    pub is_draft: bool,
    pub published_at: Time,
    pub stats: BlogStats,
}

/// A blog as seen by the requesting user
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct BlogView {
    pub blog: Blog,
    pub liked: bool,
    pub bookmarked: bool,
    pub following_author: bool,
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator, serde::Deserialize, serde::Serialize)]
pub struct NewBlog {
    pub id: BlogId,
    #[generator(bolero::generator::gen_with::<String>().len(0..100usize))]
    pub title: String,
    #[generator(bolero::generator::gen_with::<String>().len(0..300usize))]
    pub description: String,
    pub banner_url: String,
    pub content: Vec<Block>,
    #[generator(bolero::generator::gen_with::<Vec<String>>().len(0..12usize))]
    pub tags: Vec<String>,
    pub is_draft: bool,
}

impl NewBlog {
    // Drafts only need a title, everything else is checked at publish time
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_string(&self.title)?;
        crate::validate_string(&self.description)?;
        crate::validate_string(&self.banner_url)?;
        for tag in &self.tags {
            crate::validate_string(tag)?;
        }
        for block in &self.content {
            block.validate()?;
        }
        if self.title.trim().is_empty() {
            return Err(Error::InvalidSubmission(String::from(
                "a title is required",
            )));
        }
        if !self.is_draft {
            if self.description.is_empty()
                || self.description.chars().count() > MAX_BLOG_DESCRIPTION_CHARS
            {
                return Err(Error::InvalidSubmission(format!(
                    "publishing requires a description of 1 to {MAX_BLOG_DESCRIPTION_CHARS} characters"
                )));
            }
            if self.content.is_empty() {
                return Err(Error::InvalidSubmission(String::from(
                    "publishing requires at least one content block",
                )));
            }
            if self.tags.is_empty() || self.tags.len() > MAX_BLOG_TAGS {
                return Err(Error::InvalidSubmission(format!(
                    "publishing requires 1 to {MAX_BLOG_TAGS} tags"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, serde::Deserialize, serde::Serialize)]
pub struct LatestBlogsRequest {
    pub skip: usize,
}
