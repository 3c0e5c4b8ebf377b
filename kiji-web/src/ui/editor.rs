use kiji_client::api::{self, Block, BlogId, Uuid};
use yew::prelude::*;

use crate::LoginInfo;

#[derive(Clone, PartialEq, Properties)]
pub struct EditorProps {
    pub login: LoginInfo,
    pub on_saved: Callback<api::Blog>,
    pub on_error: Callback<String>,
}

pub struct Editor {
    /// Allocated once, so saving a draft and then publishing updates the
    /// same blog instead of creating a second one
    id: BlogId,
    title: String,
    description: String,
    tags: String,
    banner_url: String,
    body: String,
    saving: bool,
}

pub enum EditorMsg {
    TitleChanged(String),
    DescriptionChanged(String),
    TagsChanged(String),
    BannerChanged(String),
    BodyChanged(String),
    Save { publish: bool },
    Saved(anyhow::Result<api::Blog>),
}

impl Component for Editor {
    type Message = EditorMsg;
    type Properties = EditorProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Editor {
            id: BlogId(Uuid::new_v4()),
            title: String::new(),
            description: String::new(),
            tags: String::new(),
            banner_url: String::new(),
            body: String::new(),
            saving: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            EditorMsg::TitleChanged(t) => self.title = t,
            EditorMsg::DescriptionChanged(d) => self.description = d,
            EditorMsg::TagsChanged(t) => self.tags = t,
            EditorMsg::BannerChanged(b) => self.banner_url = b,
            EditorMsg::BodyChanged(b) => self.body = b,
            EditorMsg::Save { publish } => {
                if self.saving {
                    return false;
                }
                let new = api::NewBlog {
                    id: self.id,
                    title: self.title.trim().to_string(),
                    description: self.description.trim().to_string(),
                    banner_url: self.banner_url.trim().to_string(),
                    content: parse_blocks(&self.body),
                    tags: self
                        .tags
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from)
                        .collect(),
                    is_draft: !publish,
                };
                if let Err(e) = new.validate() {
                    ctx.props().on_error.emit(format!("cannot save blog: {}", e));
                    return true;
                }
                self.saving = true;
                let login = ctx.props().login.clone();
                ctx.link().send_future(async move {
                    EditorMsg::Saved(crate::api::create_blog(&login, new).await)
                });
            }
            EditorMsg::Saved(res) => {
                self.saving = false;
                match res {
                    Ok(blog) => ctx.props().on_saved.emit(blog),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed saving blog: {}", e)),
                }
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        macro_rules! callback_for {
            ($msg:ident) => {
                ctx.link().callback(|e: web_sys::Event| {
                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                    EditorMsg::$msg(input.value())
                })
            };
        }
        html! {
            <div class="container py-4 editor">
                <h1>{ "Write" }</h1>
                <div class="input-group mb-3">
                    <label class="input-group-text" for="title">{ "Title" }</label>
                    <input
                        type="text"
                        class="form-control form-control-lg"
                        id="title"
                        value={ self.title.clone() }
                        onchange={ callback_for!(TitleChanged) }
                    />
                </div>
                <div class="input-group mb-3">
                    <label class="input-group-text" for="description">{ "Description" }</label>
                    <input
                        type="text"
                        class="form-control"
                        id="description"
                        placeholder="A couple of sentences shown in the blog list"
                        value={ self.description.clone() }
                        onchange={ callback_for!(DescriptionChanged) }
                    />
                </div>
                <div class="input-group mb-3">
                    <label class="input-group-text" for="tags">{ "Tags" }</label>
                    <input
                        type="text"
                        class="form-control"
                        id="tags"
                        placeholder="comma, separated"
                        value={ self.tags.clone() }
                        onchange={ callback_for!(TagsChanged) }
                    />
                </div>
                <div class="input-group mb-3">
                    <label class="input-group-text" for="banner">{ "Banner URL" }</label>
                    <input
                        type="url"
                        class="form-control"
                        id="banner"
                        placeholder="https://example.org/banner.jpg"
                        value={ self.banner_url.clone() }
                        onchange={ callback_for!(BannerChanged) }
                    />
                </div>
                <textarea
                    class="form-control mb-3 editor-body"
                    rows="15"
                    placeholder="Blocks are separated by blank lines. Start one with # for a heading or > for a quote."
                    value={ self.body.clone() }
                    onchange={ ctx.link().callback(|e: web_sys::Event| {
                        let input: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
                        EditorMsg::BodyChanged(input.value())
                    }) }
                >
                </textarea>
                <button
                    type="button"
                    class="btn btn-outline-secondary me-2"
                    disabled={ self.saving }
                    onclick={ ctx.link().callback(|_| EditorMsg::Save { publish: false }) }
                >
                    { "Save draft" }
                </button>
                <button
                    type="button"
                    class="btn btn-primary"
                    disabled={ self.saving }
                    onclick={ ctx.link().callback(|_| EditorMsg::Save { publish: true }) }
                >
                    { "Publish" }
                </button>
            </div>
        }
    }
}

// TODO: support image and fenced code blocks in the editor
fn parse_blocks(body: &str) -> Vec<Block> {
    body.split("\n\n")
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            if let Some(text) = chunk.strip_prefix("> ") {
                return Block::Quote(text.to_string());
            }
            let hashes = chunk.chars().take_while(|c| *c == '#').count();
            if (1..=6).contains(&hashes) {
                if let Some(text) = chunk.get(hashes..).and_then(|rest| rest.strip_prefix(' ')) {
                    return Block::Heading {
                        level: hashes as u8,
                        text: text.to_string(),
                    };
                }
            }
            Block::Paragraph(chunk.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_split_on_blank_lines() {
        let blocks = parse_blocks("# Title\n\nFirst paragraph,\nstill the same block.\n\n> Someone said this\n\n###### Deep heading\n\n####### Not a heading");
        assert_eq!(
            blocks,
            vec![
                Block::Heading {
                    level: 1,
                    text: String::from("Title"),
                },
                Block::Paragraph(String::from("First paragraph,\nstill the same block.")),
                Block::Quote(String::from("Someone said this")),
                Block::Heading {
                    level: 6,
                    text: String::from("Deep heading"),
                },
                Block::Paragraph(String::from("####### Not a heading")),
            ]
        );
    }

    #[test]
    fn empty_body_makes_no_blocks() {
        assert_eq!(parse_blocks(""), vec![]);
        assert_eq!(parse_blocks("\n\n  \n\n"), vec![]);
    }
}
