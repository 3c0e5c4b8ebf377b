use kiji_client::api::{self, Block, BlogId, ReportReason, User};
use kiji_client::optimistic::{self, BlogDelta, BlogFlag};
use yew::prelude::*;

use crate::{ui, util, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct BlogPageProps {
    pub login: LoginInfo,
    pub blog: BlogId,
    pub on_message_author: Callback<User>,
    pub on_error: Callback<String>,
}

pub struct BlogPage {
    view: Option<api::BlogView>,
    like_in_flight: bool,
    bookmark_in_flight: bool,
    follow_in_flight: bool,
}

pub enum BlogPageMsg {
    // Loads and toggles carry the blog they were initiated against, so that
    // completions arriving after a navigation can be dropped
    Loaded(BlogId, anyhow::Result<api::BlogView>),
    Toggle(BlogFlag),
    Settled(BlogId, BlogDelta, anyhow::Result<()>),
    Report(ReportReason),
    Reported(anyhow::Result<api::Report>),
}

impl BlogPage {
    fn fetch(&mut self, ctx: &Context<Self>) {
        let login = ctx.props().login.clone();
        let blog = ctx.props().blog;
        ctx.link().send_future(async move {
            BlogPageMsg::Loaded(blog, crate::api::fetch_blog(&login, blog).await)
        });
    }
}

impl Component for BlogPage {
    type Message = BlogPageMsg;
    type Properties = BlogPageProps;

    fn create(ctx: &Context<Self>) -> Self {
        let mut this = BlogPage {
            view: None,
            like_in_flight: false,
            bookmark_in_flight: false,
            follow_in_flight: false,
        };
        this.fetch(ctx);
        this
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        if ctx.props().blog != old_props.blog {
            self.view = None;
            self.like_in_flight = false;
            self.bookmark_in_flight = false;
            self.follow_in_flight = false;
            self.fetch(ctx);
        }
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            BlogPageMsg::Loaded(blog, res) => {
                if blog != ctx.props().blog {
                    tracing::debug!("dropping a stale blog fetch");
                    return false;
                }
                match res {
                    Ok(view) => self.view = Some(view),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed loading blog: {}", e)),
                }
            }
            BlogPageMsg::Toggle(flag) => {
                let view = match &mut self.view {
                    Some(v) => v,
                    None => return false,
                };
                let in_flight = match flag {
                    BlogFlag::Liked => &mut self.like_in_flight,
                    BlogFlag::Bookmarked => &mut self.bookmark_in_flight,
                    BlogFlag::FollowingAuthor => &mut self.follow_in_flight,
                };
                if *in_flight {
                    return false;
                }
                *in_flight = true;
                let delta = optimistic::apply(view, flag);
                let blog = view.blog.id;
                let author = view.blog.author.id;
                let login = ctx.props().login.clone();
                ctx.link().send_future(async move {
                    let res = match flag {
                        BlogFlag::Liked => crate::api::toggle_blog_like(&login, blog).await,
                        BlogFlag::Bookmarked => crate::api::toggle_bookmark(&login, blog).await,
                        BlogFlag::FollowingAuthor => {
                            crate::api::toggle_follow(&login, author).await
                        }
                    };
                    BlogPageMsg::Settled(blog, delta, res)
                });
            }
            BlogPageMsg::Settled(blog, delta, res) => {
                if blog != ctx.props().blog {
                    tracing::debug!("dropping a stale toggle completion");
                    return false;
                }
                match delta.flag {
                    BlogFlag::Liked => self.like_in_flight = false,
                    BlogFlag::Bookmarked => self.bookmark_in_flight = false,
                    BlogFlag::FollowingAuthor => self.follow_in_flight = false,
                }
                if let Err(e) = res {
                    if let Some(view) = &mut self.view {
                        optimistic::rollback(view, &delta);
                    }
                    ctx.props()
                        .on_error
                        .emit(format!("failed updating the blog: {}", e));
                }
            }
            BlogPageMsg::Report(reason) => {
                let new = api::NewReport {
                    target: api::ReportTarget::Blog(ctx.props().blog),
                    reason,
                    details: String::new(),
                };
                let login = ctx.props().login.clone();
                ctx.link().send_future(async move {
                    BlogPageMsg::Reported(crate::api::submit_report(&login, new).await)
                });
            }
            BlogPageMsg::Reported(res) => match res {
                Ok(_) => tracing::info!("blog reported"),
                Err(e) => ctx
                    .props()
                    .on_error
                    .emit(format!("failed reporting blog: {}", e)),
            },
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let v = match &self.view {
            None => {
                return html! {
                    <div class="container py-4">
                        <div class="spinner-border" role="status"></div>
                    </div>
                }
            }
            Some(v) => v,
        };
        let blog = &v.blog;
        html! {
            <div class="container py-4 blog-page">
                { for (!blog.banner_url.is_empty()).then(|| html! {
                    <img class="img-fluid mb-3" src={ blog.banner_url.clone() } alt="" />
                }) }
                <h1>
                    { &blog.title }
                    { for blog.is_draft.then(|| html! {
                        <span class="badge text-bg-warning ms-2">{ "Draft" }</span>
                    }) }
                </h1>
                <div class="d-flex align-items-center mb-2">
                    { for (!blog.author.avatar_url.is_empty()).then(|| html! {
                        <img class="avatar rounded-circle me-2" src={ blog.author.avatar_url.clone() } alt="" />
                    }) }
                    <span class="fw-bold me-1">{ &blog.author.display_name }</span>
                    <span class="text-muted me-2">{ format!("@{}", blog.author.username) }</span>
                    <span class="text-muted me-3">{ util::relative_time(blog.published_at) }</span>
                    { for (blog.author.id != ctx.props().login.user.id).then(|| html! {
                        <>
                            { follow_button(ctx, v.following_author, self.follow_in_flight) }
                            { message_button(ctx, &blog.author) }
                        </>
                    }) }
                </div>
                <p class="lead">{ &blog.description }</p>
                <div class="blog-content">
                    { for blog.content.iter().map(block_view) }
                </div>
                <div>
                    { for blog.tags.iter().map(|t| html! {
                        <span class="badge text-bg-secondary me-1">{ t }</span>
                    }) }
                </div>
                <div class="d-flex align-items-center my-3">
                    { like_button(ctx, v.liked, blog.stats.total_likes, self.like_in_flight) }
                    { bookmark_button(ctx, v.bookmarked, self.bookmark_in_flight) }
                    <span class="text-muted me-3">{ format!("{} reads", blog.stats.total_reads) }</span>
                    { report_menu(ctx) }
                </div>
                <ui::CommentSection
                    login={ ctx.props().login.clone() }
                    blog={ blog.id }
                    blog_author={ blog.author.id }
                    on_error={ ctx.props().on_error.clone() }
                />
            </div>
        }
    }
}

fn block_view(b: &Block) -> Html {
    match b {
        Block::Paragraph(text) => html! { <p>{ text }</p> },
        Block::Heading { level, text } => {
            let tag = format!("h{}", (*level).clamp(1, 6));
            html! { <@{tag}>{ text }</@> }
        }
        Block::Image { url, caption } => html! {
            <figure class="figure">
                <img class="figure-img img-fluid" src={ url.clone() } alt={ caption.clone() } />
                <figcaption class="figure-caption">{ caption }</figcaption>
            </figure>
        },
        Block::Quote(text) => html! {
            <blockquote class="blockquote">{ text }</blockquote>
        },
        Block::Code { language, code } => html! {
            <pre><code class={ classes!(format!("language-{}", language)) }>{ code }</code></pre>
        },
    }
}

fn like_button(ctx: &Context<BlogPage>, liked: bool, count: u64, in_flight: bool) -> Html {
    let icon_class = match liked {
        true => "bi-heart-fill",
        false => "bi-heart",
    };
    let aria_label = match liked {
        true => "Remove like",
        false => "Like",
    };
    html! {
        <button
            type="button"
            class={ classes!("btn", "bi-btn", icon_class, "me-3") }
            aria-label={ aria_label }
            disabled={ in_flight }
            onclick={ ctx.link().callback(|_| BlogPageMsg::Toggle(BlogFlag::Liked)) }
        >
            { count }
        </button>
    }
}

fn bookmark_button(ctx: &Context<BlogPage>, bookmarked: bool, in_flight: bool) -> Html {
    let icon_class = match bookmarked {
        true => "bi-bookmark-fill",
        false => "bi-bookmark",
    };
    let aria_label = match bookmarked {
        true => "Remove bookmark",
        false => "Bookmark",
    };
    html! {
        <button
            type="button"
            class={ classes!("btn", "bi-btn", icon_class, "me-3") }
            aria-label={ aria_label }
            disabled={ in_flight }
            onclick={ ctx.link().callback(|_| BlogPageMsg::Toggle(BlogFlag::Bookmarked)) }
        >
        </button>
    }
}

fn follow_button(ctx: &Context<BlogPage>, following: bool, in_flight: bool) -> Html {
    html! {
        <button
            type="button"
            class={ classes!("btn", "btn-sm", match following {
                true => "btn-secondary",
                false => "btn-outline-secondary",
            }) }
            disabled={ in_flight }
            onclick={ ctx.link().callback(|_| BlogPageMsg::Toggle(BlogFlag::FollowingAuthor)) }
        >
            { match following {
                true => "Following",
                false => "Follow",
            } }
        </button>
    }
}

fn message_button(ctx: &Context<BlogPage>, author: &User) -> Html {
    let author = author.clone();
    html! {
        <button
            type="button"
            class="btn btn-sm btn-outline-secondary ms-2"
            onclick={ ctx.props().on_message_author.reform(move |_| author.clone()) }
        >
            { "Message" }
        </button>
    }
}

fn report_menu(ctx: &Context<BlogPage>) -> Html {
    html! {
        <div class="dropdown">
            <button
                type="button"
                class="btn bi-btn bi-flag"
                title="Report"
                data-bs-toggle="dropdown"
            >
            </button>
            <ul class="dropdown-menu">
                { for [
                    (ReportReason::Spam, "Spam"),
                    (ReportReason::Harassment, "Harassment"),
                    (ReportReason::Misinformation, "Misinformation"),
                    (ReportReason::Other, "Other"),
                ].iter().map(|(reason, label)| {
                    let reason = *reason;
                    html! {
                        <li><a
                            class="dropdown-item"
                            href="#"
                            onclick={ ctx.link().callback(move |_| BlogPageMsg::Report(reason)) }
                        >
                            { *label }
                        </a></li>
                    }
                }) }
            </ul>
        </div>
    }
}
