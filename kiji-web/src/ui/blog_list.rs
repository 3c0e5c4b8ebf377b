use kiji_client::api::{self, Blog, BlogId, BLOG_PAGE_SIZE};
use yew::prelude::*;

use crate::{util, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct BlogListProps {
    pub login: LoginInfo,
    pub on_open: Callback<BlogId>,
    pub on_error: Callback<String>,
}

pub struct BlogList {
    blogs: Vec<Blog>,
    loading: bool,
    has_more: bool,
}

pub enum BlogListMsg {
    LoadMore,
    Got(anyhow::Result<Vec<Blog>>),
}

impl BlogList {
    fn load_more(&mut self, ctx: &Context<Self>) {
        self.loading = true;
        let login = ctx.props().login.clone();
        let req = api::LatestBlogsRequest {
            skip: self.blogs.len(),
        };
        ctx.link().send_future(async move {
            BlogListMsg::Got(crate::api::latest_blogs(&login, req).await)
        });
    }
}

impl Component for BlogList {
    type Message = BlogListMsg;
    type Properties = BlogListProps;

    fn create(ctx: &Context<Self>) -> Self {
        let mut this = BlogList {
            blogs: Vec::new(),
            loading: false,
            has_more: true,
        };
        this.load_more(ctx);
        this
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            BlogListMsg::LoadMore => {
                if self.loading {
                    return false;
                }
                self.load_more(ctx);
            }
            BlogListMsg::Got(res) => {
                self.loading = false;
                match res {
                    Ok(page) => {
                        // a short page means the backend ran out of blogs
                        self.has_more = page.len() >= BLOG_PAGE_SIZE;
                        self.blogs.extend(page);
                    }
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed loading blogs: {}", e)),
                }
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container py-4">
                <h1>{ "Latest blogs" }</h1>
                { for (self.blogs.is_empty() && !self.loading).then(|| html! {
                    <p class="text-muted">{ "Nothing published yet" }</p>
                }) }
                <div class="row">
                    { for self.blogs.iter().map(|b| blog_card(b, &ctx.props().on_open)) }
                </div>
                { for self.has_more.then(|| html! {
                    <button
                        type="button"
                        class="btn btn-outline-secondary"
                        disabled={ self.loading }
                        onclick={ ctx.link().callback(|_| BlogListMsg::LoadMore) }
                    >
                        { match self.loading {
                            true => "Loading...",
                            false => "Load more",
                        } }
                    </button>
                }) }
            </div>
        }
    }
}

fn blog_card(b: &Blog, on_open: &Callback<BlogId>) -> Html {
    let id = b.id;
    html! {
        <div class="col-md-6 col-lg-4 mb-3">
            <div class="card h-100 blog-card" onclick={ on_open.reform(move |_| id) }>
                { for (!b.banner_url.is_empty()).then(|| html! {
                    <img class="card-img-top" src={ b.banner_url.clone() } alt="" />
                }) }
                <div class="card-body">
                    <h5 class="card-title">{ &b.title }</h5>
                    <h6 class="card-subtitle mb-2 text-muted">
                        { format!("by {}, {}", b.author.display_name, util::relative_time(b.published_at)) }
                    </h6>
                    <p class="card-text">{ &b.description }</p>
                    { for b.tags.iter().map(|t| html! {
                        <span class="badge text-bg-secondary me-1">{ t }</span>
                    }) }
                </div>
                <div class="card-footer text-muted">
                    <span class="bi-heart me-3">{ format!(" {}", b.stats.total_likes) }</span>
                    <span class="bi-chat me-3">{ format!(" {}", b.stats.total_comments) }</span>
                    <span class="bi-eye">{ format!(" {}", b.stats.total_reads) }</span>
                </div>
            </div>
        </div>
    }
}
