use std::collections::HashSet;

use kiji_client::api::{self, BlogId, CommentId, ReportReason, UserId};
use kiji_client::{CommentTree, LikeDelta};
use yew::prelude::*;

use crate::{ui, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct CommentSectionProps {
    pub login: LoginInfo,
    pub blog: BlogId,
    pub blog_author: UserId,
    pub on_error: Callback<String>,
}

pub struct CommentSection {
    tree: CommentTree,
    loading_roots: bool,
    loading_replies: HashSet<CommentId>,
    likes_in_flight: HashSet<CommentId>,
    deleting: HashSet<CommentId>,
    posting: bool,
}

pub enum CommentSectionMsg {
    LoadMoreRoots,
    ExpandReplies(CommentId),
    LoadMoreReplies(CommentId),
    CollapseReplies(CommentId),
    PostRoot(String),
    PostReply(CommentId, String),
    Delete(CommentId),
    ToggleLike(CommentId),
    Report(CommentId, ReportReason),

    // Completions carry the generation their request was initiated under;
    // anything initiated before the last reset must be dropped on arrival
    GotRoots(u64, anyhow::Result<api::CommentPage>),
    GotReplies(u64, CommentId, anyhow::Result<Vec<api::Comment>>),
    PostedRoot(u64, anyhow::Result<api::Comment>),
    PostedReply(u64, CommentId, anyhow::Result<api::Comment>),
    Deleted(u64, CommentId, anyhow::Result<()>),
    LikeSettled(u64, LikeDelta, anyhow::Result<()>),
    Reported(anyhow::Result<api::Report>),
}

impl CommentSection {
    fn load_more_roots(&mut self, ctx: &Context<Self>) {
        self.loading_roots = true;
        let login = ctx.props().login.clone();
        let generation = self.tree.generation();
        let req = api::CommentsRequest {
            blog: self.tree.blog(),
            skip: self.tree.loaded_roots(),
        };
        ctx.link().send_future(async move {
            CommentSectionMsg::GotRoots(generation, crate::api::fetch_comments(&login, req).await)
        });
    }

    fn fetch_replies(&mut self, ctx: &Context<Self>, parent: CommentId, skip: usize) {
        self.loading_replies.insert(parent);
        let login = ctx.props().login.clone();
        let generation = self.tree.generation();
        let req = api::RepliesRequest {
            comment: parent,
            skip,
        };
        ctx.link().send_future(async move {
            CommentSectionMsg::GotReplies(
                generation,
                parent,
                crate::api::fetch_replies(&login, req).await,
            )
        });
    }

    fn view_comment(&self, ctx: &Context<Self>, c: &kiji_client::Comment) -> Html {
        let id = c.id;
        let hidden_replies = c
            .children
            .len()
            .saturating_sub(self.tree.materialized_replies(id));
        html! {
            <ui::CommentItem
                comment={ c.clone() }
                me={ ctx.props().login.user.clone() }
                blog_author={ ctx.props().blog_author }
                like_in_flight={ self.likes_in_flight.contains(&id) }
                replies_loading={ self.loading_replies.contains(&id) }
                posting={ self.posting }
                { hidden_replies }
                on_toggle_like={ ctx.link().callback(move |_| CommentSectionMsg::ToggleLike(id)) }
                on_expand={ ctx.link().callback(move |_| CommentSectionMsg::ExpandReplies(id)) }
                on_collapse={ ctx.link().callback(move |_| CommentSectionMsg::CollapseReplies(id)) }
                on_load_more_replies={ ctx.link().callback(move |_| CommentSectionMsg::LoadMoreReplies(id)) }
                on_reply={ ctx.link().callback(move |text| CommentSectionMsg::PostReply(id, text)) }
                on_delete={ ctx.link().callback(move |_| CommentSectionMsg::Delete(id)) }
                on_report={ ctx.link().callback(move |reason| CommentSectionMsg::Report(id, reason)) }
            />
        }
    }
}

impl Component for CommentSection {
    type Message = CommentSectionMsg;
    type Properties = CommentSectionProps;

    fn create(ctx: &Context<Self>) -> Self {
        let mut this = CommentSection {
            tree: CommentTree::new(ctx.props().blog),
            loading_roots: false,
            loading_replies: HashSet::new(),
            likes_in_flight: HashSet::new(),
            deleting: HashSet::new(),
            posting: false,
        };
        this.load_more_roots(ctx);
        this
    }

    fn changed(&mut self, ctx: &Context<Self>, _old_props: &Self::Properties) -> bool {
        if ctx.props().blog != self.tree.blog() {
            self.tree.reset(ctx.props().blog);
            self.loading_roots = false;
            self.loading_replies.clear();
            self.likes_in_flight.clear();
            self.deleting.clear();
            self.posting = false;
            self.load_more_roots(ctx);
        }
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            CommentSectionMsg::LoadMoreRoots => {
                if self.loading_roots {
                    return false;
                }
                self.load_more_roots(ctx);
            }
            CommentSectionMsg::ExpandReplies(target) => {
                if self.loading_replies.contains(&target) {
                    return false;
                }
                // re-expanding starts over from the first page of replies
                if let Some(c) = self.tree.comment(target) {
                    if c.replies_expanded {
                        self.tree.collapse_replies(target);
                    }
                }
                self.fetch_replies(ctx, target, 0);
            }
            CommentSectionMsg::LoadMoreReplies(target) => {
                if self.loading_replies.contains(&target) {
                    return false;
                }
                let skip = self.tree.materialized_replies(target);
                self.fetch_replies(ctx, target, skip);
            }
            CommentSectionMsg::CollapseReplies(target) => {
                self.tree.collapse_replies(target);
            }
            CommentSectionMsg::PostRoot(text) => {
                if self.posting {
                    return false;
                }
                let new = api::NewComment {
                    blog: self.tree.blog(),
                    replying_to: None,
                    text,
                };
                if let Err(e) = new.validate() {
                    ctx.props().on_error.emit(format!("cannot post comment: {}", e));
                    return true;
                }
                self.posting = true;
                let login = ctx.props().login.clone();
                let generation = self.tree.generation();
                ctx.link().send_future(async move {
                    CommentSectionMsg::PostedRoot(
                        generation,
                        crate::api::add_comment(&login, new).await,
                    )
                });
            }
            CommentSectionMsg::PostReply(parent, text) => {
                if self.posting {
                    return false;
                }
                let new = api::NewComment {
                    blog: self.tree.blog(),
                    replying_to: Some(parent),
                    text,
                };
                if let Err(e) = new.validate() {
                    ctx.props().on_error.emit(format!("cannot post reply: {}", e));
                    return true;
                }
                self.posting = true;
                let login = ctx.props().login.clone();
                let generation = self.tree.generation();
                ctx.link().send_future(async move {
                    CommentSectionMsg::PostedReply(
                        generation,
                        parent,
                        crate::api::add_comment(&login, new).await,
                    )
                });
            }
            CommentSectionMsg::Delete(target) => {
                if self.deleting.contains(&target) {
                    return false;
                }
                // the list only changes once the backend has confirmed the deletion
                self.deleting.insert(target);
                let login = ctx.props().login.clone();
                let generation = self.tree.generation();
                ctx.link().send_future(async move {
                    CommentSectionMsg::Deleted(
                        generation,
                        target,
                        crate::api::delete_comment(&login, target).await,
                    )
                });
            }
            CommentSectionMsg::ToggleLike(target) => {
                if self.likes_in_flight.contains(&target) {
                    return false;
                }
                let delta = match self.tree.apply_like(target, ctx.props().login.user.id) {
                    Some(delta) => delta,
                    None => return false,
                };
                self.likes_in_flight.insert(target);
                let login = ctx.props().login.clone();
                let generation = self.tree.generation();
                ctx.link().send_future(async move {
                    CommentSectionMsg::LikeSettled(
                        generation,
                        delta,
                        crate::api::toggle_comment_like(&login, target).await,
                    )
                });
            }
            CommentSectionMsg::Report(target, reason) => {
                let new = api::NewReport {
                    target: api::ReportTarget::Comment(target),
                    reason,
                    details: String::new(),
                };
                let login = ctx.props().login.clone();
                ctx.link().send_future(async move {
                    CommentSectionMsg::Reported(crate::api::submit_report(&login, new).await)
                });
            }

            CommentSectionMsg::GotRoots(generation, res) => {
                if generation != self.tree.generation() {
                    tracing::debug!("dropping a stale comment page");
                    return false;
                }
                self.loading_roots = false;
                match res {
                    Ok(page) => self.tree.append_root_page(page),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed loading comments: {}", e)),
                }
            }
            CommentSectionMsg::GotReplies(generation, parent, res) => {
                if generation != self.tree.generation() {
                    tracing::debug!("dropping a stale replies page");
                    return false;
                }
                self.loading_replies.remove(&parent);
                match res {
                    Ok(replies) => self.tree.insert_replies(parent, replies),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed loading replies: {}", e)),
                }
            }
            CommentSectionMsg::PostedRoot(generation, res) => {
                if generation != self.tree.generation() {
                    tracing::debug!("dropping a stale comment submission");
                    return false;
                }
                self.posting = false;
                match res {
                    Ok(comment) => self.tree.prepend_root(comment),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed posting comment: {}", e)),
                }
            }
            CommentSectionMsg::PostedReply(generation, parent, res) => {
                if generation != self.tree.generation() {
                    tracing::debug!("dropping a stale reply submission");
                    return false;
                }
                self.posting = false;
                match res {
                    Ok(comment) => self.tree.insert_reply(parent, comment),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed posting reply: {}", e)),
                }
            }
            CommentSectionMsg::Deleted(generation, target, res) => {
                if generation != self.tree.generation() {
                    tracing::debug!("dropping a stale deletion result");
                    return false;
                }
                self.deleting.remove(&target);
                match res {
                    Ok(()) => self.tree.remove(target),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed deleting comment: {}", e)),
                }
            }
            CommentSectionMsg::LikeSettled(generation, delta, res) => {
                if generation != self.tree.generation() {
                    tracing::debug!("dropping a stale like completion");
                    return false;
                }
                self.likes_in_flight.remove(&delta.comment);
                if let Err(e) = res {
                    self.tree.rollback_like(&delta);
                    ctx.props()
                        .on_error
                        .emit(format!("failed updating like: {}", e));
                }
            }
            CommentSectionMsg::Reported(res) => match res {
                Ok(_) => tracing::info!("comment reported"),
                Err(e) => ctx
                    .props()
                    .on_error
                    .emit(format!("failed reporting comment: {}", e)),
            },
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let heading = match self.tree.total_roots() {
            1 => String::from("1 comment"),
            n => format!("{} comments", n),
        };
        html! {
            <div class="comments mt-4">
                <h2>{ heading }</h2>
                <CommentEditor
                    placeholder="Add a comment..."
                    busy={ self.posting }
                    on_submit={ ctx.link().callback(CommentSectionMsg::PostRoot) }
                />
                <ul class="list-group list-group-flush">
                    { for self.tree.entries().iter().map(|c| self.view_comment(ctx, c)) }
                </ul>
                { for self.tree.has_more_roots().then(|| html! {
                    <button
                        type="button"
                        class="btn btn-outline-secondary mt-2"
                        disabled={ self.loading_roots }
                        onclick={ ctx.link().callback(|_| CommentSectionMsg::LoadMoreRoots) }
                    >
                        { match self.loading_roots {
                            true => "Loading...",
                            false => "Load more comments",
                        } }
                    </button>
                }) }
            </div>
        }
    }
}

#[derive(Clone, PartialEq, Properties)]
struct CommentEditorProps {
    placeholder: AttrValue,
    busy: bool,
    on_submit: Callback<String>,
}

#[function_component(CommentEditor)]
fn comment_editor(p: &CommentEditorProps) -> Html {
    let box_ref = use_node_ref();
    let on_click = {
        let box_ref = box_ref.clone();
        p.on_submit.reform(move |_| {
            let elt = box_ref
                .cast::<web_sys::HtmlTextAreaElement>()
                .expect("comment box is not a textarea element");
            let text = elt.value();
            elt.set_value("");
            text
        })
    };
    html! {
        <div class="d-flex my-2">
            <textarea
                ref={ box_ref.clone() }
                class="form-control me-2"
                rows="2"
                placeholder={ p.placeholder.clone() }
                disabled={ p.busy }
            >
            </textarea>
            <button
                type="button"
                class="btn btn-primary"
                disabled={ p.busy }
                onclick={ on_click }
            >
                { "Post" }
            </button>
        </div>
    }
}
