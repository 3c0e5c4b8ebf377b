use kiji_client::api::{ReportReason, User, UserId};
use kiji_client::Comment;
use yew::prelude::*;

use crate::util;

#[derive(Clone, PartialEq, Properties)]
pub struct CommentItemProps {
    pub comment: Comment,
    pub me: User,
    pub blog_author: UserId,
    pub like_in_flight: bool,
    pub replies_loading: bool,
    pub posting: bool,
    /// Direct replies known to the backend but not yet materialized below
    pub hidden_replies: usize,
    pub on_toggle_like: Callback<()>,
    pub on_expand: Callback<()>,
    pub on_collapse: Callback<()>,
    pub on_load_more_replies: Callback<()>,
    pub on_reply: Callback<String>,
    pub on_delete: Callback<()>,
    pub on_report: Callback<ReportReason>,
}

#[function_component(CommentItem)]
pub fn comment_item(p: &CommentItemProps) -> Html {
    let reply_open = use_state(|| false);
    let reply_ref = use_node_ref();

    let c = &p.comment;
    let may_delete = p.me.id == c.author.id || p.me.id == p.blog_author;

    let on_reply_submit = {
        let reply_open = reply_open.clone();
        let reply_ref = reply_ref.clone();
        p.on_reply.reform(move |_| {
            let elt = reply_ref
                .cast::<web_sys::HtmlTextAreaElement>()
                .expect("reply box is not a textarea element");
            let text = elt.value();
            elt.set_value("");
            reply_open.set(false);
            text
        })
    };

    html! {
        <li
            class="list-group-item comment d-flex flex-column"
            style={ format!("margin-left: {}em", 2 * c.depth) }
        >
            <div class="d-flex align-items-center">
                { for (!c.author.avatar_url.is_empty()).then(|| html! {
                    <img class="avatar rounded-circle me-2" src={ c.author.avatar_url.clone() } alt="" />
                }) }
                <span class="fw-bold me-1">{ &c.author.display_name }</span>
                <span class="text-muted me-2">{ format!("@{}", c.author.username) }</span>
                <span class="text-muted">{ util::relative_time(c.created_at) }</span>
            </div>
            <div class="comment-text my-1">{ &c.text }</div>
            <div class="d-flex align-items-center">
                { like_button(p) }
                <button
                    type="button"
                    class="btn btn-sm bi-btn bi-chat me-2"
                    aria-label="Reply"
                    onclick={
                        let reply_open = reply_open.clone();
                        Callback::from(move |_| reply_open.set(!*reply_open))
                    }
                >
                    { "Reply" }
                </button>
                { replies_controls(p) }
                { for may_delete.then(|| html! {
                    <button
                        type="button"
                        class="btn btn-sm bi-btn bi-trash me-2"
                        aria-label="Delete"
                        onclick={ p.on_delete.reform(|_| ()) }
                    >
                        { "Delete" }
                    </button>
                }) }
                { report_menu(&p.on_report) }
            </div>
            { for reply_open.then(|| html! {
                <div class="d-flex mt-2">
                    <textarea
                        ref={ reply_ref.clone() }
                        class="form-control me-2"
                        rows="2"
                        placeholder={ format!("Reply to @{}", c.author.username) }
                    >
                    </textarea>
                    <button
                        type="button"
                        class="btn btn-primary"
                        disabled={ p.posting }
                        onclick={ on_reply_submit }
                    >
                        { "Send" }
                    </button>
                </div>
            }) }
        </li>
    }
}

fn like_button(p: &CommentItemProps) -> Html {
    let liked = p.comment.liked_by_me(&p.me.id);
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
            class={ classes!("btn", "btn-sm", "bi-btn", icon_class, "me-2") }
            aria-label={ aria_label }
            disabled={ p.like_in_flight }
            onclick={ p.on_toggle_like.reform(|_| ()) }
        >
            { p.comment.like_count }
        </button>
    }
}

fn replies_controls(p: &CommentItemProps) -> Html {
    let c = &p.comment;
    if c.children.is_empty() {
        return html! {};
    }
    match c.replies_expanded {
        false => html! {
            <button
                type="button"
                class="btn btn-sm btn-link me-2"
                disabled={ p.replies_loading }
                onclick={ p.on_expand.reform(|_| ()) }
            >
                { match c.children.len() {
                    1 => String::from("Show 1 reply"),
                    n => format!("Show {} replies", n),
                } }
            </button>
        },
        true => html! {<>
            <button
                type="button"
                class="btn btn-sm btn-link me-2"
                onclick={ p.on_collapse.reform(|_| ()) }
            >
                { "Hide replies" }
            </button>
            { for (p.hidden_replies > 0).then(|| html! {
                <button
                    type="button"
                    class="btn btn-sm btn-link me-2"
                    disabled={ p.replies_loading }
                    onclick={ p.on_load_more_replies.reform(|_| ()) }
                >
                    { format!("Show {} more", p.hidden_replies) }
                </button>
            }) }
        </>},
    }
}

fn report_menu(on_report: &Callback<ReportReason>) -> Html {
    html! {
        <div class="dropdown">
            <button
                type="button"
                class="btn btn-sm bi-btn bi-flag"
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
                            onclick={ on_report.reform(move |_| reason) }
                        >
                            { *label }
                        </a></li>
                    }
                }) }
            </ul>
        </div>
    }
}
