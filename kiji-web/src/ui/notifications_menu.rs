use kiji_client::api::{BlogId, Notification, NotificationKind};
use yew::prelude::*;

use crate::util;

#[derive(Clone, PartialEq, Properties)]
pub struct NotificationsMenuProps {
    /// Newest first
    pub notifications: Vec<Notification>,
    pub unseen: usize,
    pub on_opened: Callback<()>,
    pub on_goto_blog: Callback<BlogId>,
}

#[function_component(NotificationsMenu)]
pub fn notifications_menu(p: &NotificationsMenuProps) -> Html {
    let badge = (p.unseen > 0).then(|| {
        html! {
            <span class="badge rounded-pill text-bg-danger">{ p.unseen }</span>
        }
    });
    html! {
        <div class="dropdown">
            <button
                type="button"
                class="btn btn-light btn-circle m-3 bi-btn bi-bell-fill fs-6"
                title="Notifications"
                data-bs-toggle="dropdown"
                onclick={ p.on_opened.reform(|_| ()) }
            >
                { for badge }
            </button>
            <ul class="dropdown-menu dropdown-menu-dark dropdown-menu-end mt-3 notifications-list">
                { for p.notifications.iter().map(|n| notification_item(p, n)) }
                { for p.notifications.is_empty().then(|| html! {
                    <li><span class="dropdown-item-text">{ "Nothing yet" }</span></li>
                }) }
            </ul>
        </div>
    }
}

fn notification_item(p: &NotificationsMenuProps, n: &Notification) -> Html {
    let text = match &n.kind {
        NotificationKind::BlogLiked(_) => format!("{} liked your blog", n.actor.display_name),
        NotificationKind::NewComment { .. } => {
            format!("{} commented on your blog", n.actor.display_name)
        }
        NotificationKind::NewReply { .. } => {
            format!("{} replied to your comment", n.actor.display_name)
        }
        NotificationKind::NewFollower => format!("{} followed you", n.actor.display_name),
    };
    let target = match &n.kind {
        NotificationKind::BlogLiked(blog) => Some(*blog),
        NotificationKind::NewComment { blog, .. } => Some(*blog),
        NotificationKind::NewReply { blog, .. } => Some(*blog),
        NotificationKind::NewFollower => None,
    };
    let onclick = target.map(|blog| p.on_goto_blog.reform(move |_| blog));
    html! {
        <li><a class={ classes!("dropdown-item", (!n.seen).then(|| "fw-bold")) } href="#" {onclick}>
            { text }
            <span class="ms-2 text-muted">{ util::relative_time(n.created_at) }</span>
        </a></li>
    }
}
