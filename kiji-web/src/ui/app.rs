use std::collections::VecDeque;
use std::rc::Rc;

use futures::channel::oneshot;
use kiji_client::api::{self, BlogId, DirectMessage, Notification, User};
use kiji_client::Session;
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::{ui, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct AppProps {
    pub login: LoginInfo,
    pub on_logout: Callback<()>,
}

pub enum AppMsg {
    Logout,

    WebsocketConnected,
    WebsocketDisconnected,
    ReceivedNotifications(Vec<Notification>),
    NetworkMessage(api::FeedMessage),

    Navigate(View),
    BlogSaved(api::Blog),
    ShowError(String),
    DismissError(u64),
    MarkNotificationsSeen,
}

#[derive(Clone, Debug, PartialEq)]
pub enum View {
    Home,
    Blog(BlogId),
    Editor,
    Messages(Option<User>),
    Moderation,
}

#[derive(Clone, PartialEq)]
pub enum ConnState {
    Disconnected,
    /// Connected but the notification backlog is not in yet; pushes received
    /// in the meantime are buffered here
    WebsocketConnected(VecDeque<api::FeedMessage>),
    Connected,
}

pub struct App {
    session: Session,
    connection_state: ConnState,
    view: View,
    errors: Vec<(u64, String)>,
    next_error_id: u64,
    last_message: Option<Rc<DirectMessage>>,
    feed_canceller: oneshot::Receiver<()>,
}

impl App {
    fn apply_network_message(&mut self, msg: api::FeedMessage) {
        match msg {
            // pongs are consumed by the feed loop itself
            api::FeedMessage::Pong => (),
            api::FeedMessage::Notification(n) => self.session.add_notification(n),
            api::FeedMessage::Message(m) => {
                if !matches!(self.view, View::Messages(_)) {
                    self.session.note_message_received();
                }
                self.last_message = Some(Rc::new(m));
            }
        }
    }

    fn show_error(&mut self, message: String) {
        tracing::error!("{}", message);
        self.errors.push((self.next_error_id, message));
        self.next_error_id += 1;
    }
}

impl Component for App {
    type Message = AppMsg;
    type Properties = AppProps;

    fn create(ctx: &Context<Self>) -> Self {
        // Connect to the websocket feed
        let feed_sender = ctx.link().clone();
        let (cancel, feed_canceller) = oneshot::channel();
        spawn_local(crate::api::start_feed(
            ctx.props().login.clone(),
            feed_sender,
            cancel,
        ));

        App {
            session: Session::new(ctx.props().login.user.clone()),
            connection_state: ConnState::Disconnected,
            view: View::Home,
            errors: Vec::new(),
            next_error_id: 0,
            last_message: None,
            feed_canceller,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            AppMsg::Logout => {
                // the feed loop watches this channel and closes the socket
                self.feed_canceller.close();
                let login = ctx.props().login.clone();
                spawn_local(crate::api::unauth(login.host, login.token));
                ctx.props().on_logout.emit(());
            }
            AppMsg::WebsocketConnected => {
                self.connection_state = ConnState::WebsocketConnected(VecDeque::new());
            }
            AppMsg::WebsocketDisconnected => {
                self.connection_state = ConnState::Disconnected;
            }
            AppMsg::ReceivedNotifications(notifications) => {
                self.session.set_notifications(notifications);
                let buffered = match &mut self.connection_state {
                    ConnState::WebsocketConnected(buf) => std::mem::take(buf),
                    _ => {
                        tracing::warn!("received notifications while websocket is not connected");
                        VecDeque::new()
                    }
                };
                for msg in buffered {
                    self.apply_network_message(msg);
                }
                self.connection_state = ConnState::Connected;
            }
            AppMsg::NetworkMessage(msg) => match &mut self.connection_state {
                ConnState::WebsocketConnected(buf) => buf.push_back(msg),
                _ => self.apply_network_message(msg),
            },
            AppMsg::Navigate(view) => {
                if matches!(view, View::Messages(_)) {
                    self.session.clear_unread_messages();
                }
                self.view = view;
            }
            AppMsg::BlogSaved(blog) => match blog.is_draft {
                // keep the editor open so writing can continue
                true => tracing::info!("draft saved"),
                false => self.view = View::Blog(blog.id),
            },
            AppMsg::ShowError(message) => self.show_error(message),
            AppMsg::DismissError(id) => self.errors.retain(|(i, _)| *i != id),
            AppMsg::MarkNotificationsSeen => {
                if self.session.unseen_notifications() == 0 {
                    return false;
                }
                self.session.mark_all_seen();
                let login = ctx.props().login.clone();
                spawn_local(async move {
                    if let Err(e) = crate::api::mark_notifications_seen(&login).await {
                        tracing::error!("failed marking notifications seen: {:?}", e);
                    }
                });
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let login = &ctx.props().login;
        let on_error = ctx.link().callback(AppMsg::ShowError);
        let main = match &self.view {
            View::Home => html! {
                <ui::BlogList
                    login={ login.clone() }
                    on_open={ ctx.link().callback(|blog| AppMsg::Navigate(View::Blog(blog))) }
                    on_error={ on_error.clone() }
                />
            },
            View::Blog(blog) => html! {
                <ui::BlogPage
                    login={ login.clone() }
                    blog={ *blog }
                    on_message_author={ ctx.link().callback(|author| {
                        AppMsg::Navigate(View::Messages(Some(author)))
                    }) }
                    on_error={ on_error.clone() }
                />
            },
            View::Editor => html! {
                <ui::Editor
                    login={ login.clone() }
                    on_saved={ ctx.link().callback(AppMsg::BlogSaved) }
                    on_error={ on_error.clone() }
                />
            },
            View::Messages(initial) => html! {
                <ui::MessagesView
                    login={ login.clone() }
                    initial={ initial.clone() }
                    incoming={ self.last_message.clone() }
                    on_error={ on_error.clone() }
                />
            },
            View::Moderation => html! {
                <ui::ModerationQueue
                    login={ login.clone() }
                    on_goto_blog={ ctx.link().callback(|blog| AppMsg::Navigate(View::Blog(blog))) }
                    on_error={ on_error.clone() }
                />
            },
        };
        html! {
            <div class="app d-flex flex-column vh-100">
                <ui::OfflineBanner connection_state={ self.connection_state.clone() } />
                <nav class="navbar navbar-expand bg-body-tertiary px-3">
                    <a
                        class="navbar-brand"
                        href="#"
                        onclick={ ctx.link().callback(|_| AppMsg::Navigate(View::Home)) }
                    >
                        { "Kiji" }
                    </a>
                    <div class="navbar-nav">
                        <a
                            class="nav-link"
                            href="#"
                            onclick={ ctx.link().callback(|_| AppMsg::Navigate(View::Editor)) }
                        >
                            { "Write" }
                        </a>
                        <a
                            class="nav-link"
                            href="#"
                            onclick={ ctx.link().callback(|_| AppMsg::Navigate(View::Messages(None))) }
                        >
                            { "Messages" }
                            { for (self.session.unread_messages > 0).then(|| html! {
                                <span class="badge rounded-pill text-bg-danger ms-1">
                                    { self.session.unread_messages }
                                </span>
                            }) }
                        </a>
                        { for login.user.is_moderator.then(|| html! {
                            <a
                                class="nav-link"
                                href="#"
                                onclick={ ctx.link().callback(|_| AppMsg::Navigate(View::Moderation)) }
                            >
                                { "Moderation" }
                            </a>
                        }) }
                    </div>
                    <div class="ms-auto d-flex align-items-center">
                        <ui::NotificationsMenu
                            notifications={ self.session.notifications.clone() }
                            unseen={ self.session.unseen_notifications() }
                            on_opened={ ctx.link().callback(|_| AppMsg::MarkNotificationsSeen) }
                            on_goto_blog={ ctx.link().callback(|blog| AppMsg::Navigate(View::Blog(blog))) }
                        />
                        <span class="me-2">{ &login.user.display_name }</span>
                        <button
                            type="button"
                            class="btn btn-outline-secondary"
                            onclick={ ctx.link().callback(|_| AppMsg::Logout) }
                        >
                            { "Logout" }
                        </button>
                    </div>
                </nav>
                <main class="flex-fill overflow-auto">
                    { main }
                </main>
                <ui::ErrorToast
                    errors={ self.errors.clone() }
                    on_dismiss={ ctx.link().callback(AppMsg::DismissError) }
                />
            </div>
        }
    }
}
