use std::rc::Rc;

use kiji_client::api::{self, DirectMessage, User, UserId, MESSAGE_PAGE_SIZE};
use yew::prelude::*;

use crate::{util, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct MessagesViewProps {
    pub login: LoginInfo,
    /// Conversation to open right away, eg. from a "Message" button elsewhere
    pub initial: Option<User>,
    /// Latest direct message pushed over the feed
    pub incoming: Option<Rc<DirectMessage>>,
    pub on_error: Callback<String>,
}

pub struct MessagesView {
    conversations: Vec<User>,
    active: Option<User>,

    /// Newest first, the order pages arrive in
    messages: Vec<DirectMessage>,
    has_more: bool,
    loading: bool,
    sending: bool,
    compose_ref: NodeRef,
}

pub enum MessagesViewMsg {
    GotConversations(anyhow::Result<Vec<User>>),
    Open(UserId),
    GotPage(UserId, anyhow::Result<Vec<DirectMessage>>),
    LoadOlder,
    Send(String),
    Sent(anyhow::Result<DirectMessage>),
}

impl MessagesView {
    fn fetch_conversations(&self, ctx: &Context<Self>) {
        let login = ctx.props().login.clone();
        ctx.link().send_future(async move {
            MessagesViewMsg::GotConversations(crate::api::fetch_conversations(&login).await)
        });
    }

    fn fetch_page(&mut self, ctx: &Context<Self>, partner: UserId, skip: usize) {
        self.loading = true;
        let login = ctx.props().login.clone();
        let req = api::ConversationRequest {
            with: partner,
            skip,
        };
        ctx.link().send_future(async move {
            MessagesViewMsg::GotPage(partner, crate::api::fetch_conversation(&login, req).await)
        });
    }

    fn open(&mut self, ctx: &Context<Self>, partner: User) {
        let id = partner.id;
        self.active = Some(partner);
        self.messages.clear();
        self.has_more = true;
        self.sending = false;
        self.fetch_page(ctx, id, 0);
    }

    /// Reconnections can replay recent messages, so known ids are dropped
    fn push_message(&mut self, m: DirectMessage) {
        if self.messages.iter().any(|known| known.id == m.id) {
            return;
        }
        self.messages.insert(0, m);
    }
}

impl Component for MessagesView {
    type Message = MessagesViewMsg;
    type Properties = MessagesViewProps;

    fn create(ctx: &Context<Self>) -> Self {
        let mut this = MessagesView {
            conversations: Vec::new(),
            active: None,
            messages: Vec::new(),
            has_more: true,
            loading: false,
            sending: false,
            compose_ref: NodeRef::default(),
        };
        this.fetch_conversations(ctx);
        if let Some(partner) = ctx.props().initial.clone() {
            this.open(ctx, partner);
        }
        this
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        if ctx.props().initial != old_props.initial {
            if let Some(partner) = ctx.props().initial.clone() {
                self.open(ctx, partner);
            }
        }
        if ctx.props().incoming != old_props.incoming {
            if let Some(m) = &ctx.props().incoming {
                let for_active = match &self.active {
                    Some(partner) => m.from == partner.id || m.to == partner.id,
                    None => false,
                };
                if for_active {
                    self.push_message((**m).clone());
                }
                // sidebar ordering follows recency, let the backend re-rank
                self.fetch_conversations(ctx);
            }
        }
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            MessagesViewMsg::GotConversations(res) => match res {
                Ok(users) => self.conversations = users,
                Err(e) => ctx
                    .props()
                    .on_error
                    .emit(format!("failed loading conversations: {}", e)),
            },
            MessagesViewMsg::Open(partner) => {
                if self.active.as_ref().map(|u| u.id) == Some(partner) {
                    return false;
                }
                let partner = match self.conversations.iter().find(|u| u.id == partner) {
                    Some(u) => u.clone(),
                    None => return false,
                };
                self.open(ctx, partner);
            }
            MessagesViewMsg::GotPage(partner, res) => {
                if self.active.as_ref().map(|u| u.id) != Some(partner) {
                    tracing::debug!("dropping a stale conversation page");
                    return false;
                }
                self.loading = false;
                match res {
                    Ok(page) => {
                        self.has_more = page.len() >= MESSAGE_PAGE_SIZE;
                        for m in page {
                            // pushes may already have delivered the newest ones
                            if !self.messages.iter().any(|known| known.id == m.id) {
                                self.messages.push(m);
                            }
                        }
                    }
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed loading messages: {}", e)),
                }
            }
            MessagesViewMsg::LoadOlder => {
                if self.loading {
                    return false;
                }
                let partner = match &self.active {
                    Some(u) => u.id,
                    None => return false,
                };
                let skip = self.messages.len();
                self.fetch_page(ctx, partner, skip);
            }
            MessagesViewMsg::Send(text) => {
                if self.sending {
                    return false;
                }
                let to = match &self.active {
                    Some(u) => u.id,
                    None => return false,
                };
                let new = api::NewMessage { to, text };
                if let Err(e) = new.validate() {
                    ctx.props().on_error.emit(format!("cannot send message: {}", e));
                    return true;
                }
                self.sending = true;
                let login = ctx.props().login.clone();
                ctx.link().send_future(async move {
                    MessagesViewMsg::Sent(crate::api::send_message(&login, new).await)
                });
            }
            MessagesViewMsg::Sent(res) => {
                self.sending = false;
                match res {
                    Ok(m) => self.push_message(m),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed sending message: {}", e)),
                }
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container py-4 messages">
                <div class="row">
                    <div class="col-md-4 col-lg-3">
                        <h2>{ "Messages" }</h2>
                        <ul class="list-group">
                            { for self.conversations.iter().map(|u| {
                                let id = u.id;
                                let active = self.active.as_ref().map(|a| a.id) == Some(id);
                                html! {
                                    <li
                                        class={ classes!("list-group-item", active.then(|| "active")) }
                                        onclick={ ctx.link().callback(move |_| MessagesViewMsg::Open(id)) }
                                    >
                                        { &u.display_name }
                                        <span class="text-muted ms-1">{ format!("@{}", u.username) }</span>
                                    </li>
                                }
                            }) }
                            { for self.conversations.is_empty().then(|| html! {
                                <li class="list-group-item text-muted">{ "No conversations yet" }</li>
                            }) }
                        </ul>
                    </div>
                    <div class="col-md-8 col-lg-9">
                        { self.view_conversation(ctx) }
                    </div>
                </div>
            </div>
        }
    }
}

impl MessagesView {
    fn view_conversation(&self, ctx: &Context<Self>) -> Html {
        let partner = match &self.active {
            None => {
                return html! {
                    <p class="text-muted mt-5">{ "Pick a conversation" }</p>
                }
            }
            Some(u) => u,
        };
        let me = ctx.props().login.user.id;
        let onclick_send = {
            let compose_ref = self.compose_ref.clone();
            ctx.link().callback(move |_| {
                let elt = compose_ref
                    .cast::<web_sys::HtmlTextAreaElement>()
                    .expect("compose box is not a textarea element");
                let text = elt.value();
                elt.set_value("");
                MessagesViewMsg::Send(text)
            })
        };
        html! {
            <div class="conversation d-flex flex-column h-100">
                <h3>{ &partner.display_name }</h3>
                { for self.has_more.then(|| html! {
                    <button
                        type="button"
                        class="btn btn-sm btn-outline-secondary align-self-center mb-2"
                        disabled={ self.loading }
                        onclick={ ctx.link().callback(|_| MessagesViewMsg::LoadOlder) }
                    >
                        { match self.loading {
                            true => "Loading...",
                            false => "Load older messages",
                        } }
                    </button>
                }) }
                <div class="flex-fill">
                    { for self.messages.iter().rev().map(|m| {
                        let mine = m.from == me;
                        html! {
                            <div class={ classes!("message", "my-1", mine.then(|| "text-end")) }>
                                <span class={ classes!("badge", "fs-6", match mine {
                                    true => "text-bg-primary",
                                    false => "text-bg-secondary",
                                }) }>
                                    { &m.text }
                                </span>
                                <div class="text-muted small">{ util::relative_time(m.sent_at) }</div>
                            </div>
                        }
                    }) }
                </div>
                <div class="d-flex mt-2">
                    <textarea
                        ref={ self.compose_ref.clone() }
                        class="form-control me-2"
                        rows="2"
                        placeholder={ format!("Message @{}", partner.username) }
                    >
                    </textarea>
                    <button
                        type="button"
                        class="btn btn-primary"
                        disabled={ self.sending }
                        onclick={ onclick_send }
                    >
                        { "Send" }
                    </button>
                </div>
            </div>
        }
    }
}
