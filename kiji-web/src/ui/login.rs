use kiji_client::api;
use yew::prelude::*;

use crate::LoginInfo;

#[derive(Clone, PartialEq, Properties)]
pub struct LoginProps {
    pub info: Option<LoginInfo>,
    pub on_login: Callback<LoginInfo>,
}

pub struct Login {
    host: String,
    user: String,
    pass: String,
    connecting: bool,
    error: Option<String>,
}

pub enum LoginMsg {
    HostChanged(String),
    UserChanged(String),
    PassChanged(String),
    SubmitClicked,
    AuthFailed(String),
    AuthSucceeded(LoginInfo),
}

impl Component for Login {
    type Message = LoginMsg;
    type Properties = LoginProps;

    fn create(ctx: &Context<Self>) -> Self {
        let (host, user) = match &ctx.props().info {
            Some(i) => (i.host.clone(), i.user.username.clone()),
            None => (String::new(), String::new()),
        };
        Login {
            host,
            user,
            pass: String::new(),
            connecting: false,
            error: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            LoginMsg::HostChanged(h) => self.host = h,
            LoginMsg::UserChanged(u) => self.user = u,
            LoginMsg::PassChanged(p) => self.pass = p,
            LoginMsg::SubmitClicked => {
                if self.connecting {
                    return false;
                }
                self.connecting = true;
                self.error = None;
                let host = self.host.trim_end_matches('/').to_string();
                // TODO: hash the password client-side before sending
                let session = api::NewSession {
                    user: self.user.clone(),
                    password: self.pass.clone(),
                    device: whoami::devicename(),
                };
                ctx.link().send_future(async move {
                    match crate::api::auth(host.clone(), session).await {
                        Err(e) => LoginMsg::AuthFailed(format!("failed connecting: {}", e)),
                        Ok(token) => match crate::api::whoami(&host, token).await {
                            Err(e) => LoginMsg::AuthFailed(format!("failed connecting: {}", e)),
                            Ok(user) => LoginMsg::AuthSucceeded(LoginInfo { host, user, token }),
                        },
                    }
                });
            }
            LoginMsg::AuthFailed(e) => {
                self.connecting = false;
                self.error = Some(e);
            }
            LoginMsg::AuthSucceeded(info) => {
                self.connecting = false;
                ctx.props().on_login.emit(info);
                return false;
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        macro_rules! callback_for {
            ($msg:ident) => {
                ctx.link().callback(|e: web_sys::Event| {
                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                    LoginMsg::$msg(input.value())
                })
            };
        }
        let error = self.error.as_ref().map(|e| {
            html! {
                <div class="alert alert-danger" role="alert">{ e }</div>
            }
        });
        html! {<>
            <div class="text-center my-4">
                <h1>{ "Kiji" }</h1>
            </div>
            { for error }
            <form class="login-form">
                <div class="input-group mb-3">
                    <label class="input-group-text col-xl-1" for="host">{ "Host" }</label>
                    <input
                        type="url"
                        class="form-control form-control-lg"
                        id="host"
                        placeholder="https://example.org"
                        value={self.host.clone()}
                        onchange={callback_for!(HostChanged)}
                    />
                </div>
                <div class="input-group mb-3">
                    <label class="input-group-text col-xl-1" for="user">{ "Username" }</label>
                    <input
                        type="text"
                        class="form-control form-control-lg"
                        id="user"
                        placeholder="user"
                        value={self.user.clone()}
                        onchange={callback_for!(UserChanged)}
                    />
                </div>
                <div class="input-group mb-3">
                    <label class="input-group-text col-xl-1" for="pass">{ "Password" }</label>
                    <input
                        type="password"
                        class="form-control form-control-lg"
                        id="pass"
                        placeholder="pass"
                        value={self.pass.clone()}
                        onchange={callback_for!(PassChanged)}
                    />
                </div>
                <button
                    type="submit"
                    class="btn btn-primary"
                    disabled={self.connecting}
                    onclick={ctx.link().callback(|e: web_sys::MouseEvent| {
                        e.prevent_default();
                        LoginMsg::SubmitClicked
                    })}
                >
                    { match self.connecting {
                        true => "Connecting...",
                        false => "Connect",
                    } }
                </button>
            </form>
        </>}
    }
}
