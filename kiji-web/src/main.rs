use gloo_storage::{LocalStorage, Storage};
use kiji_client::api::{AuthToken, User};
use yew::prelude::*;

mod api;
mod ui;
mod util;

fn main() {
    tracing_wasm::set_as_global_default();
    yew::Renderer::<Root>::new().render();
}

lazy_static::lazy_static! {
    pub static ref CLIENT: reqwest_middleware::ClientWithMiddleware = {
        let retry_policy = reqwest_retry::policies::ExponentialBackoff::builder()
            .build_with_max_retries(3);
        reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
            .with(reqwest_retry::RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    };
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LoginInfo {
    pub host: String,
    pub user: User,
    pub token: AuthToken,
}

enum RootMsg {
    LoggedIn(LoginInfo),
    LoggedOut,
}

struct Root {
    login: Option<LoginInfo>,
    logout: Option<LoginInfo>, // info saved from login info
}

impl Component for Root {
    type Message = RootMsg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Root {
            login: LocalStorage::get("login").ok(),
            logout: None,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            RootMsg::LoggedIn(login) => {
                LocalStorage::set("login", &login)
                    .expect("failed saving login info to LocalStorage");
                self.login = Some(login);
            }
            RootMsg::LoggedOut => {
                LocalStorage::delete("login");
                self.logout = self.login.take();
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        match &self.login {
            None => html! {
                <div class="container">
                    <ui::Login
                        info={ self.logout.clone() }
                        on_login={ ctx.link().callback(RootMsg::LoggedIn) }
                    />
                </div>
            },
            Some(login) => html! {
                <ui::App
                    login={ login.clone() }
                    on_logout={ ctx.link().callback(|_| RootMsg::LoggedOut) }
                />
            },
        }
    }
}
