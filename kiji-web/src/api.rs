use chrono::Utc;
use futures::{channel::oneshot, pin_mut, select, FutureExt, SinkExt, StreamExt};
use kiji_client::api::{self, Time, Uuid};
use ws_stream_wasm::{WsMessage, WsMeta};

use crate::{ui, LoginInfo};

// TODO: make below chrono::Duration once https://github.com/chronotope/chrono/issues/309 is fixed
// Pings will be sent every PING_INTERVAL
const PING_INTERVAL_SECS: i64 = 10;
// If the interval between two pongs is more than DISCONNECT_INTERVAL, disconnect
const DISCONNECT_INTERVAL_SECS: i64 = 20;
// Space each reconnect attempt by ATTEMPT_SPACING
const ATTEMPT_SPACING_SECS: i64 = 1;

pub async fn auth(host: String, session: api::NewSession) -> anyhow::Result<api::AuthToken> {
    let resp = crate::CLIENT
        .post(format!("{}/api/auth", host))
        .json(&session)
        .send()
        .await?;
    Ok(check(resp).await?.json().await?)
}

pub async fn whoami(host: &str, token: api::AuthToken) -> anyhow::Result<api::User> {
    let resp = crate::CLIENT
        .get(format!("{}/api/whoami", host))
        .bearer_auth(token.0)
        .send()
        .await?;
    Ok(check(resp).await?.json().await?)
}

pub async fn unauth(host: String, token: api::AuthToken) {
    let resp = crate::CLIENT
        .post(format!("{}/api/unauth", host))
        .bearer_auth(token.0)
        .send()
        .await;
    match resp {
        Err(e) => tracing::error!("failed to unauth: {:?}", e),
        Ok(resp) if !resp.status().is_success() => {
            tracing::error!("failed to unauth: response is not success {:?}", resp)
        }
        Ok(_) => (),
    }
}

/// Turns a non-success response into the error the backend actually sent
async fn check(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.bytes().await?;
    match api::Error::parse(&body) {
        Ok(err) => Err(err.into()),
        Err(_) => Err(anyhow::anyhow!("got unexpected http status {}", status)),
    }
}

async fn get<R>(login: &LoginInfo, path: &str) -> anyhow::Result<R>
where
    R: for<'de> serde::Deserialize<'de>,
{
    let resp = crate::CLIENT
        .get(format!("{}/api/{}", login.host, path))
        .bearer_auth(login.token.0)
        .send()
        .await?;
    Ok(check(resp).await?.json().await?)
}

async fn post<B, R>(login: &LoginInfo, path: &str, body: &B) -> anyhow::Result<R>
where
    B: serde::Serialize,
    R: for<'de> serde::Deserialize<'de>,
{
    let resp = crate::CLIENT
        .post(format!("{}/api/{}", login.host, path))
        .bearer_auth(login.token.0)
        .json(body)
        .send()
        .await?;
    Ok(check(resp).await?.json().await?)
}

async fn post_unit<B>(login: &LoginInfo, path: &str, body: &B) -> anyhow::Result<()>
where
    B: serde::Serialize,
{
    let resp = crate::CLIENT
        .post(format!("{}/api/{}", login.host, path))
        .bearer_auth(login.token.0)
        .json(body)
        .send()
        .await?;
    check(resp).await?;
    Ok(())
}

pub async fn latest_blogs(
    login: &LoginInfo,
    req: api::LatestBlogsRequest,
) -> anyhow::Result<Vec<api::Blog>> {
    post(login, "latest-blogs", &req).await
}

pub async fn fetch_blog(login: &LoginInfo, blog: api::BlogId) -> anyhow::Result<api::BlogView> {
    get(login, &format!("blog/{}", blog.0)).await
}

pub async fn create_blog(login: &LoginInfo, new: api::NewBlog) -> anyhow::Result<api::Blog> {
    post(login, "create-blog", &new).await
}

pub async fn fetch_comments(
    login: &LoginInfo,
    req: api::CommentsRequest,
) -> anyhow::Result<api::CommentPage> {
    post(login, "fetch-comments", &req).await
}

pub async fn fetch_replies(
    login: &LoginInfo,
    req: api::RepliesRequest,
) -> anyhow::Result<Vec<api::Comment>> {
    post(login, "fetch-replies", &req).await
}

pub async fn add_comment(login: &LoginInfo, new: api::NewComment) -> anyhow::Result<api::Comment> {
    post(login, "add-comment", &new).await
}

pub async fn delete_comment(login: &LoginInfo, comment: api::CommentId) -> anyhow::Result<()> {
    post_unit(login, "delete-comment", &comment).await
}

pub async fn toggle_comment_like(
    login: &LoginInfo,
    comment: api::CommentId,
) -> anyhow::Result<()> {
    post_unit(login, "toggle-comment-like", &comment).await
}

pub async fn toggle_blog_like(login: &LoginInfo, blog: api::BlogId) -> anyhow::Result<()> {
    post_unit(login, "toggle-blog-like", &blog).await
}

pub async fn toggle_bookmark(login: &LoginInfo, blog: api::BlogId) -> anyhow::Result<()> {
    post_unit(login, "toggle-bookmark", &blog).await
}

pub async fn toggle_follow(login: &LoginInfo, user: api::UserId) -> anyhow::Result<()> {
    post_unit(login, "toggle-follow", &user).await
}

pub async fn fetch_notifications(login: &LoginInfo) -> anyhow::Result<Vec<api::Notification>> {
    get(login, "fetch-notifications").await
}

pub async fn mark_notifications_seen(login: &LoginInfo) -> anyhow::Result<()> {
    post_unit(login, "mark-notifications-seen", &()).await
}

pub async fn send_message(
    login: &LoginInfo,
    new: api::NewMessage,
) -> anyhow::Result<api::DirectMessage> {
    post(login, "send-message", &new).await
}

pub async fn fetch_conversations(login: &LoginInfo) -> anyhow::Result<Vec<api::User>> {
    get(login, "fetch-conversations").await
}

pub async fn fetch_conversation(
    login: &LoginInfo,
    req: api::ConversationRequest,
) -> anyhow::Result<Vec<api::DirectMessage>> {
    post(login, "fetch-conversation", &req).await
}

pub async fn submit_report(login: &LoginInfo, new: api::NewReport) -> anyhow::Result<api::Report> {
    post(login, "submit-report", &new).await
}

pub async fn fetch_open_reports(login: &LoginInfo) -> anyhow::Result<Vec<api::Report>> {
    get(login, "fetch-open-reports").await
}

pub async fn resolve_report(
    login: &LoginInfo,
    report: api::ReportId,
    status: api::ReportStatus,
) -> anyhow::Result<()> {
    post_unit(login, "resolve-report", &(report, status)).await
}

async fn sleep_for(d: chrono::Duration) {
    wasm_timer::Delay::new(d.to_std().unwrap_or(std::time::Duration::from_secs(0)))
        .await
        .expect("failed sleeping")
}

async fn sleep_until(t: Time) {
    sleep_for(t - Utc::now()).await
}

pub async fn start_feed(
    login: LoginInfo,
    feed_sender: yew::html::Scope<ui::App>,
    mut cancel: oneshot::Sender<()>,
) {
    let mut first_attempt = true;
    'reconnect: loop {
        match first_attempt {
            true => first_attempt = false,
            false => {
                tracing::warn!("lost feed connection");
                feed_sender.send_message(ui::AppMsg::WebsocketDisconnected);
                sleep_for(chrono::Duration::seconds(ATTEMPT_SPACING_SECS)).await;
            }
        }

        // Connect to websocket
        let ws_url = match login.host.strip_prefix("http") {
            Some(rest) => format!("ws{}/ws/feed", rest),
            None => {
                tracing::error!(host = %login.host, "host url does not start with http");
                return;
            }
        };
        let mut sock = match WsMeta::connect(ws_url, None).await {
            Ok((_, s)) => s,
            Err(_) => continue 'reconnect,
        };

        // Authentify
        let mut buf = Uuid::encode_buffer();
        let token: &str = login.token.0.as_hyphenated().encode_lower(&mut buf);
        if sock.send(WsMessage::Text(token.to_string())).await.is_err() {
            continue 'reconnect;
        }
        match sock.next().await {
            Some(WsMessage::Text(t)) if t == "ok" => (),
            Some(_) => {
                tracing::error!("feed authentication was refused");
                return;
            }
            None => continue 'reconnect,
        }
        tracing::info!("successfully authenticated to the feed");
        feed_sender.send_message(ui::AppMsg::WebsocketConnected);

        // Fetch the notification backlog; pushes received while this fetch is
        // in flight are buffered by the app
        match fetch_notifications(&login).await {
            Ok(notifications) => {
                feed_sender.send_message(ui::AppMsg::ReceivedNotifications(notifications))
            }
            Err(_) => continue 'reconnect,
        }

        // Finally, run the feed
        let mut next_ping = Utc::now();
        let mut last_pong = Utc::now();
        let mut sock = sock.fuse();
        let mut cancellation = cancel.cancellation().fuse();
        loop {
            let delay_pong_reception =
                sleep_until(last_pong + chrono::Duration::seconds(DISCONNECT_INTERVAL_SECS)).fuse();
            let delay_ping_send = sleep_until(next_ping).fuse();
            pin_mut!(delay_ping_send, delay_pong_reception);
            select! {
                _ = cancellation => {
                    if let Err(e) = sock.into_inner().close().await {
                        tracing::warn!("failed closing the feed socket: {:?}", e);
                    }
                    tracing::info!("disconnected from the feed");
                    return;
                }
                _ = delay_pong_reception => continue 'reconnect,
                _ = delay_ping_send => {
                    if sock.send(WsMessage::Text(String::from("ping"))).await.is_err() {
                        continue 'reconnect;
                    }
                    next_ping += chrono::Duration::seconds(PING_INTERVAL_SECS);
                }
                msg = sock.next() => {
                    let msg: api::FeedMessage = match msg {
                        None => continue 'reconnect,
                        Some(WsMessage::Text(t)) => match serde_json::from_str(&t) {
                            Ok(m) => m,
                            Err(_) => continue 'reconnect,
                        },
                        Some(WsMessage::Binary(b)) => match serde_json::from_slice(&b) {
                            Ok(m) => m,
                            Err(_) => continue 'reconnect,
                        },
                    };
                    match msg {
                        api::FeedMessage::Pong => last_pong = Utc::now(),
                        msg => feed_sender.send_message(ui::AppMsg::NetworkMessage(msg)),
                    }
                }
            }
        }
    }
}
