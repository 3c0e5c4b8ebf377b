use std::collections::HashSet;

use kiji_client::api::{BlogId, Report, ReportId, ReportReason, ReportStatus, ReportTarget};
use yew::prelude::*;

use crate::{util, LoginInfo};

#[derive(Clone, PartialEq, Properties)]
pub struct ModerationQueueProps {
    pub login: LoginInfo,
    pub on_goto_blog: Callback<BlogId>,
    pub on_error: Callback<String>,
}

pub struct ModerationQueue {
    reports: Vec<Report>,
    loading: bool,
    resolving: HashSet<ReportId>,
}

pub enum ModerationQueueMsg {
    Got(anyhow::Result<Vec<Report>>),
    Resolve(ReportId, ReportStatus),
    Resolved(ReportId, anyhow::Result<()>),
}

impl Component for ModerationQueue {
    type Message = ModerationQueueMsg;
    type Properties = ModerationQueueProps;

    fn create(ctx: &Context<Self>) -> Self {
        let login = ctx.props().login.clone();
        ctx.link().send_future(async move {
            ModerationQueueMsg::Got(crate::api::fetch_open_reports(&login).await)
        });
        ModerationQueue {
            reports: Vec::new(),
            loading: true,
            resolving: HashSet::new(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            ModerationQueueMsg::Got(res) => {
                self.loading = false;
                match res {
                    Ok(reports) => self.reports = reports,
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed loading reports: {}", e)),
                }
            }
            ModerationQueueMsg::Resolve(report, status) => {
                if self.resolving.contains(&report) {
                    return false;
                }
                self.resolving.insert(report);
                let login = ctx.props().login.clone();
                ctx.link().send_future(async move {
                    ModerationQueueMsg::Resolved(
                        report,
                        crate::api::resolve_report(&login, report, status).await,
                    )
                });
            }
            ModerationQueueMsg::Resolved(report, res) => {
                self.resolving.remove(&report);
                match res {
                    Ok(()) => self.reports.retain(|r| r.id != report),
                    Err(e) => ctx
                        .props()
                        .on_error
                        .emit(format!("failed resolving report: {}", e)),
                }
            }
        }
        true
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container py-4 moderation">
                <h1>{ "Open reports" }</h1>
                { for (self.reports.is_empty() && !self.loading).then(|| html! {
                    <p class="text-muted">{ "The queue is empty" }</p>
                }) }
                <ul class="list-group">
                    { for self.reports.iter().map(|r| self.view_report(ctx, r)) }
                </ul>
            </div>
        }
    }
}

impl ModerationQueue {
    fn view_report(&self, ctx: &Context<Self>, r: &Report) -> Html {
        let id = r.id;
        let busy = self.resolving.contains(&id);
        let target = match r.target {
            ReportTarget::Blog(_) => "Blog",
            ReportTarget::Comment(_) => "Comment",
        };
        let goto = match r.target {
            ReportTarget::Blog(blog) => Some(html! {
                <button
                    type="button"
                    class="btn btn-sm btn-link"
                    onclick={ ctx.props().on_goto_blog.reform(move |_| blog) }
                >
                    { "View" }
                </button>
            }),
            ReportTarget::Comment(_) => None,
        };
        html! {
            <li class="list-group-item">
                <div class="d-flex align-items-center">
                    <span class="badge text-bg-danger me-2">{ reason_label(r.reason) }</span>
                    <span class="me-2">{ target }</span>
                    { for goto }
                    <span class="text-muted ms-auto">{ util::relative_time(r.created_at) }</span>
                </div>
                { for (!r.details.is_empty()).then(|| html! {
                    <p class="mb-1">{ &r.details }</p>
                }) }
                <div class="mt-1">
                    <button
                        type="button"
                        class="btn btn-sm btn-outline-secondary me-2"
                        disabled={ busy }
                        onclick={ ctx.link().callback(move |_| {
                            ModerationQueueMsg::Resolve(id, ReportStatus::Dismissed)
                        }) }
                    >
                        { "Dismiss" }
                    </button>
                    <button
                        type="button"
                        class="btn btn-sm btn-danger"
                        disabled={ busy }
                        onclick={ ctx.link().callback(move |_| {
                            ModerationQueueMsg::Resolve(id, ReportStatus::ContentRemoved)
                        }) }
                    >
                        { "Remove content" }
                    </button>
                </div>
            </li>
        }
    }
}

fn reason_label(reason: ReportReason) -> &'static str {
    match reason {
        ReportReason::Spam => "Spam",
        ReportReason::Harassment => "Harassment",
        ReportReason::Misinformation => "Misinformation",
        ReportReason::Other => "Other",
    }
}
