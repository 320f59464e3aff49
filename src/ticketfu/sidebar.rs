//! Render cycles for the ticket and organization sidebars.
//!
//! Each subscribed host event builds a fresh context from the host, fetches the
//! summaries, and hands one [`SidebarView`] to the caller. Nothing is cached
//! between cycles.

use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::SummaryError;
use crate::ticketfu::context::{
    HostContext, HostEvent, KEY_ORGANIZATION_ID, RequestContext, require_text,
};
use crate::ticketfu::fetcher::SummaryFetcher;
use crate::ticketfu::parser::{OrganizationSummary, Summary, TicketSummary};
use crate::ticketfu::render;
use crate::ticketfu::transport::HttpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarKind {
    Ticket,
    Organization,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketView {
    pub ticket_id: String,
    pub organization_id: Option<String>,
    pub ticket: Result<Summary<TicketSummary>, SummaryError>,
    /// Only fetched when the ticket summary is structured and has an organization.
    pub organization: Option<Result<Summary<OrganizationSummary>, SummaryError>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationView {
    pub organization_id: String,
    pub organization: Result<Summary<OrganizationSummary>, SummaryError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarView {
    Ticket(TicketView),
    Organization(OrganizationView),
}

fn outcome_json<T: Serialize>(outcome: &Result<Summary<T>, SummaryError>) -> Value {
    match outcome {
        Ok(summary) => json!({ "ok": true, "summary": summary }),
        Err(err) => json!({
            "ok": false,
            "error": { "kind": err.kind().as_str(), "message": err.to_string() },
        }),
    }
}

impl SidebarView {
    pub fn is_ok(&self) -> bool {
        match self {
            SidebarView::Ticket(view) => {
                view.ticket.is_ok() && view.organization.as_ref().is_none_or(|org| org.is_ok())
            }
            SidebarView::Organization(view) => view.organization.is_ok(),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            SidebarView::Ticket(view) => {
                let subject = format!("ticket {}", view.ticket_id);
                out.push(format!("# Ticket summary ({})", view.ticket_id));
                match &view.ticket {
                    Ok(summary) => out.extend(render::ticket_summary(summary)),
                    Err(err) => out.push(render::failure(&subject, err)),
                }
                if let (Some(org_id), Some(org)) = (&view.organization_id, &view.organization) {
                    out.push(format!("# Org summary ({org_id})"));
                    match org {
                        Ok(summary) => out.extend(render::organization_summary(summary)),
                        Err(err) => {
                            out.push(render::failure(&format!("organization {org_id}"), err))
                        }
                    }
                }
            }
            SidebarView::Organization(view) => {
                out.push(format!("# Org summary ({})", view.organization_id));
                match &view.organization {
                    Ok(summary) => out.extend(render::organization_summary(summary)),
                    Err(err) => out.push(render::failure(
                        &format!("organization {}", view.organization_id),
                        err,
                    )),
                }
            }
        }
        out
    }

    pub fn to_json(&self) -> Value {
        match self {
            SidebarView::Ticket(view) => json!({
                "ticket_id": view.ticket_id,
                "organization_id": view.organization_id,
                "ticket": outcome_json(&view.ticket),
                "organization": view.organization.as_ref().map(outcome_json),
            }),
            SidebarView::Organization(view) => json!({
                "organization_id": view.organization_id,
                "organization": outcome_json(&view.organization),
            }),
        }
    }
}

pub struct Sidebar<H, T> {
    kind: SidebarKind,
    host: H,
    fetcher: SummaryFetcher<T>,
}

impl<H: HostContext, T: HttpTransport> Sidebar<H, T> {
    pub fn new(kind: SidebarKind, mut host: H, fetcher: SummaryFetcher<T>) -> Self {
        host.on(HostEvent::AppRegistered);
        host.on(HostEvent::TicketConversationChanged);
        Self {
            kind,
            host,
            fetcher,
        }
    }

    fn render_ticket(&self) -> Result<TicketView> {
        let ctx = RequestContext::from_host(&self.host)?;
        let ticket = self.fetcher.fetch_ticket_summary(&ctx);
        let organization = match (&ticket, ctx.organization_id.as_deref()) {
            (Ok(summary), Some(org_id)) if summary.is_structured() => Some(
                self.fetcher
                    .fetch_organization_summary(&ctx.settings, org_id),
            ),
            _ => None,
        };
        Ok(TicketView {
            ticket_id: ctx.ticket_id,
            organization_id: ctx.organization_id,
            ticket,
            organization,
        })
    }

    fn render_organization(&self) -> Result<OrganizationView> {
        let settings = self.host.metadata()?.settings;
        let organization_id = require_text(&self.host, KEY_ORGANIZATION_ID)?;
        let organization = self
            .fetcher
            .fetch_organization_summary(&settings, &organization_id);
        Ok(OrganizationView {
            organization_id,
            organization,
        })
    }

    /// Runs one fetch-and-render cycle against the current host context.
    pub fn render_cycle(&self) -> Result<SidebarView> {
        match self.kind {
            SidebarKind::Ticket => self.render_ticket().map(SidebarView::Ticket),
            SidebarKind::Organization => self.render_organization().map(SidebarView::Organization),
        }
    }

    /// Renders once per host event until the host has no more events. Returns
    /// the number of cycles run.
    pub fn run<F>(&mut self, mut sink: F) -> usize
    where
        F: FnMut(HostEvent, Result<SidebarView>),
    {
        let mut cycles = 0usize;
        while let Some(event) = self.host.next_event() {
            tracing::debug!(%event, "render cycle");
            let view = self.render_cycle();
            if let Err(err) = &view {
                tracing::error!("render cycle failed: {err:#}");
            }
            sink(event, view);
            cycles += 1;
        }
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SummaryErrorKind;
    use crate::ticketfu::context::{
        ApiSettings, AppMetadata, KEY_SUBDOMAIN, KEY_TICKET_ID, KEY_TICKET_ORGANIZATION,
        StaticHost,
    };
    use crate::ticketfu::fetcher::testing::FakeTransport;
    use std::time::Duration;

    fn host() -> StaticHost {
        StaticHost::new(AppMetadata {
            settings: ApiSettings {
                server_url: "https://ticketfu.example.com".to_string(),
                api_token: "tok".to_string(),
            },
        })
        .with_value(KEY_SUBDOMAIN, json!("acme"))
        .with_value(KEY_TICKET_ID, json!(42))
    }

    fn fetcher(transport: &FakeTransport) -> SummaryFetcher<&FakeTransport> {
        SummaryFetcher::new(transport).with_generation_delay(Duration::ZERO)
    }

    #[test]
    fn structured_ticket_also_fetches_organization() {
        let transport = FakeTransport::default()
            .reply_ok(r#"{"summary":"{\"intent\":\"billing\"}"}"#)
            .reply_ok(r#"{"summary":{"overview":"steady"}}"#);
        let host = host().with_value(KEY_TICKET_ORGANIZATION, json!({"id": 7}));
        let sidebar = Sidebar::new(SidebarKind::Ticket, host, fetcher(&transport));

        let view = sidebar.render_cycle().expect("view");
        assert!(view.is_ok());
        let lines = view.lines();
        assert!(lines.contains(&"# Org summary (7)".to_string()));
        assert!(lines.contains(&"steady".to_string()));
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn prose_ticket_skips_organization() {
        let transport =
            FakeTransport::default().reply_ok(r#"{"summary":"Ticket resolved quickly."}"#);
        let host = host().with_value(KEY_TICKET_ORGANIZATION, json!({"id": 7}));
        let sidebar = Sidebar::new(SidebarKind::Ticket, host, fetcher(&transport));

        let SidebarView::Ticket(view) = sidebar.render_cycle().expect("view") else {
            panic!("expected ticket view");
        };
        assert!(view.organization.is_none());
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn organization_failure_is_reported_without_hiding_ticket() {
        let transport = FakeTransport::default()
            .reply_ok(r#"{"summary":"{\"intent\":\"billing\"}"}"#)
            .reply_status(404);
        let host = host().with_value(KEY_TICKET_ORGANIZATION, json!({"id": 7}));
        let sidebar = Sidebar::new(SidebarKind::Ticket, host, fetcher(&transport));

        let view = sidebar.render_cycle().expect("view");
        assert!(!view.is_ok());
        let json = view.to_json();
        assert_eq!(json["ticket"]["ok"], json!(true));
        assert_eq!(json["organization"]["error"]["kind"], json!("not_found"));
    }

    #[test]
    fn run_renders_once_per_subscribed_event() {
        let transport = FakeTransport::default()
            .reply_ok(r#"{"summary":"first"}"#)
            .reply_ok(r#"{"summary":"second"}"#);
        let host = host().with_event_lines(
            vec!["ticket.conversation.changed".to_string()].into_iter(),
        );
        let mut sidebar = Sidebar::new(SidebarKind::Ticket, host, fetcher(&transport));

        let mut events = Vec::new();
        let mut rendered = Vec::new();
        let cycles = sidebar.run(|event, view| {
            events.push(event);
            rendered.push(view.expect("view").lines());
        });

        assert_eq!(cycles, 2);
        assert_eq!(
            events,
            vec![HostEvent::AppRegistered, HostEvent::TicketConversationChanged]
        );
        assert_eq!(rendered[1].last().map(String::as_str), Some("second"));
    }

    #[test]
    fn organization_sidebar_reports_not_found() {
        let transport = FakeTransport::default().reply_status(404);
        let host = host().with_value(KEY_ORGANIZATION_ID, json!("7"));
        let sidebar = Sidebar::new(SidebarKind::Organization, host, fetcher(&transport));

        let SidebarView::Organization(view) = sidebar.render_cycle().expect("view") else {
            panic!("expected organization view");
        };
        assert_eq!(
            view.organization.expect_err("missing").kind(),
            SummaryErrorKind::NotFound
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn missing_host_values_fail_the_cycle() {
        let transport = FakeTransport::default();
        let sidebar = Sidebar::new(SidebarKind::Organization, host(), fetcher(&transport));
        assert!(sidebar.render_cycle().is_err());
        assert!(transport.requests().is_empty());
    }
}
