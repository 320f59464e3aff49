pub mod organization;
pub mod status;
pub mod ticket;

use serde::Serialize;
use serde_json::Value;

use crate::ticketfu::config::{ConfigOverrides, SidebarConfig, load_config};
use crate::ticketfu::context::{AppMetadata, StaticHost};
use crate::ticketfu::fetcher::SummaryFetcher;
use crate::ticketfu::sidebar::{Sidebar, SidebarKind};
use crate::ticketfu::transport::ReqwestTransport;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub views: Vec<Value>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            output: Vec::new(),
            views: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

#[derive(Debug, Clone, Default)]
pub struct SidebarOptions {
    pub overrides: ConfigOverrides,
    pub follow: bool,
}

pub fn load_sidebar_config(
    opts: &SidebarOptions,
    report: &mut CommandReport,
) -> Option<SidebarConfig> {
    match load_config(&opts.overrides) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            report.issue(format!("config invalid: {err:#}"));
            None
        }
    }
}

pub fn metadata_for(cfg: &SidebarConfig) -> AppMetadata {
    AppMetadata {
        settings: cfg.api_settings(),
    }
}

/// Zendesk ids are numeric. Anything else would change the request path, so it
/// is rejected before any request is made.
pub fn check_id<'a>(label: &str, raw: &'a str) -> Result<&'a str, String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(format!("{label} id cannot be empty"));
    }
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{label} id must be numeric, got `{id}`"));
    }
    Ok(id)
}

/// Host event names, one per line. A read error ends the stream.
fn event_lines<I>(lines: I) -> impl Iterator<Item = String>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    lines.map_while(|line| match line {
        Ok(line) => Some(line),
        Err(err) => {
            tracing::warn!("stopped reading host events from stdin: {err}");
            None
        }
    })
}

/// Drives a sidebar over `host` with the reqwest transport and records every
/// cycle on `report`.
pub fn run_sidebar(
    kind: SidebarKind,
    host: StaticHost,
    follow: bool,
    report: &mut CommandReport,
) -> anyhow::Result<()> {
    let host = if follow {
        host.with_event_lines(event_lines(std::io::stdin().lines()))
    } else {
        host
    };
    let fetcher = SummaryFetcher::new(ReqwestTransport::new()?);
    let mut sidebar = Sidebar::new(kind, host, fetcher);

    let cycles = sidebar.run(|event, view| {
        report.detail(format!("event={event}"));
        match view {
            Ok(view) => {
                if !view.is_ok() {
                    report.issue(format!("summary unavailable after {event}"));
                }
                report.output.extend(view.lines());
                report.views.push(view.to_json());
            }
            Err(err) => report.issue(format!("render failed after {event}: {err:#}")),
        }
    });
    report.detail(format!("cycles={cycles}"));
    Ok(())
}
