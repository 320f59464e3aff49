use anyhow::Result;
use serde_json::json;

use crate::commands::{
    CommandReport, SidebarOptions, check_id, load_sidebar_config, metadata_for, run_sidebar,
};
use crate::ticketfu::context::{
    KEY_SUBDOMAIN, KEY_TICKET_ID, KEY_TICKET_ORGANIZATION, StaticHost,
};
use crate::ticketfu::sidebar::SidebarKind;

#[derive(Debug, Clone)]
pub struct TicketOptions {
    pub sidebar: SidebarOptions,
    pub ticket_id: String,
    pub organization_id: Option<String>,
}

pub fn run(opts: &TicketOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("ticket");

    let ticket_id = match check_id("ticket", &opts.ticket_id) {
        Ok(id) => id,
        Err(err) => {
            report.issue(err);
            return Ok(report);
        }
    };
    let organization_id = match opts.organization_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match check_id("organization", raw) {
            Ok(id) => Some(id),
            Err(err) => {
                report.issue(err);
                return Ok(report);
            }
        },
        _ => None,
    };
    let Some(cfg) = load_sidebar_config(&opts.sidebar, &mut report) else {
        return Ok(report);
    };
    let subdomain = match cfg.require_subdomain() {
        Ok(subdomain) => subdomain.to_string(),
        Err(err) => {
            report.issue(err.to_string());
            return Ok(report);
        }
    };

    let mut host = StaticHost::new(metadata_for(&cfg))
        .with_value(KEY_SUBDOMAIN, json!(subdomain))
        .with_value(KEY_TICKET_ID, json!(ticket_id));
    if let Some(org_id) = organization_id {
        host = host.with_value(KEY_TICKET_ORGANIZATION, json!({ "id": org_id }));
    }

    run_sidebar(SidebarKind::Ticket, host, opts.sidebar.follow, &mut report)?;
    Ok(report)
}
