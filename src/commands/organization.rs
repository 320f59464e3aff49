use anyhow::Result;
use serde_json::json;

use crate::commands::{
    CommandReport, SidebarOptions, check_id, load_sidebar_config, metadata_for, run_sidebar,
};
use crate::ticketfu::context::{KEY_ORGANIZATION_ID, StaticHost};
use crate::ticketfu::sidebar::SidebarKind;

#[derive(Debug, Clone)]
pub struct OrganizationOptions {
    pub sidebar: SidebarOptions,
    pub organization_id: String,
}

pub fn run(opts: &OrganizationOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("organization");

    let organization_id = match check_id("organization", &opts.organization_id) {
        Ok(id) => id,
        Err(err) => {
            report.issue(err);
            return Ok(report);
        }
    };
    let Some(cfg) = load_sidebar_config(&opts.sidebar, &mut report) else {
        return Ok(report);
    };

    let host = StaticHost::new(metadata_for(&cfg))
        .with_value(KEY_ORGANIZATION_ID, json!(organization_id));
    run_sidebar(
        SidebarKind::Organization,
        host,
        opts.sidebar.follow,
        &mut report,
    )?;
    Ok(report)
}
