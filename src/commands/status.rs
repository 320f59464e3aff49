use anyhow::Result;
use std::env;

use crate::commands::CommandReport;
use crate::env_loader::DotenvSource;
use crate::ticketfu::config::{
    ConfigOverrides, ENV_KEYS, load_config, mask_token, resolve_config_path,
};

fn env_is_set(key: &str) -> bool {
    env::var(key).map(|v| !v.trim().is_empty()).unwrap_or(false)
}

pub fn run(overrides: &ConfigOverrides, dotenv: &DotenvSource) -> Result<CommandReport> {
    let mut report = CommandReport::new("status");

    match resolve_config_path(&|key: &str| env::var(key).ok()) {
        Some(path) if path.exists() => report.detail(format!("config_path={}", path.display())),
        Some(path) => report.detail(format!("config_path={} (absent)", path.display())),
        None => report.detail("config_path=unresolved"),
    }

    match dotenv {
        DotenvSource::Loaded(path) => report.detail(format!("dotenv={}", path.display())),
        DotenvSource::Absent => report.detail("dotenv=none"),
        DotenvSource::Invalid { path, reason } => {
            report.issue(format!("dotenv {} unreadable: {reason}", path.display()))
        }
    }

    for key in ENV_KEYS {
        let state = if env_is_set(key) { "set" } else { "unset" };
        report.detail(format!("env.{key}={state}"));
    }

    match load_config(overrides) {
        Ok(cfg) => {
            report.detail(format!("server_url={}", cfg.settings.server_url));
            report.detail(format!("api_token={}", mask_token(&cfg.settings.api_token)));
            if cfg.account.subdomain.is_empty() {
                report.issue("missing Zendesk subdomain (TICKETFU_SUBDOMAIN)");
            } else {
                report.detail(format!("subdomain={}", cfg.account.subdomain));
            }
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    Ok(report)
}
