use anyhow::{Result, anyhow};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ticketfu::context::ApiSettings;

pub const ENV_CONFIG_PATH: &str = "TICKETFU_CONFIG_PATH";
pub const ENV_SERVER_URL: &str = "TICKETFU_SERVER_URL";
pub const ENV_API_TOKEN: &str = "TICKETFU_API_TOKEN";
pub const ENV_SUBDOMAIN: &str = "TICKETFU_SUBDOMAIN";

/// Every environment key the sidebar reads, in the order `status` lists them.
pub const ENV_KEYS: &[&str] = &[
    ENV_CONFIG_PATH,
    ENV_SERVER_URL,
    ENV_API_TOKEN,
    ENV_SUBDOMAIN,
    crate::env_loader::HOME_ENV,
    crate::logging::LOG_ENV,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsSection {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub api_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSection {
    #[serde(default)]
    pub subdomain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidebarConfig {
    pub settings: SettingsSection,
    pub account: AccountSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PartialSidebarConfig {
    settings: Option<SettingsSection>,
    account: Option<AccountSection>,
}

/// Values given on the command line. They win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub server_url: Option<String>,
    pub api_token: Option<String>,
    pub subdomain: Option<String>,
}

impl SidebarConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            server_url: self.settings.server_url.clone(),
            api_token: self.settings.api_token.clone(),
        }
    }

    pub fn require_subdomain(&self) -> Result<&str> {
        let subdomain = self.account.subdomain.trim();
        if subdomain.is_empty() {
            return Err(anyhow!(
                "missing Zendesk subdomain: set TICKETFU_SUBDOMAIN or pass --subdomain"
            ));
        }
        Ok(subdomain)
    }
}

pub fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count == 0 {
        return "<unset>".to_string();
    }
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("****{tail}")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(cfg: &SidebarConfig) -> Result<()> {
    let server_url = cfg.settings.server_url.trim();
    if server_url.is_empty() {
        return Err(anyhow!(
            "missing server url: set TICKETFU_SERVER_URL or [settings].server_url"
        ));
    }
    let parsed = Url::parse(server_url)
        .map_err(|err| anyhow!("invalid server url `{server_url}`: {err}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(anyhow!(
            "invalid server url `{server_url}`: scheme must be http or https"
        ));
    }
    if cfg.settings.api_token.trim().is_empty() {
        return Err(anyhow!(
            "missing api token: set TICKETFU_API_TOKEN or [settings].api_token"
        ));
    }
    Ok(())
}

pub fn resolve_config_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(custom) = non_empty(lookup(ENV_CONFIG_PATH)) {
        return Some(PathBuf::from(custom));
    }

    let home = dirs::home_dir()?;
    Some(home.join(".ticketfu").join("sidebar.toml"))
}

fn merge_file_config(base: &mut SidebarConfig, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialSidebarConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse sidebar config {}: {err}", path.display()))?;
    if let Some(settings) = parsed.settings {
        base.settings = settings;
    }
    if let Some(account) = parsed.account {
        base.account = account;
    }
    Ok(())
}

/// Resolves defaults, then the TOML file, then `lookup` (environment), then
/// `overrides`, and validates the result.
pub fn load_config_with<F>(lookup: F, overrides: &ConfigOverrides) -> Result<SidebarConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = SidebarConfig::default();
    if let Some(path) = resolve_config_path(&lookup) {
        merge_file_config(&mut cfg, &path)?;
    }

    if let Some(v) = non_empty(lookup(ENV_SERVER_URL)) {
        cfg.settings.server_url = v;
    }
    if let Some(v) = non_empty(lookup(ENV_API_TOKEN)) {
        cfg.settings.api_token = v;
    }
    if let Some(v) = non_empty(lookup(ENV_SUBDOMAIN)) {
        cfg.account.subdomain = v;
    }

    if let Some(v) = non_empty(overrides.server_url.clone()) {
        cfg.settings.server_url = v;
    }
    if let Some(v) = non_empty(overrides.api_token.clone()) {
        cfg.settings.api_token = v;
    }
    if let Some(v) = non_empty(overrides.subdomain.clone()) {
        cfg.account.subdomain = v;
    }

    validate(&cfg)?;
    Ok(cfg)
}

pub fn load_config(overrides: &ConfigOverrides) -> Result<SidebarConfig> {
    load_config_with(|key| env::var(key).ok(), overrides)
}
