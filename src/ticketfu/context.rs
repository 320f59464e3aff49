use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

pub const KEY_SUBDOMAIN: &str = "currentAccount.subdomain";
pub const KEY_TICKET_ID: &str = "ticket.id";
pub const KEY_TICKET_ORGANIZATION: &str = "ticket.organization";
pub const KEY_ORGANIZATION_ID: &str = "organization.id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub server_url: String,
    pub api_token: String,
}

impl ApiSettings {
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub settings: ApiSettings,
}

/// Identifiers for one render cycle, read from the host once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub settings: ApiSettings,
    pub subdomain: String,
    pub ticket_id: String,
    pub organization_id: Option<String>,
}

impl RequestContext {
    pub fn ticket_url(&self) -> String {
        format!(
            "{}.zendesk.com/agent/tickets/{}",
            self.subdomain, self.ticket_id
        )
    }

    pub fn from_host<H: HostContext + ?Sized>(host: &H) -> Result<Self> {
        let metadata = host.metadata()?;
        let subdomain = require_text(host, KEY_SUBDOMAIN)?;
        let ticket_id = require_text(host, KEY_TICKET_ID)?;
        let organization_id = host
            .get(KEY_TICKET_ORGANIZATION)?
            .as_ref()
            .and_then(|org| org.get("id"))
            .and_then(value_text);
        Ok(Self {
            settings: metadata.settings,
            subdomain,
            ticket_id,
            organization_id,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HostEvent {
    AppRegistered,
    TicketConversationChanged,
}

impl HostEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HostEvent::AppRegistered => "app.registered",
            HostEvent::TicketConversationChanged => "ticket.conversation.changed",
        }
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HostEvent {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim() {
            "app.registered" => Ok(HostEvent::AppRegistered),
            "ticket.conversation.changed" => Ok(HostEvent::TicketConversationChanged),
            other => Err(anyhow!("unknown host event `{other}`")),
        }
    }
}

/// What the sidebar needs from its host platform.
pub trait HostContext {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn metadata(&self) -> Result<AppMetadata>;
    fn on(&mut self, event: HostEvent);
    /// Blocks until the next subscribed event, or `None` once the host is done.
    fn next_event(&mut self) -> Option<HostEvent>;
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn require_text<H: HostContext + ?Sized>(host: &H, key: &str) -> Result<String> {
    host.get(key)?
        .as_ref()
        .and_then(value_text)
        .with_context(|| format!("host did not provide `{key}`"))
}

type EventLines = Box<dyn Iterator<Item = String>>;

/// Host backed by fixed values. It raises `app.registered` once, then replays
/// event names pulled from an optional line source.
pub struct StaticHost {
    metadata: AppMetadata,
    values: BTreeMap<String, Value>,
    subscribed: BTreeSet<HostEvent>,
    pending: VecDeque<HostEvent>,
    lines: Option<EventLines>,
}

impl StaticHost {
    pub fn new(metadata: AppMetadata) -> Self {
        Self {
            metadata,
            values: BTreeMap::new(),
            subscribed: BTreeSet::new(),
            pending: VecDeque::from([HostEvent::AppRegistered]),
            lines: None,
        }
    }

    pub fn with_value(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    pub fn with_event_lines<I>(mut self, lines: I) -> Self
    where
        I: Iterator<Item = String> + 'static,
    {
        self.lines = Some(Box::new(lines));
        self
    }

    fn pull_line_event(&mut self) -> Option<Option<HostEvent>> {
        let line = self.lines.as_mut()?.next()?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Some(None);
        }
        match trimmed.parse::<HostEvent>() {
            Ok(event) => Some(Some(event)),
            Err(err) => {
                tracing::warn!(line = trimmed, "ignoring host event: {err}");
                Some(None)
            }
        }
    }
}

impl HostContext for StaticHost {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn metadata(&self) -> Result<AppMetadata> {
        Ok(self.metadata.clone())
    }

    fn on(&mut self, event: HostEvent) {
        self.subscribed.insert(event);
    }

    fn next_event(&mut self) -> Option<HostEvent> {
        while let Some(event) = self.pending.pop_front() {
            if self.subscribed.contains(&event) {
                return Some(event);
            }
        }
        loop {
            match self.pull_line_event()? {
                Some(event) if self.subscribed.contains(&event) => return Some(event),
                _ => continue,
            }
        }
    }
}
