//! Normalization of TicketFu summary payloads.
//!
//! The backend answers `{ "summary": ... }` where `summary` may be prose, a
//! ```` ```json ```` fenced block, a bare JSON string, or an already-structured
//! JSON value. [`normalize`] decides between structured and prose without looking
//! at the content-type; the typed records are read from the structured value
//! afterwards.

use crate::error::SummaryError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const FENCE_MARKER: &str = "```json";
const FENCE_OPEN: &str = "```json\n";
const FENCE_CLOSE: &str = "\n```";

#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Structured(Value),
    Prose(String),
}

/// Outcome handed to renderers. Prose must be shown as plain text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Summary<T> {
    Structured(T),
    Prose(String),
}

/// Reads `value` as a record. Only JSON objects are considered, so an array is
/// never spread over the fields by position.
fn record_from<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if !value.is_object() {
        return None;
    }
    match T::deserialize(value) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::debug!("summary does not fit the record, showing it as prose: {err}");
            None
        }
    }
}

impl<T: DeserializeOwned> Summary<T> {
    /// Builds the summary from the `summary` field of a response. Anything that
    /// is not a fitting JSON object is shown as prose, so this never fails.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::String(text) => match normalize(&text) {
                Normalized::Prose(prose) => Summary::Prose(prose),
                Normalized::Structured(value) => record_from(&value)
                    .map(Summary::Structured)
                    .unwrap_or_else(|| Summary::Prose(text.trim().to_string())),
            },
            other => record_from(&other)
                .map(Summary::Structured)
                .unwrap_or_else(|| Summary::Prose(other.to_string())),
        }
    }
}

impl<T> Summary<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Summary::Structured(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketSummary {
    pub intent: Option<TextValue>,
    pub summary: Option<TextValue>,
    pub next_step: Option<TextValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationSummary {
    pub key_insights: Option<TextValue>,
    pub tech_stack: Option<TextValue>,
    pub overview: Option<TextValue>,
    pub main_topics: Vec<TextValue>,
    pub recommended_actions: Vec<TextValue>,
    pub trending_topics: Vec<TrendingTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingTopic {
    pub topic: TextValue,
    pub frequency: TextValue,
    pub importance: TextValue,
}

/// A field the model is asked to fill with text but may fill with any JSON.
/// Kept as received and displayed as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    List(Vec<TextValue>),
    Other(Value),
}

impl Default for TextValue {
    fn default() -> Self {
        TextValue::Text(String::new())
    }
}

impl From<&str> for TextValue {
    fn from(text: &str) -> Self {
        TextValue::Text(text.to_string())
    }
}

impl fmt::Display for TextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextValue::Text(s) => f.write_str(s),
            TextValue::Number(n) => write!(f, "{n}"),
            TextValue::Bool(b) => write!(f, "{b}"),
            TextValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            TextValue::Other(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSummaryResponse {
    summary: Value,
}

/// Strips one leading ```` ```json\n ```` and one `\n```` `. Only the first
/// occurrence of each is removed, wherever it sits.
fn strip_json_fence(raw: &str) -> String {
    raw.replacen(FENCE_OPEN, "", 1).replacen(FENCE_CLOSE, "", 1)
}

pub fn normalize(raw: &str) -> Normalized {
    let trimmed = raw.trim();

    if trimmed.starts_with(FENCE_MARKER) {
        let stripped = strip_json_fence(trimmed);
        if let Ok(value) = serde_json::from_str::<Value>(&stripped) {
            return Normalized::Structured(value);
        }
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Normalized::Structured(value),
        Err(_) => Normalized::Prose(trimmed.to_string()),
    }
}

/// Decodes a `{ "summary": ... }` HTTP body and returns the non-null `summary`.
pub fn parse_summary_body(body: &str) -> Result<Value, SummaryError> {
    let raw: RawSummaryResponse = serde_json::from_str(body)
        .map_err(|err| SummaryError::Parse(format!("invalid summary response: {err}")))?;
    if raw.summary.is_null() {
        return Err(SummaryError::Parse("summary field is null".to_string()));
    }
    Ok(raw.summary)
}

pub fn parse_ticket_summary(body: &str) -> Result<Summary<TicketSummary>, SummaryError> {
    parse_summary_body(body).map(Summary::from_payload)
}

pub fn parse_organization_summary(
    body: &str,
) -> Result<Summary<OrganizationSummary>, SummaryError> {
    parse_summary_body(body).map(Summary::from_payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SummaryErrorKind;
    use serde_json::json;

    #[test]
    fn fenced_json_matches_direct_parse_of_stripped_content() {
        let inner = "{\"intent\":\"billing\",\"summary\":\"refund\",\"next_step\":\"pay\"}";
        let fenced = format!("```json\n{inner}\n```");
        let direct = serde_json::from_str::<Value>(inner).expect("inner json");
        assert_eq!(normalize(&fenced), Normalized::Structured(direct));
    }

    #[test]
    fn bare_json_is_structured() {
        let got = normalize("{\"overview\":\"steady\",\"main_topics\":[\"sso\"]}");
        assert_eq!(
            got,
            Normalized::Structured(json!({"overview": "steady", "main_topics": ["sso"]}))
        );
    }

    #[test]
    fn prose_is_returned_unchanged() {
        assert_eq!(
            normalize("Ticket resolved quickly."),
            Normalized::Prose("Ticket resolved quickly.".to_string())
        );
    }

    #[test]
    fn broken_fence_falls_back_to_prose() {
        let raw = "```json\n{\"intent\": \n```";
        assert_eq!(normalize(raw), Normalized::Prose(raw.to_string()));
    }

    #[test]
    fn fence_without_newline_is_not_stripped() {
        let raw = "```json{\"intent\":\"x\"}```";
        assert_eq!(normalize(raw), Normalized::Prose(raw.to_string()));
    }

    #[test]
    fn only_first_closing_fence_is_removed() {
        // Content carrying its own fence is mangled rather than rescued.
        let raw = "```json\n{\"summary\":\"see\n```code\"}\n```";
        assert!(matches!(normalize(raw), Normalized::Prose(_)));
    }

    #[test]
    fn scenario_fenced_ticket_body_yields_typed_record() {
        let body = json!({
            "summary": "```json\n{\"intent\":\"billing\",\"summary\":\"customer wants refund\",\"next_step\":\"issue refund\"}\n```"
        })
        .to_string();
        let got = parse_ticket_summary(&body).expect("ticket summary");
        assert_eq!(
            got,
            Summary::Structured(TicketSummary {
                intent: Some("billing".into()),
                summary: Some("customer wants refund".into()),
                next_step: Some("issue refund".into()),
            })
        );
    }

    #[test]
    fn missing_ticket_fields_stay_absent() {
        let body = json!({"summary": "{\"intent\":\"billing\"}"}).to_string();
        let Summary::Structured(ticket) = parse_ticket_summary(&body).expect("parse") else {
            panic!("expected structured summary");
        };
        assert_eq!(ticket.intent, Some("billing".into()));
        assert!(ticket.next_step.is_none());
    }

    #[test]
    fn structured_org_summary_accepts_mixed_scalars() {
        let body = json!({
            "summary": {
                "key_insights": "renewal at risk",
                "main_topics": ["sso", "billing"],
                "trending_topics": [
                    {"topic": "sso", "frequency": 12, "importance": "high"}
                ]
            }
        })
        .to_string();
        let Summary::Structured(org) = parse_organization_summary(&body).expect("parse") else {
            panic!("expected structured summary");
        };
        let topics: Vec<String> = org.main_topics.iter().map(ToString::to_string).collect();
        assert_eq!(topics, vec!["sso", "billing"]);
        assert!(org.recommended_actions.is_empty());
        assert_eq!(org.trending_topics[0].frequency.to_string(), "12");
        assert_eq!(org.trending_topics[0].importance.to_string(), "high");
    }

    #[test]
    fn prose_body_is_not_an_error() {
        let body = json!({"summary": "Ticket resolved quickly."}).to_string();
        assert_eq!(
            parse_ticket_summary(&body).expect("prose"),
            Summary::Prose("Ticket resolved quickly.".to_string())
        );
    }

    #[test]
    fn json_scalars_in_a_string_summary_are_shown_as_prose() {
        for (raw, shown) in [
            ("42", "42"),
            ("true", "true"),
            ("null", "null"),
            ("\"hello\"", "\"hello\""),
            ("  7 \n", "7"),
        ] {
            let body = json!({ "summary": raw }).to_string();
            assert_eq!(
                parse_ticket_summary(&body).expect("string summary"),
                Summary::Prose(shown.to_string()),
                "summary {raw:?}"
            );
        }
    }

    #[test]
    fn arrays_never_fill_record_fields_by_position() {
        let body = json!({"summary": "[\"a\"]"}).to_string();
        assert_eq!(
            parse_ticket_summary(&body).expect("array summary"),
            Summary::Prose("[\"a\"]".to_string())
        );

        let body = json!({"summary": ["a", "b"]}).to_string();
        assert_eq!(
            parse_organization_summary(&body).expect("array summary"),
            Summary::Prose("[\"a\",\"b\"]".to_string())
        );
    }

    #[test]
    fn non_text_ticket_fields_render_as_text() {
        let body = json!({
            "summary": "{\"intent\":\"billing\",\"next_step\":[\"refund\",\"close\"]}"
        })
        .to_string();
        let Summary::Structured(ticket) = parse_ticket_summary(&body).expect("parse") else {
            panic!("expected structured summary");
        };
        assert_eq!(ticket.next_step.map(|v| v.to_string()).as_deref(), Some("refund, close"));

        let body = json!({"summary": "```json\n{\"intent\":5}\n```"}).to_string();
        let Summary::Structured(ticket) = parse_ticket_summary(&body).expect("parse") else {
            panic!("expected structured summary");
        };
        assert_eq!(ticket.intent.map(|v| v.to_string()).as_deref(), Some("5"));
    }

    #[test]
    fn string_summary_that_does_not_fit_keeps_its_text() {
        let raw = "{\"trending_topics\": \"sso\"}";
        let body = json!({ "summary": raw }).to_string();
        assert_eq!(
            parse_organization_summary(&body).expect("mismatched shape"),
            Summary::Prose(raw.to_string())
        );
    }

    #[test]
    fn body_without_usable_summary_is_a_parse_error() {
        for body in ["{\"status\":\"ok\"}", "not json", "{\"summary\":null}"] {
            let err = parse_ticket_summary(body).expect_err("no summary");
            assert_eq!(err.kind(), SummaryErrorKind::Parse, "body {body:?}");
        }
    }
}
