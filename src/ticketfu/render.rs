use crate::error::{SummaryError, SummaryErrorKind};
use crate::ticketfu::parser::{OrganizationSummary, Summary, TextValue, TicketSummary};

fn push_field(out: &mut Vec<String>, title: &str, value: Option<&TextValue>) {
    out.push(format!("## {title}"));
    out.push(value.map(ToString::to_string).unwrap_or_default());
}

fn push_list<I>(out: &mut Vec<String>, title: &str, items: I)
where
    I: IntoIterator<Item = String>,
{
    out.push(format!("## {title}"));
    for item in items {
        out.push(format!("- {item}"));
    }
}

pub fn ticket_summary(summary: &Summary<TicketSummary>) -> Vec<String> {
    match summary {
        Summary::Prose(text) => text.lines().map(str::to_string).collect(),
        Summary::Structured(ticket) => {
            let mut out = Vec::new();
            push_field(&mut out, "Intent", ticket.intent.as_ref());
            push_field(&mut out, "Summary", ticket.summary.as_ref());
            push_field(&mut out, "Next Step", ticket.next_step.as_ref());
            out
        }
    }
}

pub fn organization_summary(summary: &Summary<OrganizationSummary>) -> Vec<String> {
    match summary {
        Summary::Prose(text) => text.lines().map(str::to_string).collect(),
        Summary::Structured(org) => {
            let mut out = Vec::new();
            push_field(&mut out, "Key insights", org.key_insights.as_ref());
            push_field(&mut out, "Tech stack", org.tech_stack.as_ref());
            push_field(&mut out, "Overview", org.overview.as_ref());
            push_list(&mut out, "Main topics", org.main_topics.iter().map(ToString::to_string));
            push_list(
                &mut out,
                "Recommended actions",
                org.recommended_actions.iter().map(ToString::to_string),
            );
            push_list(
                &mut out,
                "Trending topics",
                org.trending_topics.iter().map(|t| {
                    format!(
                        "{} - Frequency: {}, Importance: {}",
                        t.topic, t.frequency, t.importance
                    )
                }),
            );
            out
        }
    }
}

/// User-facing state for a summary that could not be shown.
pub fn failure(subject: &str, err: &SummaryError) -> String {
    match err.kind() {
        SummaryErrorKind::NotFound => {
            format!("{subject}: summary not generated yet, try again shortly")
        }
        SummaryErrorKind::Transport => format!("{subject}: summary request failed ({err})"),
        SummaryErrorKind::Parse => format!("{subject}: summary could not be read ({err})"),
    }
}
