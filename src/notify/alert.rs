// src/notify/alert.rs
// =============================================================================
// This module turns a classification into an alert, and an alert into the
// webhook's JSON embed.
//
// Three kinds of alert exist:
// - EndpointsDiscovered:  new endpoints on a new or unchanged script (green)
// - ContentChanged:       the script changed, nothing new exposed (red)
// - ChangedWithEndpoints: the script changed and exposed new endpoints (red)
//
// Diff snippets and endpoint lists are bounded (AlertLimits) because the
// webhook rejects oversized embed fields.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::AlertLimits;
use crate::detect::{Classification, Fingerprint};

const FOOTER: &str = "JS & Endpoint Monitor";

/// Lines at the top of a unified diff that name the two files.
const DIFF_HEADER_LINES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    EndpointsDiscovered,
    ContentChanged,
    ChangedWithEndpoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTag {
    Informational,
    Warning,
}

impl ColorTag {
    pub fn rgb(self) -> u32 {
        match self {
            ColorTag::Informational => 0x00ff00,
            ColorTag::Warning => 0xff0000,
        }
    }
}

/// A fully built alert. Never modified after construction, so every
/// delivery attempt sends the same thing.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPayload {
    pub kind: AlertKind,
    pub title: String,
    pub description: String,
    pub color: ColorTag,
    pub target_url: String,
    pub old_fingerprint: Option<Fingerprint>,
    pub new_fingerprint: Fingerprint,
    pub diff_summary: Option<String>,
    pub endpoints: Vec<String>,
    pub report_reference: Option<String>,
    pub log_reference: String,
    pub timestamp: DateTime<Utc>,
}

/// Builds alerts with a fixed set of limits and endpoint log reference.
#[derive(Debug, Clone)]
pub struct AlertBuilder {
    limits: AlertLimits,
    log_reference: String,
}

impl AlertBuilder {
    pub fn new(limits: AlertLimits, log_reference: impl Into<String>) -> Self {
        Self {
            limits,
            log_reference: log_reference.into(),
        }
    }

    pub fn build(
        &self,
        url: &str,
        classification: &Classification,
        report_reference: Option<String>,
    ) -> AlertPayload {
        let endpoints = classification.new_endpoints().to_vec();

        let (kind, old_fingerprint, diff_summary) = match classification {
            Classification::NewTarget { .. } | Classification::Unchanged { .. } => {
                (AlertKind::EndpointsDiscovered, None, None)
            }
            Classification::Changed { old, diff, .. } => {
                let kind = if endpoints.is_empty() {
                    AlertKind::ContentChanged
                } else {
                    AlertKind::ChangedWithEndpoints
                };
                (kind, Some(old.fingerprint), summarize_diff(diff.as_str(), &self.limits))
            }
        };

        let (title, description, color) = match kind {
            AlertKind::EndpointsDiscovered => (
                "✨ New Endpoints Discovered! ✨",
                format!(
                    "New potential endpoints found in:\n**{url}**\n(JS content itself unchanged or new to tracking)"
                ),
                ColorTag::Informational,
            ),
            AlertKind::ContentChanged => (
                "🚨 JS Change Detected!",
                format!("Changes detected in:\n**{url}**"),
                ColorTag::Warning,
            ),
            AlertKind::ChangedWithEndpoints => (
                "🚨 JS Change & New Endpoints! 🚨",
                format!("Changes detected in:\n**{url}**"),
                ColorTag::Warning,
            ),
        };

        AlertPayload {
            kind,
            title: title.to_string(),
            description,
            color,
            target_url: url.to_string(),
            old_fingerprint,
            new_fingerprint: classification.fingerprint(),
            diff_summary,
            endpoints,
            report_reference,
            log_reference: self.log_reference.clone(),
            timestamp: Utc::now(),
        }
    }

    /// Renders the alert as a Discord-compatible webhook message.
    pub fn to_message(&self, alert: &AlertPayload) -> WebhookMessage {
        let mut fields = Vec::new();

        match alert.old_fingerprint {
            Some(old) => {
                fields.push(EmbedField::inline("Old Hash (MD5)", format!("`{old}`")));
                fields.push(EmbedField::inline(
                    "New Hash (MD5)",
                    format!("`{}`", alert.new_fingerprint),
                ));
            }
            None => fields.push(EmbedField::inline(
                "File Hash (MD5)",
                format!("`{}`", alert.new_fingerprint),
            )),
        }

        if let Some(report) = &alert.report_reference {
            fields.push(EmbedField::block("JS Change Log File", format!("`{report}`")));
        }

        if let Some(diff) = &alert.diff_summary {
            fields.push(EmbedField::block(
                "Code Changes Snippet (Diff):",
                format!("```diff\n{diff}\n```"),
            ));
        }

        if !alert.endpoints.is_empty() {
            fields.push(EmbedField::block(
                "Newly Discovered Endpoints:",
                summarize_endpoints(&alert.endpoints, &self.limits),
            ));
            fields.push(EmbedField::block(
                "Full Endpoint Log",
                format!("`{}`", alert.log_reference),
            ));
        }

        WebhookMessage {
            embeds: vec![Embed {
                title: alert.title.clone(),
                description: alert.description.clone(),
                color: alert.color.rgb(),
                fields,
                footer: EmbedFooter {
                    text: FOOTER.to_string(),
                },
                timestamp: alert.timestamp.to_rfc3339(),
            }],
        }
    }
}

/// Diff body without the file header, capped by line count and then by
/// character count. `None` if nothing visible is left.
pub fn summarize_diff(diff: &str, limits: &AlertLimits) -> Option<String> {
    let lines: Vec<&str> = diff.lines().collect();
    let body = if lines.len() > DIFF_HEADER_LINES {
        &lines[DIFF_HEADER_LINES..]
    } else {
        &lines[..]
    };

    let shown = body.len().min(limits.max_diff_lines);
    let mut snippet = body[..shown].join("\n");
    if body.len() > shown {
        snippet.push_str(&format!("\n... (and {} more lines)", body.len() - shown));
    }
    let snippet = cap_chars(snippet, limits.max_field_chars);

    if snippet.trim().is_empty() {
        None
    } else {
        Some(snippet)
    }
}

/// Bulleted endpoint list, showing at most `max_endpoints_shown`.
pub fn summarize_endpoints(endpoints: &[String], limits: &AlertLimits) -> String {
    let shown = endpoints.len().min(limits.max_endpoints_shown);
    let mut list = endpoints[..shown]
        .iter()
        .map(|ep| format!("- `{ep}`"))
        .collect::<Vec<_>>()
        .join("\n");
    if endpoints.len() > shown {
        list.push_str(&format!("\n... (and {} more)", endpoints.len() - shown));
    }
    cap_chars(list, limits.max_field_chars)
}

fn cap_chars(text: String, max_chars: usize) -> String {
    const MARKER: &str = "\n... (truncated)";
    if text.chars().count() <= max_chars {
        return text;
    }
    let keep = max_chars.saturating_sub(20);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(MARKER);
    cut
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookMessage {
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn inline(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline: true,
        }
    }

    fn block(name: &str, value: String) -> Self {
        Self {
            name: name.to_string(),
            value,
            inline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}
