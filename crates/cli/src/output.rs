//! Rendering of command results for stdout.

use std::fmt;

use pipeline::lookup::first_str;
use pipeline::{Capabilities, Report};
use serde_json::Value;

/// Keys tried, in order, for a capability entry's display name.
const ENTRY_NAME_KEYS: &[&str] = &["name", "id", "collector"];

/// Renders a report as pretty JSON or markdown.
pub fn render_report(report: &Report, json: bool) -> serde_json::Result<String> {
    if json {
        serde_json::to_string_pretty(report)
    } else {
        Ok(report.to_markdown().to_string())
    }
}

/// Renders capabilities as pretty JSON or a markdown listing.
pub fn render_capabilities(caps: &Capabilities, json: bool) -> serde_json::Result<String> {
    if json {
        return serde_json::to_string_pretty(caps);
    }
    Ok(CapabilitiesMarkdown(caps).to_string())
}

/// Markdown listing of [`Capabilities`].
struct CapabilitiesMarkdown<'a>(&'a Capabilities);

impl fmt::Display for CapabilitiesMarkdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Gateway Capabilities")?;
        for (title, entries) in [("Collectors", &self.0.collectors), ("Providers", &self.0.providers)] {
            writeln!(f)?;
            writeln!(f, "## {title}")?;
            writeln!(f)?;
            if entries.is_empty() {
                writeln!(f, "_none reported_")?;
            }
            for entry in entries {
                writeln!(f, "- {}", entry_label(entry))?;
            }
        }
        Ok(())
    }
}

fn entry_label(entry: &Value) -> String {
    match entry {
        Value::String(name) => name.clone(),
        other => first_str(other, ENTRY_NAME_KEYS)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    }
}
