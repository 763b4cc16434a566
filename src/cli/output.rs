//! Output formatting for the CLI tools.
//!
//! Human, JSON and raw renderings of varbind lists and tables.

use std::io::{self, Write};
use std::net::SocketAddr;
use std::time::Duration;

use serde::Serialize;

use crate::cli::args::OutputFormat;
use crate::cli::hints;
use crate::client::Table;
use crate::engine::StatsSnapshot;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Formatting switches.
#[derive(Debug, Clone, Copy)]
pub struct OutputContext {
    pub format: OutputFormat,
    pub show_hints: bool,
    pub force_hex: bool,
}

#[derive(Debug, Serialize)]
struct VarBindRecord {
    oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(rename = "type")]
    value_type: String,
    value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    formatted: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResultsDocument<'a> {
    target: String,
    version: String,
    results: &'a [VarBindRecord],
    #[serde(skip_serializing_if = "Option::is_none")]
    timing_ms: Option<f64>,
}

#[derive(Debug, Serialize)]
struct RowRecord {
    index: String,
    cells: Vec<Option<serde_json::Value>>,
}

impl OutputContext {
    /// Write varbinds to stdout.
    pub fn write_results(
        &self,
        target: SocketAddr,
        version: Version,
        varbinds: &[VarBind],
        elapsed: Option<Duration>,
    ) -> io::Result<()> {
        let records: Vec<_> = varbinds.iter().map(|vb| self.record(vb)).collect();
        let mut out = io::stdout().lock();

        match self.format {
            OutputFormat::Human => {
                for r in &records {
                    let shown = r.formatted.clone().unwrap_or_else(|| json_text(&r.value, true));
                    match &r.name {
                        Some(name) => writeln!(out, "{} ({}) = {}: {}", r.oid, name, r.value_type, shown)?,
                        None => writeln!(out, "{} = {}: {}", r.oid, r.value_type, shown)?,
                    }
                }
                if let Some(elapsed) = elapsed {
                    writeln!(out, "\nTiming: {:.1}ms", elapsed.as_secs_f64() * 1000.0)?;
                }
            }
            OutputFormat::Json => {
                let doc = ResultsDocument {
                    target: target.to_string(),
                    version: version.to_string(),
                    results: &records,
                    timing_ms: elapsed.map(|d| d.as_secs_f64() * 1000.0),
                };
                let json = serde_json::to_string_pretty(&doc).map_err(io::Error::other)?;
                writeln!(out, "{}", json)?;
            }
            OutputFormat::Raw => {
                for r in &records {
                    writeln!(out, "{}\t{}", r.oid, json_text(&r.value, false))?;
                }
            }
        }
        Ok(())
    }

    /// Write a table to stdout, one line per row.
    pub fn write_table(&self, table: &Table) -> io::Result<()> {
        let mut out = io::stdout().lock();
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<RowRecord> = table
                    .rows()
                    .map(|(index, cells)| RowRecord {
                        index: index.to_string(),
                        cells: cells
                            .iter()
                            .map(|c| c.as_ref().map(|v| format_value(v, self.force_hex).1))
                            .collect(),
                    })
                    .collect();
                let json = serde_json::to_string_pretty(&rows).map_err(io::Error::other)?;
                writeln!(out, "{}", json)?;
            }
            OutputFormat::Human | OutputFormat::Raw => {
                let sep = if self.format == OutputFormat::Raw { "\t" } else { " | " };
                for (index, cells) in table.rows() {
                    let shown: Vec<String> = cells
                        .iter()
                        .map(|c| match c {
                            Some(v) => {
                                let (_, json, formatted) = format_value(v, self.force_hex);
                                formatted.unwrap_or_else(|| json_text(&json, false))
                            }
                            None => String::new(),
                        })
                        .collect();
                    writeln!(out, "{}{}{}", index, sep, shown.join(sep))?;
                }
            }
        }
        Ok(())
    }

    fn record(&self, vb: &VarBind) -> VarBindRecord {
        let (value_type, value, formatted) = format_value(&vb.value, self.force_hex);
        VarBindRecord {
            oid: vb.oid.to_string(),
            name: if self.show_hints {
                hints::describe(&vb.oid)
            } else {
                None
            },
            value_type,
            value,
            formatted,
        }
    }
}

/// Returns (type name, JSON value, display override).
fn format_value(value: &Value, force_hex: bool) -> (String, serde_json::Value, Option<String>) {
    use serde_json::Value as J;

    let type_name = value.value_type().to_string();
    match value {
        Value::Boolean(b) => (type_name, J::Bool(*b), None),
        Value::Integer(v) => (type_name, (*v).into(), None),
        Value::OctetString(bytes) if force_hex || !is_printable(bytes) => (
            "Hex-STRING".into(),
            J::String(hex_string(bytes)),
            Some(spaced_hex(bytes)),
        ),
        Value::OctetString(bytes) => (
            type_name,
            J::String(String::from_utf8_lossy(bytes).into_owned()),
            None,
        ),
        Value::Null => (type_name, J::Null, Some(String::new())),
        Value::ObjectIdentifier(oid) => {
            let named = hints::describe(oid).map(|n| format!("{} ({})", oid, n));
            (type_name, J::String(oid.to_string()), named)
        }
        Value::IpAddress(_) => (type_name, J::String(value.to_string()), None),
        Value::Counter32(v) | Value::Gauge32(v) => (type_name, (*v).into(), None),
        Value::TimeTicks(v) => (type_name, (*v).into(), Some(format!("({}) {}", v, value))),
        Value::Opaque(bytes) => (
            type_name,
            J::String(hex_string(bytes)),
            Some(spaced_hex(bytes)),
        ),
        Value::Counter64(v) => (type_name, (*v).into(), None),
        Value::NoSuchObject => (type_name, J::Null, Some("No Such Object available".into())),
        Value::NoSuchInstance => (
            type_name,
            J::Null,
            Some("No Such Instance currently exists".into()),
        ),
        Value::EndOfMibView => (
            type_name,
            J::Null,
            Some("No more variables left in this MIB View".into()),
        ),
    }
}

fn json_text(value: &serde_json::Value, quote: bool) -> String {
    match value {
        serde_json::Value::String(s) if quote => format!("\"{}\"", s),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_printable(bytes: &[u8]) -> bool {
    std::str::from_utf8(bytes).is_ok_and(|s| {
        s.chars()
            .all(|c| c.is_ascii_graphic() || c.is_ascii_whitespace())
    })
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn spaced_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print engine counters to stderr when verbose.
pub fn write_stats(stats: &StatsSnapshot) {
    eprintln!("{}", stats);
}

pub fn write_error(err: &crate::Error) {
    eprintln!("Error: {}", err);
}
