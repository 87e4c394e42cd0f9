use itertools::Itertools;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::source::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".csv") {
        return Some(OutputFormat::Csv);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// projects each record onto the display fields; an empty field list keeps
// every field the record carries (minus the id, which is emitted separately)
pub fn build_records(records: &[Record], fields: &[String]) -> Vec<OutputRecord> {
    records
        .iter()
        .map(|r| {
            let mut out = Map::new();
            if fields.is_empty() {
                for (key, value) in r.fields.iter() {
                    if key != "id" {
                        out.insert(key.clone(), value.clone());
                    }
                }
            } else {
                for field in fields {
                    let value = r.field(field).cloned().unwrap_or(Value::Null);
                    out.insert(field.clone(), value);
                }
            }
            OutputRecord {
                id: r.id.to_string(),
                fields: out,
            }
        })
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "--".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn render_text(records: &[OutputRecord]) -> Vec<u8> {
    let mut out = String::new();
    for r in records {
        out.push_str(&r.id);
        if !r.fields.is_empty() {
            out.push_str(" :: ");
            out.push_str(&r.fields.values().map(cell_text).join(" :: "));
        }
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(records: &[OutputRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn render_csv(records: &[OutputRecord]) -> Vec<u8> {
    let mut out = String::new();
    let header: Vec<&str> = match records.first() {
        Some(first) => std::iter::once("id")
            .chain(first.fields.keys().map(|k| k.as_str()))
            .collect(),
        None => vec!["id"],
    };
    out.push_str(&header.iter().map(|h| escape_csv(h)).join(","));
    out.push('\n');
    for r in records {
        let row = std::iter::once(escape_csv(&r.id))
            .chain(r.fields.values().map(|v| escape_csv(&cell_text(v))))
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }
    out.into_bytes()
}
