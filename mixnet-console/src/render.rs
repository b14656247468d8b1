/**
 * DETAIL RENDERER - Node descriptor / statistics -> display tables
 *
 * ROLE:
 * Turns the free-form attribute maps returned by the admin service into rows
 * the view can print, applying the per-field display type from the resource
 * bundle (byte sizes, timestamps, durations, lists, maps).
 *
 * Two layouts:
 * - flat table: one row per attribute, `name` skipped (node detail view, statistics)
 * - sectioned pane: info / capabilities / socket / vm blocks (node tabs)
 *
 * A value whose shape does not fit its display type is passed through unformatted.
 */

use crate::i18n::ResourceBundle;
use crate::models::NodeDescriptor;
use serde_json::{Map, Value};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

const MINUTE: u64 = 60;
const HOUR: u64 = MINUTE * 60;
const DAY: u64 = HOUR * 24;
const ONE_MB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayType {
    Megabytes,
    Time,
    Duration,
    List,
    Map,
}

impl DisplayType {
    /// Parses a bundle tag; unknown tags mean "untyped".
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "mb" => Some(Self::Megabytes),
            "time" => Some(Self::Time),
            "hms" => Some(Self::Duration),
            "list" => Some(Self::List),
            "map" => Some(Self::Map),
            _ => None,
        }
    }
}

/// A rendered cell
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Text(String),
    Date(OffsetDateTime),
    List(Vec<String>),
    Map(Vec<(String, String)>),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Text(s) => f.write_str(s),
            DisplayValue::Date(dt) => {
                f.write_str(&dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string()))
            }
            DisplayValue::List(items) => {
                let lines: Vec<String> = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| format!("{}. {}", i + 1, item))
                    .collect();
                f.write_str(&lines.join("\n"))
            }
            DisplayValue::Map(pairs) => {
                let lines: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                f.write_str(&lines.join("\n"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub label: String,
    pub value: DisplayValue,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayTable {
    pub title: Option<String>,
    pub rows: Vec<DisplayRow>,
}

impl DisplayTable {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: Some(title.into()), rows: Vec::new() }
    }

    pub fn push(&mut self, label: impl Into<String>, value: DisplayValue) {
        self.rows.push(DisplayRow { label: label.into(), value });
    }

    /// Value of the first row carrying `label`
    pub fn get(&self, label: &str) -> Option<&DisplayValue> {
        self.rows.iter().find(|r| r.label == label).map(|r| &r.value)
    }
}

/// Plain textual form of a JSON value, strings unquoted
pub fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Byte count -> megabytes rounded to 3 decimals: 1572864 -> "1.5mb"
pub fn format_megabytes(bytes: f64) -> String {
    let mb = (bytes / ONE_MB * 1000.0).round() / 1000.0;
    format!("{mb}mb")
}

/// Millis -> "Xd Xh Xm Xs", leading zero components dropped, seconds always shown
pub fn format_dhms(millis: u64) -> String {
    let mut seconds = millis / 1000;

    let days = seconds / DAY;
    seconds -= days * DAY;
    let hours = seconds / HOUR;
    seconds -= hours * HOUR;
    let minutes = seconds / MINUTE;
    seconds -= minutes * MINUTE;

    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{seconds}s"));
    out
}

fn epoch_millis_to_date(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).ok()
}

/// Applies a display type to a raw value.
pub fn apply_display_type(display: Option<DisplayType>, value: &Value) -> DisplayValue {
    let formatted = match (display, value) {
        (Some(DisplayType::Megabytes), Value::Number(n)) => {
            n.as_f64().map(|b| DisplayValue::Text(format_megabytes(b)))
        }
        (Some(DisplayType::Time), Value::Number(n)) => {
            n.as_i64().and_then(epoch_millis_to_date).map(DisplayValue::Date)
        }
        (Some(DisplayType::Duration), Value::Number(n)) => {
            n.as_u64().map(|ms| DisplayValue::Text(format_dhms(ms)))
        }
        (Some(DisplayType::List), Value::Array(items)) => {
            Some(DisplayValue::List(items.iter().map(plain).collect()))
        }
        (Some(DisplayType::List), Value::Object(map)) => {
            Some(DisplayValue::List(map.values().map(plain).collect()))
        }
        (Some(DisplayType::Map), Value::Object(map)) => Some(DisplayValue::Map(
            map.iter().map(|(k, v)| (k.clone(), plain(v))).collect(),
        )),
        _ => None,
    };
    formatted.unwrap_or_else(|| DisplayValue::Text(plain(value)))
}

/// One row per attribute, `name` skipped, labels and display types from the bundle.
pub fn render_flat(values: &Map<String, Value>, bundle: &ResourceBundle) -> DisplayTable {
    let mut table = DisplayTable::default();
    for (key, value) in values {
        if key == "name" {
            continue;
        }
        table.push(bundle.label(key), apply_display_type(bundle.display_type(key), value));
    }
    table
}

/// Sectioned pane of a node tab: info, capabilities, socket and vm blocks.
pub fn render_sections(descriptor: &NodeDescriptor, bundle: &ResourceBundle) -> Vec<DisplayTable> {
    let mut sections = Vec::with_capacity(4);

    let mut info = DisplayTable::titled(bundle.label("info.title"));
    if let Some(Value::Object(map)) = descriptor.section("info") {
        for (k, v) in map {
            info.push(k.clone(), DisplayValue::Text(plain(v)));
        }
    }
    sections.push(info);

    let mut capabilities = DisplayTable::titled(bundle.label("capabilities.title"));
    let caps = descriptor.section("node.capabilities").cloned().unwrap_or(Value::Array(Vec::new()));
    capabilities.push(
        bundle.label("node.capabilities"),
        apply_display_type(Some(DisplayType::List), &caps),
    );
    sections.push(capabilities);

    for prefix in ["socket", "vm"] {
        let mut table = DisplayTable::titled(bundle.label(&format!("{prefix}.title")));
        if let Some(Value::Object(map)) = descriptor.section(prefix) {
            for (k, v) in map {
                let key = format!("{prefix}.{k}");
                table.push(bundle.label(&key), apply_display_type(bundle.display_type(&key), v));
            }
        }
        sections.push(table);
    }

    sections
}
