//! Rendering seam between the console loop and the operator's screen.

use crate::commands::CommandForm;
use crate::render::{DisplayTable, DisplayValue};
use crate::state::{NodeEntry, Pane, TabStatus};
use std::io::Write;
use tracing::warn;

pub const PENDING_TEXT: &str = "Pending..";
pub const NOT_CONNECTED_TEXT: &str = "Not connected.";

/// Receives every state change the console wants displayed
pub trait ConsoleView {
    /// One tab per configured node, bodies pending
    fn show_tabs(&mut self, nodes: &[&NodeEntry]);
    fn tab_connected(&mut self, node_id: &str);
    /// Tab marked disconnected, detail pane cleared
    fn tab_disconnected(&mut self, node_id: &str);
    /// Detail pane of a node tab
    fn show_pane(&mut self, node: &NodeEntry);
    fn show_node_detail(&mut self, name: &str, details: &DisplayTable, statistics: Option<&DisplayTable>);
    fn show_form(&mut self, form: &CommandForm);
    fn alert(&mut self, message: &str);
}

/// Plain-text view writing to stdout (or any writer)
pub struct TerminalView<W: Write> {
    out: W,
}

impl TerminalView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            warn!("terminal write failed: {}", e);
        }
    }

    fn emit_table(&mut self, table: &DisplayTable) {
        if let Some(title) = &table.title {
            self.emit(&format!("-- {title}"));
        }
        let width = table.rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
        for row in &table.rows {
            match &row.value {
                DisplayValue::List(_) | DisplayValue::Map(_) => {
                    self.emit(&format!("  {}", row.label));
                    for line in row.value.to_string().lines() {
                        self.emit(&format!("      {line}"));
                    }
                }
                value => self.emit(&format!("  {:<width$}  {}", row.label, value, width = width)),
            }
        }
    }
}

fn status_mark(status: TabStatus) -> &'static str {
    match status {
        TabStatus::Connected => "+",
        TabStatus::Disconnected => "-",
    }
}

impl<W: Write> ConsoleView for TerminalView<W> {
    fn show_tabs(&mut self, nodes: &[&NodeEntry]) {
        for node in nodes {
            self.emit(&format!("[{}] {} ({})", status_mark(node.status), node.summary.name, node.summary.hash));
        }
    }

    fn tab_connected(&mut self, node_id: &str) {
        self.emit(&format!("== {node_id}: connected"));
    }

    fn tab_disconnected(&mut self, node_id: &str) {
        self.emit(&format!("== {node_id}: {NOT_CONNECTED_TEXT}"));
    }

    fn show_pane(&mut self, node: &NodeEntry) {
        self.emit(&format!("== {} [{}]", node.summary.name, status_mark(node.status)));
        match &node.pane {
            Pane::Pending => self.emit(PENDING_TEXT),
            Pane::NotConnected => self.emit(NOT_CONNECTED_TEXT),
            Pane::Details(sections) => {
                for section in sections {
                    self.emit_table(section);
                }
            }
        }
    }

    fn show_node_detail(&mut self, name: &str, details: &DisplayTable, statistics: Option<&DisplayTable>) {
        self.emit(&format!("Node Details: {name}"));
        self.emit_table(details);
        if let Some(stats) = statistics {
            self.emit("Statistics");
            self.emit_table(stats);
        }
    }

    fn show_form(&mut self, form: &CommandForm) {
        self.emit(&format!("{} [{}]", form.title(), form.id()));
        for param in &form.params {
            let values: Vec<String> = param
                .fields
                .iter()
                .map(|f| if f.value.is_empty() { format!("<{}>", f.id) } else { f.value.clone() })
                .collect();
            let marker = if param.vargs { " (Add/Remove)" } else { "" };
            self.emit(&format!("  {}{}: {}", param.label, marker, values.join(", ")));
        }
        if let Some(err) = &form.error {
            self.emit(&format!("  error: {err}"));
        } else if let Some(ok) = &form.confirmation {
            self.emit(&format!("  done: {ok}"));
        }
    }

    fn alert(&mut self, message: &str) {
        self.emit(&format!("!! {message}"));
    }
}
