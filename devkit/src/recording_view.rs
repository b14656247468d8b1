/*!
Recording view: captures every render call of the console for assertions
*/

use mixnet_console::render::DisplayTable;
use mixnet_console::{CommandForm, ConsoleView, NodeEntry, Pane};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Tabs(Vec<String>),
    Connected(String),
    Disconnected(String),
    Pane { node_id: String, pane: Pane },
    NodeDetail { name: String, details: DisplayTable, statistics: Option<DisplayTable> },
    Form(CommandForm),
    Alert(String),
}

#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected_count(&self, node_id: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ViewEvent::Connected(id) if id == node_id))
            .count()
    }

    pub fn disconnected_count(&self, node_id: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ViewEvent::Disconnected(id) if id == node_id))
            .count()
    }

    /// Last pane drawn for `node_id`
    pub fn last_pane(&self, node_id: &str) -> Option<&Pane> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::Pane { node_id: id, pane } if id == node_id => Some(pane),
            _ => None,
        })
    }

    pub fn last_form(&self, command_id: &str) -> Option<&CommandForm> {
        self.events.iter().rev().find_map(|e| match e {
            ViewEvent::Form(form) if form.id() == command_id => Some(form),
            _ => None,
        })
    }

    pub fn alerts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Alert(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ConsoleView for RecordingView {
    fn show_tabs(&mut self, nodes: &[&NodeEntry]) {
        self.events.push(ViewEvent::Tabs(nodes.iter().map(|n| n.summary.hash.clone()).collect()));
    }

    fn tab_connected(&mut self, node_id: &str) {
        self.events.push(ViewEvent::Connected(node_id.to_string()));
    }

    fn tab_disconnected(&mut self, node_id: &str) {
        self.events.push(ViewEvent::Disconnected(node_id.to_string()));
    }

    fn show_pane(&mut self, node: &NodeEntry) {
        self.events.push(ViewEvent::Pane { node_id: node.summary.hash.clone(), pane: node.pane.clone() });
    }

    fn show_node_detail(&mut self, name: &str, details: &DisplayTable, statistics: Option<&DisplayTable>) {
        self.events.push(ViewEvent::NodeDetail {
            name: name.to_string(),
            details: details.clone(),
            statistics: statistics.cloned(),
        });
    }

    fn show_form(&mut self, form: &CommandForm) {
        self.events.push(ViewEvent::Form(form.clone()));
    }

    fn alert(&mut self, message: &str) {
        self.events.push(ViewEvent::Alert(message.to_string()));
    }
}
