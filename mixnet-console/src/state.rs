use crate::commands::CommandForm;
use crate::models::{ConnectionState, NodeDescriptor, NodeSummary};
use crate::render::DisplayTable;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Connected,
    Disconnected,
}

/// What a node's tab body currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum Pane {
    Pending,
    NotConnected,
    Details(Vec<DisplayTable>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    pub summary: NodeSummary,
    pub descriptor: Option<NodeDescriptor>,
    pub status: TabStatus,
    pub pane: Pane,
    /// Came from the configured node list, as opposed to a connection report
    pub configured: bool,
    /// Sequence of the newest detail response applied to this entry
    pub applied_seq: Option<u64>,
}

impl NodeEntry {
    fn pending(summary: NodeSummary, configured: bool) -> Self {
        Self {
            summary,
            descriptor: None,
            status: TabStatus::Disconnected,
            pane: Pane::Pending,
            configured,
            applied_seq: None,
        }
    }
}

/// Node id -> last-known node, kept in configured order
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    entries: BTreeMap<String, NodeEntry>,
    order: Vec<String>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers configured nodes. Known ids keep their state, only the summary is refreshed.
    pub fn register_all(&mut self, nodes: Vec<NodeSummary>) -> Vec<String> {
        let mut added = Vec::new();
        for summary in nodes {
            if self.upsert(summary.clone()) {
                added.push(summary.hash);
            }
        }
        added
    }

    /// Registers one configured node. Returns true when the id was new.
    pub fn upsert(&mut self, summary: NodeSummary) -> bool {
        match self.entries.get_mut(&summary.hash) {
            Some(entry) => {
                entry.summary = summary;
                entry.configured = true;
                false
            }
            None => {
                self.insert(NodeEntry::pending(summary, true));
                true
            }
        }
    }

    /// Makes sure `node_id` has an entry; unknown ids are named after themselves
    /// and stay unconfigured.
    pub fn ensure(&mut self, node_id: &str) -> bool {
        if self.entries.contains_key(node_id) {
            return false;
        }
        self.insert(NodeEntry::pending(NodeSummary::new(node_id, node_id), false));
        true
    }

    fn insert(&mut self, entry: NodeEntry) {
        self.order.push(entry.summary.hash.clone());
        self.entries.insert(entry.summary.hash.clone(), entry);
    }

    pub fn get(&self, node_id: &str) -> Option<&NodeEntry> {
        self.entries.get(node_id)
    }

    pub fn get_mut(&mut self, node_id: &str) -> Option<&mut NodeEntry> {
        self.entries.get_mut(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.entries.contains_key(node_id)
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &NodeEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn summaries(&self) -> Vec<NodeSummary> {
        self.iter().map(|e| e.summary.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&NodeEntry> {
        self.iter().find(|e| e.summary.name == name)
    }
}

/// Whole application state, owned by the console loop
#[derive(Debug, Default)]
pub struct ConsoleState {
    pub registry: NodeRegistry,
    pub connection: ConnectionState,
    /// Node shown in the node detail view
    pub visible_node: Option<String>,
    /// Command forms keyed by command id
    pub forms: HashMap<String, CommandForm>,
    /// Ids of `forms` in catalogue order
    pub form_order: Vec<String>,
    next_seq: u64,
}

impl ConsoleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic tag for outgoing detail requests
    pub fn next_request_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub fn forms(&self) -> impl Iterator<Item = &CommandForm> {
        self.form_order.iter().filter_map(|id| self.forms.get(id))
    }
}
