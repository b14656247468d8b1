//! Connection-state reconciliation.
//!
//! `diff` compares two snapshots; `ConsoleState::reconcile` applies the
//! resulting transitions to the registry and says which detail fetches to issue.

use crate::i18n::ResourceBundle;
use crate::models::{ConnectionState, DetailQuery, NodeDescriptor};
use crate::render::render_sections;
use crate::state::{ConsoleState, Pane, TabStatus};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Connected(String),
    Disconnected(String),
}

impl Transition {
    pub fn node_id(&self) -> &str {
        match self {
            Transition::Connected(id) | Transition::Disconnected(id) => id,
        }
    }
}

/// A detail fetch to issue, tagged with its request sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub node_id: String,
    pub query: DetailQuery,
    pub seq: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub transitions: Vec<Transition>,
    pub fetches: Vec<DetailRequest>,
}

/// Nodes whose reported flag differs from what `old` knew. The first report
/// of a node is a change too, so a node reported down from the start is marked
/// disconnected. Nodes missing from `new` keep their previous state.
pub fn diff(old: &ConnectionState, new: &ConnectionState) -> Vec<Transition> {
    new.iter()
        .filter(|(id, connected)| old.get(id) != Some(**connected))
        .map(|(id, connected)| {
            if *connected {
                Transition::Connected(id.clone())
            } else {
                Transition::Disconnected(id.clone())
            }
        })
        .collect()
}

/// Outcome of feeding a detail response to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Applied(String),
    Stale { node_id: String, seq: u64, newest: u64 },
}

impl ConsoleState {
    /// Merges a connection snapshot into the known state and applies every
    /// transition it implies.
    pub fn reconcile(&mut self, snapshot: ConnectionState) -> Reconciliation {
        let transitions = diff(&self.connection, &snapshot);
        let mut fetches = Vec::new();

        for transition in &transitions {
            let node_id = transition.node_id();
            if self.registry.ensure(node_id) {
                debug!("node {} reported by the service but not configured", node_id);
            }
            match transition {
                Transition::Connected(_) => {
                    let seq = self.next_request_seq();
                    let Some(entry) = self.registry.get_mut(node_id) else { continue };
                    entry.status = TabStatus::Connected;
                    let query = if entry.configured {
                        DetailQuery::ByName(entry.summary.name.clone())
                    } else {
                        DetailQuery::ByNode(node_id.to_string())
                    };
                    fetches.push(DetailRequest { node_id: node_id.to_string(), query, seq });
                }
                Transition::Disconnected(_) => {
                    if let Some(entry) = self.registry.get_mut(node_id) {
                        entry.status = TabStatus::Disconnected;
                        entry.pane = Pane::NotConnected;
                    }
                }
            }
        }

        self.connection.0.extend(snapshot.0);
        Reconciliation { transitions, fetches }
    }

    /// Stores a detail response as the node's new descriptor and renders its pane.
    /// Responses are applied whatever the node's current connection state is.
    pub fn apply_details(
        &mut self,
        requested_id: &str,
        seq: u64,
        values: Map<String, Value>,
        bundle: &ResourceBundle,
        discard_stale: bool,
    ) -> DetailOutcome {
        let descriptor = NodeDescriptor::from_values(requested_id, values);
        let node_id = descriptor.hash.clone();
        self.registry.ensure(&node_id);
        let Some(entry) = self.registry.get_mut(&node_id) else {
            return DetailOutcome::Applied(node_id);
        };

        if let Some(newest) = entry.applied_seq {
            if discard_stale && seq < newest {
                return DetailOutcome::Stale { node_id, seq, newest };
            }
        }

        entry.applied_seq = Some(entry.applied_seq.map_or(seq, |s| s.max(seq)));
        entry.pane = Pane::Details(render_sections(&descriptor, bundle));
        entry.descriptor = Some(descriptor);
        DetailOutcome::Applied(node_id)
    }
}
