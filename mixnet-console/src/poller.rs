/**
 * CONSOLE LOOP - Poller + glue between client, state and view
 *
 * ROLE:
 * Owns the application state and drives it: initial node list, periodic
 * connection polling, detail fetches on transitions, node detail view and
 * command forms.
 *
 * SCHEDULING:
 * - node list fetched first, retried every interval until it succeeds
 * - then: poll connected -> reconcile -> wait interval -> poll again
 *   (a poll is never issued while the previous one is in flight)
 * - shutdown is watched during every await, in-flight requests included
 * - detail fetches run as spawned tasks; answers come back on a channel and
 *   are applied by the loop, in arrival order
 */

use crate::client::ConsoleClient;
use crate::commands::{self, SubmitOutcome};
use crate::config::ConsoleConfig;
use crate::error::Result;
use crate::i18n::{load_bundle, ResourceBundle};
use crate::models::{DetailQuery, ValuesEnvelope};
use crate::reconciler::{DetailOutcome, DetailRequest, Reconciliation, Transition};
use crate::render::render_flat;
use crate::state::ConsoleState;
use crate::view::ConsoleView;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Answer of a spawned detail fetch
#[derive(Debug)]
pub struct DetailResponse {
    pub node_id: String,
    pub seq: u64,
    pub result: Result<ValuesEnvelope>,
}

pub struct Console<V: ConsoleView> {
    config: ConsoleConfig,
    client: ConsoleClient,
    bundle: ResourceBundle,
    state: ConsoleState,
    view: V,
    details_tx: mpsc::UnboundedSender<DetailResponse>,
    details_rx: mpsc::UnboundedReceiver<DetailResponse>,
}

impl<V: ConsoleView> Console<V> {
    /// Loads the resource bundle; on failure the operator is alerted and the
    /// console carries on with raw keys as labels.
    pub fn new(config: ConsoleConfig, client: ConsoleClient, mut view: V) -> Self {
        let bundle = match load_bundle(&config) {
            Ok((locale, bundle)) => {
                info!("using resource bundle {}", locale);
                bundle
            }
            Err(e) => {
                warn!("resource bundle load failed: {}", e);
                view.alert(&format!("Unable to load language resources: {e}"));
                ResourceBundle::default()
            }
        };
        Self::with_bundle(config, client, bundle, view)
    }

    pub fn with_bundle(config: ConsoleConfig, client: ConsoleClient, bundle: ResourceBundle, view: V) -> Self {
        let (details_tx, details_rx) = mpsc::unbounded_channel();
        Self { config, client, bundle, state: ConsoleState::new(), view, details_tx, details_rx }
    }

    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ConsoleState {
        &mut self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn bundle(&self) -> &ResourceBundle {
        &self.bundle
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config.poll_interval_ms)
    }

    /// Registers the configured nodes and shows one pending tab per node.
    pub async fn fetch_configured_nodes(&mut self) -> Result<usize> {
        let nodes = self.client.fetch_nodes().await?;
        let count = nodes.len();
        let added = self.state.registry.register_all(nodes);
        if !added.is_empty() {
            let entries: Vec<_> = added.iter().filter_map(|id| self.state.registry.get(id)).collect();
            self.view.show_tabs(&entries);
        }
        info!("{} configured nodes ({} new)", count, added.len());
        Ok(count)
    }

    /// One poll tick: fetch the connection snapshot, reconcile, issue detail fetches.
    pub async fn poll_once(&mut self) -> Result<Reconciliation> {
        let snapshot = self.client.fetch_connected().await?;
        let reconciliation = self.state.reconcile(snapshot);

        for transition in &reconciliation.transitions {
            match transition {
                Transition::Connected(id) => {
                    info!("node {} connected", id);
                    self.view.tab_connected(id);
                }
                Transition::Disconnected(id) => {
                    info!("node {} disconnected", id);
                    self.view.tab_disconnected(id);
                }
            }
        }
        for request in &reconciliation.fetches {
            self.spawn_detail_fetch(request.clone());
        }
        Ok(reconciliation)
    }

    fn spawn_detail_fetch(&self, request: DetailRequest) {
        let client = self.client.clone();
        let tx = self.details_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_details(&request.query).await;
            // receiver only goes away with the console itself
            let _ = tx.send(DetailResponse { node_id: request.node_id, seq: request.seq, result });
        });
    }

    /// Applies a detail answer and redraws the node's pane.
    pub fn handle_detail_response(&mut self, response: DetailResponse) -> Option<DetailOutcome> {
        let envelope = match response.result {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("detail fetch for {} failed: {}", response.node_id, e);
                return None;
            }
        };

        let outcome = self.state.apply_details(
            &response.node_id,
            response.seq,
            envelope.values,
            &self.bundle,
            self.config.discard_stale_responses,
        );
        match &outcome {
            DetailOutcome::Applied(id) => {
                if let Some(entry) = self.state.registry.get(id) {
                    self.view.show_pane(entry);
                }
            }
            DetailOutcome::Stale { node_id, seq, newest } => {
                debug!("dropping stale details for {} (seq {} < {})", node_id, seq, newest);
            }
        }
        Some(outcome)
    }

    /// Waits for the next detail answer and applies it.
    pub async fn apply_next_detail(&mut self) -> Option<DetailOutcome> {
        let response = self.details_rx.recv().await?;
        self.handle_detail_response(response)
    }

    /// Node detail view: details then statistics as flat tables.
    /// Returns false when `name` is already the visible node.
    pub async fn show_node_detail(&mut self, name: &str) -> Result<bool> {
        if self.state.visible_node.as_deref() == Some(name) {
            return Ok(false);
        }
        self.state.visible_node = Some(name.to_string());

        let details = match self.client.fetch_details(&DetailQuery::ByNode(name.to_string())).await {
            Ok(details) => details,
            Err(e) => {
                self.state.visible_node = None;
                return Err(e);
            }
        };
        let details_table = render_flat(&details.values, &self.bundle);

        let stats_table = match self.client.fetch_statistics(name).await {
            Ok(stats) => Some(render_flat(&stats.values, &self.bundle)),
            Err(e) => {
                warn!("statistics fetch for {} failed: {}", name, e);
                None
            }
        };

        self.view.show_node_detail(name, &details_table, stats_table.as_ref());
        Ok(true)
    }

    /// Fetches the command catalogue and shows forms for commands not seen before.
    pub async fn fetch_commands(&mut self) -> Result<Vec<String>> {
        let catalogue = self.client.fetch_commands().await?;
        let created = self.state.sync_commands(catalogue);
        for id in &created {
            if let Some(form) = self.state.forms.get(id) {
                self.view.show_form(form);
            }
        }
        Ok(created)
    }

    /// Submits a command form and redraws it with its outcome.
    pub async fn submit_command(&mut self, command_id: &str) -> Result<SubmitOutcome> {
        let form = self.state.form_mut(command_id)?;
        let outcome = commands::submit(&self.client, form).await?;
        self.view.show_form(form);
        Ok(outcome)
    }

    /// Main loop, until `shutdown` resolves.
    pub async fn run<F: Future<Output = ()>>(&mut self, shutdown: F) -> Result<()> {
        let interval = self.poll_interval();
        tokio::pin!(shutdown);

        loop {
            let fetched = tokio::select! {
                _ = &mut shutdown => return Ok(()),
                fetched = self.fetch_configured_nodes() => fetched,
            };
            match fetched {
                Ok(_) => break,
                Err(e) => warn!("node list fetch failed, retrying in {:?}: {}", interval, e),
            }
            tokio::select! {
                _ = &mut shutdown => return Ok(()),
                _ = tokio::time::sleep(interval) => {}
            }
        }

        let commands = tokio::select! {
            _ = &mut shutdown => return Ok(()),
            commands = self.fetch_commands() => commands,
        };
        if let Err(e) = commands {
            warn!("command catalogue fetch failed: {}", e);
        }

        let next_poll = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(next_poll);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("console loop stopped");
                    return Ok(());
                }
                Some(response) = self.details_rx.recv() => {
                    self.handle_detail_response(response);
                }
                _ = &mut next_poll => {
                    let polled = tokio::select! {
                        _ = &mut shutdown => {
                            info!("console loop stopped during a poll");
                            return Ok(());
                        }
                        polled = self.poll_once() => polled,
                    };
                    if let Err(e) = polled {
                        warn!("connection poll failed: {}", e);
                    }
                    next_poll.as_mut().reset(Instant::now() + interval);
                }
            }
        }
    }
}
