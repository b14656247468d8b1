/*!
Test harness: mock admin service + console wired to a recording view
*/

use crate::mock_backend::MockBackend;
use crate::recording_view::RecordingView;
use anyhow::Result;
use mixnet_console::{Console, ConsoleClient, ConsoleConfig, ResourceBundle};
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestHarness {
    pub backend: MockBackend,
    pub config: ConsoleConfig,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        env_logger::try_init().ok();

        let backend = MockBackend::start().await?;
        let config = ConsoleConfig {
            base_url: backend.url(),
            poll_interval_ms: 50,
            request_timeout_ms: 2_000,
            ..ConsoleConfig::default()
        };
        Ok(Self { backend, config })
    }

    /// Two configured nodes, `h1`/node1 and `h2`/node2, both disconnected,
    /// with details answered by name.
    pub async fn with_two_nodes() -> Result<Self> {
        let harness = Self::new().await?;
        harness.backend.set_nodes(json!([
            {"hash": "h1", "name": "node1"},
            {"hash": "h2", "name": "node2"}
        ]));
        harness.backend.set_connected(json!({"h1": false, "h2": false}));
        harness.backend.set_details("node1", sample_details("h1", "node1"));
        harness.backend.set_details("node2", sample_details("h2", "node2"));
        Ok(harness)
    }

    pub fn client(&self) -> Result<ConsoleClient> {
        Ok(ConsoleClient::from_config(&self.config)?)
    }

    /// Console using the built-in bundle for the configured locale
    pub fn console(&self) -> Result<Console<RecordingView>> {
        Ok(Console::new(self.config.clone(), self.client()?, RecordingView::new()))
    }

    pub fn console_with_bundle(&self, bundle: ResourceBundle) -> Result<Console<RecordingView>> {
        Ok(Console::with_bundle(self.config.clone(), self.client()?, bundle, RecordingView::new()))
    }

    /// Polls `check` every 10ms until it holds or `timeout` elapses
    pub async fn wait_until<F: FnMut() -> bool>(&self, timeout: Duration, mut check: F) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < timeout {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }
}

/// Details payload shaped like the service's: info, capabilities, socket, vm
pub fn sample_details(hash: &str, name: &str) -> Value {
    json!({
        "hash": hash,
        "name": name,
        "info": {"version": "1.0", "host": "127.0.0.1"},
        "node.capabilities": ["BOARD_HOSTING", "KEY_GENERATION"],
        "socket": {"port": 11000},
        "vm": {
            "vendor": "OpenJDK",
            "free-memory": 1572864,
            "total-memory": 2097152,
            "up-time": 90061000,
            "start-time": 0
        }
    })
}
