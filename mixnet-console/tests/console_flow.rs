use console_devkit::test_utils::sample_details;
use console_devkit::{TestHarness, ViewEvent};
use mixnet_console::render::DisplayValue;
use mixnet_console::{DetailOutcome, Pane, SubmitOutcome, TabStatus};
use serde_json::json;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

fn vm_row<'a>(pane: &'a Pane, label: &str) -> Option<&'a DisplayValue> {
    match pane {
        Pane::Details(tables) => tables.iter().find(|t| t.title.as_deref() == Some("VM"))?.get(label),
        _ => None,
    }
}

#[tokio::test]
async fn test_connect_fetches_details_once_and_renders_pane() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();

    assert_eq!(console.state().registry.get("h1").unwrap().pane, Pane::Pending);

    // first report of a down node: marked disconnected, nothing fetched
    let first = console.poll_once().await.unwrap();
    assert_eq!(first.transitions.len(), 2);
    assert!(first.fetches.is_empty());
    assert_eq!(console.state().registry.get("h1").unwrap().pane, Pane::NotConnected);
    assert_eq!(console.view().disconnected_count("h1"), 1);
    assert_eq!(harness.backend.request_count("details"), 0);

    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    let second = console.poll_once().await.unwrap();
    assert_eq!(second.fetches.len(), 1);

    let outcome = tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();
    assert_eq!(outcome, Some(DetailOutcome::Applied("h1".into())));

    let details = harness.backend.requests("details");
    assert_eq!(details.len(), 1);
    assert_eq!(details[0].field("name"), Some("node1"));

    let view = console.view();
    assert_eq!(view.connected_count("h1"), 1);
    let pane = view.last_pane("h1").unwrap();
    assert_eq!(vm_row(pane, "Free Memory"), Some(&DisplayValue::Text("1.5mb".into())));
    assert_eq!(vm_row(pane, "Total Memory"), Some(&DisplayValue::Text("2mb".into())));
    assert_eq!(vm_row(pane, "Up-Time"), Some(&DisplayValue::Text("1d 1h 1m 1s".into())));

    // steady state: no new transition, no new fetch
    let third = console.poll_once().await.unwrap();
    assert!(third.transitions.is_empty());
    assert_eq!(harness.backend.request_count("details"), 1);
    assert_eq!(console.view().connected_count("h1"), 1);
}

#[tokio::test]
async fn test_disconnect_resets_pane_without_fetch() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();

    console.poll_once().await.unwrap();
    tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();

    harness.backend.set_connected(json!({"h1": false, "h2": false}));
    let reconciliation = console.poll_once().await.unwrap();
    assert!(reconciliation.fetches.is_empty());

    let entry = console.state().registry.get("h1").unwrap();
    assert_eq!(entry.status, TabStatus::Disconnected);
    assert_eq!(entry.pane, Pane::NotConnected);
    assert_eq!(console.view().disconnected_count("h1"), 1);
    assert_eq!(harness.backend.request_count("details"), 1);
}

#[tokio::test]
async fn test_node_missing_from_snapshot_keeps_its_tab() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();
    console.poll_once().await.unwrap();
    tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();

    harness.backend.set_connected(json!({"h2": false}));
    assert!(console.poll_once().await.unwrap().transitions.is_empty());
    let entry = console.state().registry.get("h1").unwrap();
    assert_eq!(entry.status, TabStatus::Connected);
    assert!(matches!(entry.pane, Pane::Details(_)));

    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    assert!(console.poll_once().await.unwrap().fetches.is_empty());
    assert_eq!(harness.backend.request_count("details"), 1);
    assert_eq!(console.view().disconnected_count("h1"), 0);
}

#[tokio::test]
async fn test_reconnect_fetches_again() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();

    for connected in [true, false, true] {
        harness.backend.set_connected(json!({"h1": connected, "h2": false}));
        console.poll_once().await.unwrap();
    }
    assert!(harness.wait_until(WAIT, || harness.backend.request_count("details") == 2).await);
    assert_eq!(console.view().connected_count("h1"), 2);
    assert_eq!(console.view().disconnected_count("h1"), 1);
}

#[tokio::test]
async fn test_failed_poll_keeps_previous_snapshot() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();
    console.poll_once().await.unwrap();

    harness.backend.fail("connected");
    assert!(console.poll_once().await.is_err());
    assert!(console.state().connection.is_connected("h1"));

    harness.backend.recover("connected");
    let reconciliation = console.poll_once().await.unwrap();
    assert!(reconciliation.transitions.is_empty());
    assert_eq!(console.view().connected_count("h1"), 1);
}

#[tokio::test]
async fn test_unconfigured_node_gets_a_tab() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    harness.backend.set_details("h3", sample_details("h3", "h3"));
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();

    harness.backend.set_connected(json!({"h1": false, "h2": false, "h3": true}));
    let reconciliation = console.poll_once().await.unwrap();
    assert_eq!(reconciliation.fetches.len(), 1);
    tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();

    assert!(console.state().registry.contains("h3"));
    let details = harness.backend.requests("details");
    assert_eq!(details[0].field("node"), Some("h3"));
}

#[tokio::test]
async fn test_stale_details_discarded_when_enabled() {
    let mut harness = TestHarness::with_two_nodes().await.unwrap();
    harness.config.discard_stale_responses = true;
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();

    let mut old = sample_details("h1", "node1");
    old["info"]["version"] = json!("old");
    harness.backend.set_details("node1", old);
    harness.backend.delay_details("node1", Duration::from_millis(300));

    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    console.poll_once().await.unwrap();
    assert!(harness.wait_until(WAIT, || harness.backend.request_count("details") == 1).await);

    let mut new = sample_details("h1", "node1");
    new["info"]["version"] = json!("new");
    harness.backend.set_details("node1", new);
    harness.backend.delay_details("node1", Duration::ZERO);

    harness.backend.set_connected(json!({"h1": false, "h2": false}));
    console.poll_once().await.unwrap();
    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    console.poll_once().await.unwrap();

    let first = tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();
    assert_eq!(first, Some(DetailOutcome::Applied("h1".into())));
    let second = tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();
    assert!(matches!(second, Some(DetailOutcome::Stale { .. })));

    let descriptor = console.state().registry.get("h1").unwrap().descriptor.clone().unwrap();
    assert_eq!(descriptor.section("info").unwrap()["version"], json!("new"));
}

#[tokio::test]
async fn test_last_detail_response_wins_by_default() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    let mut console = harness.console().unwrap();
    console.fetch_configured_nodes().await.unwrap();

    let mut old = sample_details("h1", "node1");
    old["info"]["version"] = json!("old");
    harness.backend.set_details("node1", old);
    harness.backend.delay_details("node1", Duration::from_millis(300));

    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    console.poll_once().await.unwrap();
    assert!(harness.wait_until(WAIT, || harness.backend.request_count("details") == 1).await);

    harness.backend.set_details("node1", sample_details("h1", "node1"));
    harness.backend.delay_details("node1", Duration::ZERO);
    harness.backend.set_connected(json!({"h1": false, "h2": false}));
    console.poll_once().await.unwrap();
    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    console.poll_once().await.unwrap();

    for _ in 0..2 {
        let outcome = tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();
        assert_eq!(outcome, Some(DetailOutcome::Applied("h1".into())));
    }
    let descriptor = console.state().registry.get("h1").unwrap().descriptor.clone().unwrap();
    assert_eq!(descriptor.section("info").unwrap()["version"], json!("old"));
}

#[tokio::test]
async fn test_node_detail_view_with_statistics() {
    let harness = TestHarness::new().await.unwrap();
    harness.backend.set_details(
        "node-x",
        json!({"name": "node-x", "vm.free-memory": 2097152, "vm.up-time": 59000}),
    );
    harness.backend.set_statistics(
        "node-x",
        json!({"name": "node-x", "board.hosting.service": {"boardA": "node1"}}),
    );
    let mut console = harness.console().unwrap();

    assert!(console.show_node_detail("node-x").await.unwrap());
    let event = console.view().events.last().cloned().unwrap();
    let ViewEvent::NodeDetail { name, details, statistics } = event else {
        panic!("expected node detail, got {:?}", event);
    };
    assert_eq!(name, "node-x");
    assert_eq!(details.rows.len(), 2);
    assert_eq!(details.get("Free Memory"), Some(&DisplayValue::Text("2mb".into())));
    assert_eq!(details.get("Up-Time"), Some(&DisplayValue::Text("59s".into())));
    let statistics = statistics.unwrap();
    assert_eq!(
        statistics.get("Board Hosting Service"),
        Some(&DisplayValue::Map(vec![("boardA".into(), "node1".into())]))
    );

    // same node again: nothing fetched, nothing redrawn
    let events = console.view().events.len();
    assert!(!console.show_node_detail("node-x").await.unwrap());
    assert_eq!(harness.backend.request_count("details"), 1);
    assert_eq!(harness.backend.request_count("statistics"), 1);
    assert_eq!(console.view().events.len(), events);
    assert_eq!(harness.backend.requests("details")[0].field("node"), Some("node-x"));
}

#[tokio::test]
async fn test_node_detail_failure_allows_retry() {
    let harness = TestHarness::new().await.unwrap();
    let mut console = harness.console().unwrap();

    assert!(console.show_node_detail("ghost").await.is_err());
    assert_eq!(console.state().visible_node, None);

    harness.backend.set_details("ghost", json!({"name": "ghost"}));
    assert!(console.show_node_detail("ghost").await.unwrap());
    assert_eq!(harness.backend.request_count("details"), 2);
}

fn shuffle_catalogue() -> serde_json::Value {
    json!([
        {"id": 1, "title": "Shuffle", "parameters": [
            {"name": "Board Name"},
            {"name": "Nodes", "vargs": true}
        ]},
        {"id": 2, "title": "Stop", "parameters": null}
    ])
}

#[tokio::test]
async fn test_command_failure_keeps_form_values() {
    let harness = TestHarness::new().await.unwrap();
    harness.backend.set_commands(shuffle_catalogue());
    harness.backend.push_invoke_response(json!({"successful": false, "message": "bad arg"}));
    let mut console = harness.console().unwrap();

    assert_eq!(console.fetch_commands().await.unwrap(), vec!["1".to_string(), "2".to_string()]);
    assert!(console.fetch_commands().await.unwrap().is_empty());

    console.state_mut().form_mut("1").unwrap().fill(&["board", "A", "B"]).unwrap();
    let outcome = console.submit_command("1").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Failed("bad arg".into()));

    let form = console.view().last_form("1").unwrap();
    assert_eq!(form.error.as_deref(), Some("bad arg"));
    let values: Vec<_> = form.params.iter().flat_map(|p| p.fields.iter().map(|f| f.value.clone())).collect();
    assert_eq!(values, vec!["board", "A", "B"]);

    let invoke = harness.backend.requests("invoke");
    assert_eq!(
        invoke[0].form,
        vec![
            ("cmd".to_string(), "1".to_string()),
            ("0".to_string(), "board".to_string()),
            ("1".to_string(), "A".to_string()),
            ("1".to_string(), "B".to_string()),
        ]
    );

    // next submit succeeds and clears the error
    let outcome = console.submit_command("1").await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));
    assert_eq!(console.view().last_form("1").unwrap().error, None);
}

#[tokio::test]
async fn test_unknown_command_is_an_error() {
    let harness = TestHarness::new().await.unwrap();
    let mut console = harness.console().unwrap();
    assert!(console.submit_command("99").await.is_err());
    assert_eq!(harness.backend.request_count("invoke"), 0);
}

#[tokio::test]
async fn test_missing_bundle_dir_alerts_and_uses_keys() {
    let mut harness = TestHarness::with_two_nodes().await.unwrap();
    harness.config.lang_dir = Some("/nonexistent/mixnet-console/lang".into());
    harness.config.locale = Some("fr_FR".into());
    harness.backend.set_connected(json!({"h1": true, "h2": false}));
    let mut console = harness.console().unwrap();

    assert_eq!(console.view().alerts().len(), 1);

    console.fetch_configured_nodes().await.unwrap();
    console.poll_once().await.unwrap();
    tokio::time::timeout(WAIT, console.apply_next_detail()).await.unwrap();

    let Pane::Details(tables) = &console.state().registry.get("h1").unwrap().pane else {
        panic!("expected details pane");
    };
    let vm = tables.iter().find(|t| t.title.as_deref() == Some("vm.title")).unwrap();
    assert_eq!(vm.get("vm.free-memory"), Some(&DisplayValue::Text("1572864".into())));
}

#[tokio::test]
async fn test_run_retries_node_list_then_polls() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    harness.backend.set_commands(shuffle_catalogue());
    harness.backend.fail("nodes");
    let mut console = harness.console().unwrap();

    let backend = harness.backend.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        backend.recover("nodes");
        backend.set_connected(json!({"h1": true, "h2": false}));
    });

    console.run(tokio::time::sleep(Duration::from_millis(800))).await.unwrap();

    assert!(harness.backend.request_count("nodes") >= 2);
    assert!(harness.backend.request_count("connected") >= 2);
    assert_eq!(harness.backend.request_count("details"), 1);
    assert_eq!(console.state().forms().count(), 2);

    let view = console.view();
    assert!(view.events.iter().any(|e| matches!(e, ViewEvent::Tabs(ids) if ids.len() == 2)));
    assert_eq!(view.connected_count("h1"), 1);
    assert!(matches!(view.last_pane("h1"), Some(Pane::Details(_))));
}

#[tokio::test]
async fn test_run_stops_while_node_list_unavailable() {
    let harness = TestHarness::with_two_nodes().await.unwrap();
    harness.backend.fail("nodes");
    let mut console = harness.console().unwrap();

    console.run(tokio::time::sleep(Duration::from_millis(200))).await.unwrap();
    assert_eq!(harness.backend.request_count("connected"), 0);
    assert!(console.state().registry.is_empty());
}

#[tokio::test]
async fn test_run_stops_during_a_slow_poll() {
    let mut harness = TestHarness::with_two_nodes().await.unwrap();
    harness.config.request_timeout_ms = 10_000;
    harness.backend.delay_endpoint("connected", Duration::from_secs(5));
    let mut console = harness.console().unwrap();

    let started = std::time::Instant::now();
    let stopped = tokio::time::timeout(WAIT, console.run(tokio::time::sleep(Duration::from_millis(300)))).await;
    assert!(matches!(stopped, Ok(Ok(()))));
    assert!(started.elapsed() < WAIT);
    assert_eq!(harness.backend.request_count("connected"), 1);
}

#[tokio::test]
async fn test_surplus_values_rejected_before_invoke() {
    let harness = TestHarness::new().await.unwrap();
    harness.backend.set_commands(shuffle_catalogue());
    let mut console = harness.console().unwrap();
    console.fetch_commands().await.unwrap();

    assert!(console.state_mut().form_mut("2").unwrap().fill(&["foo"]).is_err());
    assert_eq!(harness.backend.request_count("invoke"), 0);
}
