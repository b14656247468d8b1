/*!
Mock admin service for console tests

Serves `POST /api/{endpoint}/{admin}` on an ephemeral local port with canned
answers, records every form it receives and can delay or fail endpoints.
*/

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub admin: String,
    pub form: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct BackendState {
    nodes: Value,
    connected: Value,
    /// Keyed by the `name` or `node` form value
    details: HashMap<String, Value>,
    statistics: HashMap<String, Value>,
    commands: Value,
    invoke_responses: VecDeque<Value>,
    detail_delays: HashMap<String, Duration>,
    endpoint_delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone)]
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<Mutex<BackendState>>,
}

impl MockBackend {
    /// Binds 127.0.0.1 on a free port and serves in a background task
    pub async fn start() -> Result<Self> {
        let state = Arc::new(Mutex::new(BackendState {
            nodes: json!([]),
            connected: json!({}),
            commands: json!([]),
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/api/{endpoint}/{admin}", post(handle))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("[mock] server stopped: {}", e);
            }
        });
        log::info!("[mock] admin service listening on {}", addr);

        Ok(Self { addr, state })
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_nodes(&self, nodes: Value) {
        self.state.lock().unwrap().nodes = nodes;
    }

    pub fn set_connected(&self, connected: Value) {
        self.state.lock().unwrap().connected = connected;
    }

    pub fn set_details(&self, key: &str, values: Value) {
        self.state.lock().unwrap().details.insert(key.to_string(), values);
    }

    pub fn set_statistics(&self, node: &str, values: Value) {
        self.state.lock().unwrap().statistics.insert(node.to_string(), values);
    }

    pub fn set_commands(&self, commands: Value) {
        self.state.lock().unwrap().commands = commands;
    }

    /// Queued answers for invoke; `{successful: true}` once the queue is empty
    pub fn push_invoke_response(&self, response: Value) {
        self.state.lock().unwrap().invoke_responses.push_back(response);
    }

    pub fn delay_details(&self, key: &str, delay: Duration) {
        self.state.lock().unwrap().detail_delays.insert(key.to_string(), delay);
    }

    /// Delays every answer of `endpoint`
    pub fn delay_endpoint(&self, endpoint: &str, delay: Duration) {
        self.state.lock().unwrap().endpoint_delays.insert(endpoint.to_string(), delay);
    }

    /// Makes `endpoint` answer 500 until `recover` is called
    pub fn fail(&self, endpoint: &str) {
        self.state.lock().unwrap().failing.insert(endpoint.to_string());
    }

    pub fn recover(&self, endpoint: &str) {
        self.state.lock().unwrap().failing.remove(endpoint);
    }

    pub fn requests(&self, endpoint: &str) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn request_count(&self, endpoint: &str) -> usize {
        self.requests(endpoint).len()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<BackendState>>>,
    Path((endpoint, admin)): Path<(String, String)>,
    Form(form): Form<Vec<(String, String)>>,
) -> Response {
    let key = form
        .iter()
        .find(|(k, _)| k == "name" || k == "node")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();

    // answer is decided on arrival, even when it is sent late
    let (answer, delay) = {
        let mut st = state.lock().unwrap();
        st.requests.push(RecordedRequest { endpoint: endpoint.clone(), admin, form });
        let (answer, delay) = answer_for(&mut st, &endpoint, &key);
        (answer, delay.or_else(|| st.endpoint_delays.get(&endpoint).copied()))
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match answer {
        Ok(body) => Json(body).into_response(),
        Err(status) => status.into_response(),
    }
}

fn answer_for(
    st: &mut BackendState,
    endpoint: &str,
    key: &str,
) -> (std::result::Result<Value, StatusCode>, Option<Duration>) {
    if st.failing.contains(endpoint) {
        return (Err(StatusCode::INTERNAL_SERVER_ERROR), None);
    }
    match endpoint {
        "nodes" => (Ok(st.nodes.clone()), None),
        "connected" => (Ok(st.connected.clone()), None),
        "commands" => (Ok(st.commands.clone()), None),
        "details" => {
            let delay = st.detail_delays.get(key).copied();
            match st.details.get(key) {
                Some(values) => (Ok(json!({ "values": values })), delay),
                None => (Err(StatusCode::NOT_FOUND), delay),
            }
        }
        "statistics" => match st.statistics.get(key) {
            Some(values) => (Ok(json!({ "values": values })), None),
            None => (Err(StatusCode::NOT_FOUND), None),
        },
        "invoke" => (
            Ok(st.invoke_responses.pop_front().unwrap_or_else(|| json!({ "successful": true }))),
            None,
        ),
        _ => (Err(StatusCode::NOT_FOUND), None),
    }
}
