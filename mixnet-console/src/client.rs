/**
 * ADMIN API CLIENT - Typed access to the console endpoints of the admin service
 *
 * ROLE:
 * Every call is a form-encoded POST to /api/<endpoint>/<admin> answering JSON.
 *
 * ENDPOINTS:
 * - nodes       -> [{hash, name, ...}]
 * - connected   -> {node_id: bool}
 * - details     -> {values: {...}}          (form: name=... or node=...)
 * - statistics  -> {values: {...}}          (form: node=...)
 * - commands    -> [{id, title, parameters}]
 * - invoke      -> {successful, message?}   (form: serialized command form)
 */

use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::models::{
    CommandDescriptor, ConnectionState, DetailQuery, InvokeResponse, NodeSummary, ValuesEnvelope,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ConsoleClient {
    http: reqwest::Client,
    base_url: String,
    admin: String,
}

impl ConsoleClient {
    pub fn new(base_url: &str, admin: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/javascript"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin: admin.to_string(),
        })
    }

    pub fn from_config(cfg: &ConsoleConfig) -> Result<Self> {
        Self::new(&cfg.base_url, &cfg.admin, Duration::from_millis(cfg.request_timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, name, self.admin)
    }

    async fn post<T: DeserializeOwned>(&self, name: &str, form: &[(String, String)]) -> Result<T> {
        let url = self.endpoint(name);
        debug!("POST {} ({} fields)", url, form.len());
        let resp = self.http.post(&url).form(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ConsoleError::Status { endpoint: url, status });
        }
        Ok(resp.json::<T>().await?)
    }

    pub async fn fetch_nodes(&self) -> Result<Vec<NodeSummary>> {
        let nodes: Option<Vec<NodeSummary>> = self.post("nodes", &[]).await?;
        Ok(nodes.unwrap_or_default())
    }

    pub async fn fetch_connected(&self) -> Result<ConnectionState> {
        let state: Option<ConnectionState> = self.post("connected", &[]).await?;
        Ok(state.unwrap_or_default())
    }

    pub async fn fetch_details(&self, query: &DetailQuery) -> Result<ValuesEnvelope> {
        self.post("details", &query.form()).await
    }

    pub async fn fetch_statistics(&self, node: &str) -> Result<ValuesEnvelope> {
        self.post("statistics", &[("node".to_string(), node.to_string())]).await
    }

    pub async fn fetch_commands(&self) -> Result<Vec<CommandDescriptor>> {
        let commands: Option<Vec<CommandDescriptor>> = self.post("commands", &[]).await?;
        Ok(commands.unwrap_or_default())
    }

    pub async fn invoke(&self, form: &[(String, String)]) -> Result<InvokeResponse> {
        self.post("invoke", form).await
    }
}
