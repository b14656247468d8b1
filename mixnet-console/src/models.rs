use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One entry of `/api/nodes/<admin>`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NodeSummary {
    pub hash: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodeSummary {
    pub fn new(hash: impl Into<String>, name: impl Into<String>) -> Self {
        Self { hash: hash.into(), name: name.into(), extra: Map::new() }
    }
}

/// `{values: {...}}` wrapper used by the details and statistics endpoints
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ValuesEnvelope {
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// Last-known description of a node, replaced wholesale on every detail fetch
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NodeDescriptor {
    pub hash: String,
    pub values: Map<String, Value>,
}

impl NodeDescriptor {
    /// Builds a descriptor from a details payload. The payload's own `hash` wins
    /// over the id the request was issued for.
    pub fn from_values(requested_id: &str, values: Map<String, Value>) -> Self {
        let hash = values
            .get("hash")
            .and_then(Value::as_str)
            .unwrap_or(requested_id)
            .to_string();
        Self { hash, values }
    }

    pub fn name(&self) -> Option<&str> {
        self.values.get("name").and_then(Value::as_str)
    }

    pub fn section(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Snapshot of `/api/connected/<admin>`: node id -> connected
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConnectionState(pub BTreeMap<String, bool>);

impl ConnectionState {
    /// Last reported flag, `None` when the node was never reported
    pub fn get(&self, node_id: &str) -> Option<bool> {
        self.0.get(node_id).copied()
    }

    pub fn is_connected(&self, node_id: &str) -> bool {
        self.0.get(node_id).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &bool)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for ConnectionState {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Entry of `/api/commands/<admin>`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommandDescriptor {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub parameters: Vec<ParamDescriptor>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(default)]
    pub vargs: bool,
}

/// Answer of `/api/invoke/<admin>`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct InvokeResponse {
    pub successful: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Selector accepted by `/api/details/<admin>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailQuery {
    ByName(String),
    ByNode(String),
}

impl DetailQuery {
    pub fn form(&self) -> Vec<(String, String)> {
        match self {
            DetailQuery::ByName(name) => vec![("name".to_string(), name.clone())],
            DetailQuery::ByNode(node) => vec![("node".to_string(), node.clone())],
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ParamDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ParamDescriptor>>::deserialize(deserializer)?.unwrap_or_default())
}
