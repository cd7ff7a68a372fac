//! Wire message types for the remote agent protocol
//!
//! Remote agents expose a capability card on a well-known discovery path and
//! a JSON-RPC streamed invocation endpoint that yields status and artifact
//! events. Every inbound wire event is decoded into exactly one of
//! {Status, Artifact, Unknown} before any control flow looks at it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task lifecycle states.
///
/// `submitted` and `working` are non-terminal; the remaining three are
/// terminal and immutable once reached. The wire spelling of the cancelled
/// state is `"canceled"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Failed,
    #[serde(rename = "canceled")]
    Cancelled,
}

impl TaskState {
    /// Terminal states permit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }

    /// Lowercase name as used in human-readable status text
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One content part of a message or artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    Text { text: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Text content of this part
    pub fn as_text(&self) -> &str {
        match self {
            Part::Text { text } => text,
        }
    }
}

/// A named, ordered bundle of output content attached to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub parts: Vec<Part>,
}

impl Artifact {
    /// Single-text-part artifact
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: vec![Part::text(text)],
        }
    }

    /// Concatenated text of all parts, newline separated
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The single outbound user message carried by a streamed invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub message_id: String,
    pub role: String,
    pub parts: Vec<Part>,
}

impl OutboundMessage {
    /// Build a user message with a freshly generated identifier
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            role: "user".to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

/// Message attached to a status event by the remote agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMessage {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ProtocolMessage {
    /// Newline-joined text of all text parts, None when there is no text
    pub fn joined_text(&self) -> Option<String> {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .map(Part::as_text)
            .filter(|t| !t.is_empty())
            .collect();

        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }
}

/// Progress report from a remote agent
#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub state: TaskState,
    pub message: Option<ProtocolMessage>,
    /// Remote marks its last event explicitly
    pub final_event: bool,
}

/// One artifact produced by a remote agent
#[derive(Debug, Clone)]
pub struct ArtifactEvent {
    pub artifact: Artifact,
}

/// Decoded inbound wire event
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Status(StatusEvent),
    Artifact(ArtifactEvent),
    /// Recognized envelope, unrecognized payload kind - skipped by the relay
    Unknown { kind: String },
}

/// Remote agent capability card served on the well-known discovery path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: AgentCapabilities,
    /// Transport declared by the remote; only JSON-RPC is supported here
    #[serde(default = "default_transport")]
    pub preferred_transport: String,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

fn default_transport() -> String {
    "JSONRPC".to_string()
}

impl AgentCard {
    /// Whether this card declares a transport and mode this client can use
    pub fn supports_jsonrpc_streaming(&self) -> bool {
        self.preferred_transport.eq_ignore_ascii_case("jsonrpc") && self.capabilities.streaming
    }
}

/// Capability flags on an agent card
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentCapabilities {
    #[serde(default)]
    pub streaming: bool,
}

/// One skill advertised on an agent card.
/// Input/output descriptions are opaque documentation for callers, never
/// validated by this client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSkill {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Decode one inbound wire payload into a stream event.
///
/// Accepts both bare events and events wrapped in a JSON-RPC response
/// envelope (`{"jsonrpc": "2.0", "id": ..., "result": {...}}`), matching
/// what remote implementations actually emit.
pub fn decode_stream_event(payload: &str) -> Result<StreamEvent, serde_json::Error> {
    let value: Value = serde_json::from_str(payload)?;

    let event = match value.get("result") {
        Some(result) => result,
        None => &value,
    };

    let kind = event
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    match kind.as_str() {
        "status-update" => {
            let state = event
                .get("status")
                .and_then(|s| s.get("state"))
                .cloned()
                .map(serde_json::from_value::<TaskState>)
                .transpose()?
                .unwrap_or(TaskState::Working);

            let message = event
                .get("status")
                .and_then(|s| s.get("message"))
                .filter(|m| !m.is_null())
                .cloned()
                .map(serde_json::from_value::<ProtocolMessage>)
                .transpose()?;

            let final_event = event
                .get("final")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            Ok(StreamEvent::Status(StatusEvent {
                state,
                message,
                final_event,
            }))
        }
        "artifact-update" => {
            let raw = event
                .get("artifact")
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default()));

            let name = raw
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("result")
                .to_string();

            let parts = raw
                .get("parts")
                .cloned()
                .map(serde_json::from_value::<Vec<Part>>)
                .transpose()?
                .unwrap_or_default();

            Ok(StreamEvent::Artifact(ArtifactEvent {
                artifact: Artifact { name, parts },
            }))
        }
        other => Ok(StreamEvent::Unknown {
            kind: other.to_string(),
        }),
    }
}
