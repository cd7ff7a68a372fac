//! Remote task client
//!
//! Resolves a specialist agent's capability card from its well-known
//! discovery path, opens one streamed JSON-RPC invocation carrying the query,
//! and yields decoded events in strict arrival order through a bounded
//! channel fed by a dedicated reader task.
//!
//! Discovery or connection failures fail the whole invocation before any
//! event is produced; mid-stream transport errors are delivered in-band so
//! the consumer can fail the task it is relaying into. The entire exchange is
//! bounded by one configurable timeout, not per-event deadlines.

pub mod sse;

use crate::error::{HubError, HubResult};
use crate::protocol::{decode_stream_event, AgentCard, OutboundMessage, StreamEvent};
use crate::registry::AgentDescriptor;
use sse::SseDecoder;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Well-known discovery path serving the capability card
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// Bound on undelivered events between the reader task and the relay loop
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Client for streamed remote agent invocations.
///
/// The underlying HTTP client is pooled and shared across concurrent
/// invocations; per-call state lives entirely in the spawned reader task.
#[derive(Debug, Clone)]
pub struct RemoteTaskClient {
    client: reqwest::Client,
}

impl RemoteTaskClient {
    /// Create a client whose timeout bounds each whole exchange
    pub fn new(invoke_timeout: Duration) -> HubResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(invoke_timeout)
            .build()
            .map_err(|e| HubError::internal_error(format!("HTTP client build failed: {e}")))?;

        Ok(Self { client })
    }

    /// Reuse an existing HTTP client (tests, shared pools)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch and validate the capability card for an agent
    pub async fn fetch_card(&self, agent: &AgentDescriptor) -> HubResult<AgentCard> {
        let discovery_url = format!(
            "{}{}",
            agent.base_url.trim_end_matches('/'),
            AGENT_CARD_PATH
        );
        debug!(agent = %agent.name, url = %discovery_url, "Fetching capability card");

        let response = self
            .client
            .get(discovery_url.as_str())
            .send()
            .await
            .map_err(|e| HubError::discovery(discovery_url.clone(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::discovery(
                discovery_url,
                format!("discovery returned {status}"),
            ));
        }

        response.json::<AgentCard>().await.map_err(|e| {
            HubError::discovery(
                discovery_url,
                format!("invalid capability descriptor: {e}"),
            )
        })
    }

    /// Open a streamed invocation against an agent.
    ///
    /// Returns a receiver yielding decoded events in arrival order. An `Err`
    /// item reports a mid-stream transport failure; the channel closing
    /// without one means the remote ended its stream.
    pub async fn invoke(
        &self,
        agent: &AgentDescriptor,
        query: &str,
    ) -> HubResult<mpsc::Receiver<HubResult<StreamEvent>>> {
        let card = self.fetch_card(agent).await?;

        if !card.supports_jsonrpc_streaming() {
            return Err(HubError::TransportUnsupported {
                agent: agent.name.clone(),
                transport: card.preferred_transport.clone(),
            });
        }

        info!(
            agent = %agent.name,
            card_name = %card.name,
            "Opening streamed invocation"
        );

        let request = build_stream_request(query);
        let response = self
            .client
            .post(agent.base_url.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| HubError::remote_invocation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::remote_invocation(format!(
                "agent '{}' returned {status}",
                agent.name
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(read_event_stream(response, tx));

        Ok(rx)
    }
}

/// JSON-RPC request opening a streamed exchange with one user message
fn build_stream_request(query: &str) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": uuid::Uuid::new_v4().to_string(),
        "method": "message/stream",
        "params": {
            "message": OutboundMessage::user(query),
        }
    })
}

/// Reader task: drain the response body, decode SSE frames, forward events.
///
/// Stops after forwarding a terminal status event, on stream end, or when the
/// consumer drops the receiver. A transport error is forwarded in-band and
/// ends the loop.
async fn read_event_stream(
    mut response: reqwest::Response,
    tx: mpsc::Sender<HubResult<StreamEvent>>,
) {
    let mut decoder = SseDecoder::new();

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                for payload in decoder.push(&chunk) {
                    if forward_payload(&payload, &tx).await == Forward::Stop {
                        return;
                    }
                }
            }
            Ok(None) => {
                if let Some(payload) = decoder.finish() {
                    let _ = forward_payload(&payload, &tx).await;
                }
                debug!("Remote stream closed");
                return;
            }
            Err(e) => {
                warn!("Remote stream transport error: {}", e);
                let _ = tx
                    .send(Err(HubError::remote_invocation(e.to_string())))
                    .await;
                return;
            }
        }
    }
}

#[derive(PartialEq)]
enum Forward {
    Continue,
    Stop,
}

async fn forward_payload(payload: &str, tx: &mpsc::Sender<HubResult<StreamEvent>>) -> Forward {
    let event = match decode_stream_event(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!("Skipping undecodable stream payload: {}", e);
            return Forward::Continue;
        }
    };

    let terminal = matches!(
        &event,
        StreamEvent::Status(status) if status.final_event || status.state.is_terminal()
    );

    if tx.send(Ok(event)).await.is_err() {
        // Consumer gone; stop reading
        return Forward::Stop;
    }

    if terminal {
        debug!("Terminal status observed, ending read loop");
        Forward::Stop
    } else {
        Forward::Continue
    }
}
