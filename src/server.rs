//! HTTP caller layer
//!
//! Thin warp surface in front of the core: `/chat` routes a query and blocks
//! for the terminal task, `/tasks/{id}/cancel` is best-effort cancellation,
//! plus operational endpoints for health and the agent manifest. No chat
//! persistence and no auth live here; the core is the only collaborator.

use crate::error::HubError;
use crate::registry::AgentRegistry;
use crate::service::HubService;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use warp::http::StatusCode;
use warp::Filter;

/// Longest accepted prompt, matching the original caller contract
const MAX_PROMPT_CHARS: usize = 4000;

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub orchestrator_mode: Option<String>,
}

/// Chat response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub correlation_id: String,
}

/// Cancellation response body
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub task_id: String,
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// HTTP server exposing the hub to callers
pub struct ApiServer {
    hub_id: String,
    port: u16,
    service: Arc<HubService>,
    registry: Arc<AgentRegistry>,
    started_at: Instant,
}

impl ApiServer {
    pub fn new(
        hub_id: impl Into<String>,
        port: u16,
        service: Arc<HubService>,
        registry: Arc<AgentRegistry>,
    ) -> Self {
        Self {
            hub_id: hub_id.into(),
            port,
            service,
            registry,
            started_at: Instant::now(),
        }
    }

    /// Start serving; runs until the process stops
    pub async fn start(self: Arc<Self>) {
        let port = self.port;
        let routes = self.routes();

        tracing::info!("Starting hub API server on port {}", port);
        warp::serve(routes).run(([0, 0, 0, 0], port)).await;
    }

    /// Route tree, separated from `start` so tests can drive it directly
    pub fn routes(
        self: &Arc<Self>,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let chat_server = self.clone();
        let cancel_server = self.clone();
        let health_server = self.clone();
        let manifest_server = self.clone();
        let root_server = self.clone();

        // POST /chat - route a query, block for the terminal task
        let chat_route = warp::path("chat")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |request: ChatRequest| {
                let server = chat_server.clone();
                async move { Ok::<_, Infallible>(server.handle_chat(request).await) }
            });

        // POST /tasks/{id}/cancel - best-effort cancellation
        let cancel_route = warp::path!("tasks" / String / "cancel")
            .and(warp::post())
            .and_then(move |task_id: String| {
                let server = cancel_server.clone();
                async move { Ok::<_, Infallible>(server.handle_cancel(&task_id).await) }
            });

        // GET /health - liveness with uptime
        let health_route = warp::path("health").and(warp::get()).and_then(move || {
            let server = health_server.clone();
            async move {
                let response = serde_json::json!({
                    "status": "healthy",
                    "uptime_seconds": server.started_at.elapsed().as_secs(),
                });
                Ok::<_, Infallible>(warp::reply::json(&response))
            }
        });

        // GET /manifest - registered agent endpoints
        let manifest_route = warp::path("manifest").and(warp::get()).and_then(move || {
            let server = manifest_server.clone();
            async move {
                let agents: HashMap<String, String> = server
                    .registry
                    .all()
                    .map(|agent| (agent.name.clone(), agent.base_url.clone()))
                    .collect();
                Ok::<_, Infallible>(warp::reply::json(&agents))
            }
        });

        // GET / - service banner
        let root_route = warp::path::end().and(warp::get()).and_then(move || {
            let server = root_server.clone();
            async move {
                let response = serde_json::json!({
                    "status": "Server is running",
                    "hub_id": server.hub_id,
                    "uptime_seconds": server.started_at.elapsed().as_secs(),
                    "registered_agents": server.registry.len(),
                });
                Ok::<_, Infallible>(warp::reply::json(&response))
            }
        });

        chat_route
            .or(cancel_route)
            .or(health_route)
            .or(manifest_route)
            .or(root_route)
            .with(warp::cors().allow_any_origin())
    }

    async fn handle_chat(&self, request: ChatRequest) -> warp::reply::WithStatus<warp::reply::Json> {
        if request.prompt.is_empty() || request.prompt.chars().count() > MAX_PROMPT_CHARS {
            return warp::reply::with_status(
                warp::reply::json(&ErrorResponse {
                    error: format!("prompt must be 1..{MAX_PROMPT_CHARS} characters"),
                }),
                StatusCode::BAD_REQUEST,
            );
        }

        match self
            .service
            .route(
                &request.prompt,
                request.conversation_id,
                request.orchestrator_mode,
            )
            .await
        {
            Ok(outcome) => warp::reply::with_status(
                warp::reply::json(&ChatResponse {
                    response: outcome.response,
                    correlation_id: outcome.task_id,
                }),
                StatusCode::OK,
            ),
            Err(e) => warp::reply::with_status(
                warp::reply::json(&ErrorResponse {
                    error: e.to_status_text(),
                }),
                error_status(&e),
            ),
        }
    }

    async fn handle_cancel(&self, task_id: &str) -> warp::reply::WithStatus<warp::reply::Json> {
        match self.service.cancel(task_id).await {
            Ok(state) => warp::reply::with_status(
                warp::reply::json(&CancelResponse {
                    task_id: task_id.to_string(),
                    state: state.to_string(),
                }),
                StatusCode::OK,
            ),
            Err(e) => warp::reply::with_status(
                warp::reply::json(&ErrorResponse {
                    error: e.to_status_text(),
                }),
                error_status(&e),
            ),
        }
    }
}

/// Map hub errors onto HTTP statuses
fn error_status(error: &HubError) -> StatusCode {
    match error {
        HubError::TaskNotFound { .. } => StatusCode::NOT_FOUND,
        HubError::UnknownAgent { .. } => StatusCode::NOT_FOUND,
        HubError::UnsupportedOperation { .. } => StatusCode::NOT_IMPLEMENTED,
        HubError::InvalidTransition { .. } => StatusCode::CONFLICT,
        HubError::Discovery { .. }
        | HubError::RemoteInvocation { .. }
        | HubError::TransportUnsupported { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
