//! Medhub - routing and task orchestration for a multi-agent network
//!
//! Routes a user query to one of several specialist remote agents, tracks the
//! resulting task through a defined lifecycle, and relays streamed
//! progress/results back to the caller.
//!
//! # Overview
//!
//! - Static agent registry, dependency-injected into the classifier and client
//! - LLM-backed routing classifier with deterministic default-agent fallback
//! - Remote task client: capability card discovery plus streamed JSON-RPC
//!   invocation decoded into status/artifact events
//! - Task state machine with monotonic forward transitions and append-only
//!   artifacts, persisted through a pluggable task store
//! - Dispatching executor selecting between direct and multi-step strategies,
//!   with cancellation routed to whichever strategy is in flight
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use medhub::config::HubConfig;
//! use medhub::service::HubService;
//! use medhub::task::InMemoryTaskStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HubConfig::load_from_file(Path::new("hub.toml"))?;
//! let store = Arc::new(InMemoryTaskStore::new());
//! let service = HubService::from_config(&config, store)?;
//!
//! let outcome = service
//!     .route("What are common symptoms of hypertension?", None, None)
//!     .await?;
//! println!("[{}] {}", outcome.state, outcome.response);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod llm;
pub mod observability;
pub mod protocol;
pub mod registry;
pub mod routing;
pub mod server;
pub mod service;
pub mod task;
pub mod testing;

pub use client::RemoteTaskClient;
pub use config::HubConfig;
pub use error::{HubError, HubResult};
pub use protocol::{Artifact, TaskState};
pub use registry::{AgentDescriptor, AgentRegistry};
pub use routing::{RoutingClassifier, RoutingDecision};
pub use service::{HubService, RouteOutcome};
pub use task::{InMemoryTaskStore, Task, TaskStore, TaskUpdater};
