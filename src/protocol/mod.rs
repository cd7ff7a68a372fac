//! Protocol types for remote agent interop
//!
//! Wire-level message types shared by discovery and streamed invocation.

pub mod messages;

pub use messages::{
    decode_stream_event, AgentCapabilities, AgentCard, AgentSkill, Artifact, ArtifactEvent,
    OutboundMessage, Part, ProtocolMessage, StatusEvent, StreamEvent, TaskState,
};
