//! LLM provider abstraction and implementations

pub mod openai;
pub mod provider;

pub use openai::{OpenAiCompatConfig, OpenAiCompatProvider};
pub use provider::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, Message, MessageRole, TokenUsage,
};
