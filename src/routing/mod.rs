//! Query routing
//!
//! The classifier asks a language model which registered specialist should
//! handle a query and always produces a usable decision, falling back to the
//! configured default agent on any failure.

pub mod classifier;

pub use classifier::{RoutingClassifier, RoutingDecision};
