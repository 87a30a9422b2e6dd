//! # Nebula Agents
//!
//! Multi-agent orchestration for the `multi_agent` node kind (`§4.6`): a
//! [`message_bus::MessageBus`] and [`shared_context::SharedContext`] per
//! team, plus the four orchestration [`strategies`] a team may run
//! (coordinator, round-robin, debate, map-reduce).
//!
//! Grounded on `agentchord.orchestration` (`examples/original_source/agentchord`):
//! this crate keeps that package's message-bus/shared-context/strategy
//! split but drops its `Agent`/`pydantic` plumbing in favor of Nebula's own
//! [`nebula_core::provider::LlmProvider`] trait and `serde_json::Value`
//! payloads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod message_bus;
pub mod shared_context;
pub mod strategies;
pub mod team;

pub use error::AgentsError;
pub use events::{OrchestrationCallbacks, OrchestrationEvent};
pub use message_bus::{AgentMessage, MessageBus, MessageType};
pub use shared_context::{ContextOperation, ContextUpdate, SharedContext};
pub use team::{Agent, AgentOutput, AgentRunResult, DynamicTool, StrategyKind, Team, TeamMember, TeamResult, TeamRole};
