//! Chatbot runtime - the request path between a user message and the knowledge agent
//!
//! This crate wires the text-processing pieces of `labbot-core` around an
//! external knowledge agent:
//! - Reaches the agent over HTTP and keeps a bounded conversation history
//! - Rejects out-of-scope queries before they reach the agent
//! - Cleans raw agent output and rejects irrelevant answers
//! - Substitutes canned fallback answers when the agent falls short
//!
//! # Request Flow
//!
//! 1. **Scope Gate** (`guardrails`) - greetings pass, other queries are classified
//! 2. **Agent Call** (`client`) - query plus system instructions
//! 3. **Cleanup** - sanitizer, response cleaner, course-title extraction
//! 4. **Relevance Gate** (`guardrails`) - too short or disclaimer answers fall back
//! 5. **Enhancement** - follow-up hint appended by the fallback provider
//!
//! # Key Types
//!
//! - `ChatbotRuntime` - Orchestrator with an explicit initialize/shutdown lifecycle
//! - `KnowledgeAgent` - Pluggable trait for the external agent
//! - `ScopeGate` / `RelevanceGate` - Pre- and post-agent checks
//!
//! # Failure Principle
//!
//! A failed agent call never fails the request. The user gets the configured
//! error message and the failure is logged with the request's correlation id.

pub mod client;
pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod runtime;

pub use client::HttpKnowledgeAgent;
pub use guardrails::{GateDecision, RelevanceGate, ScopeGate};
pub use llm::KnowledgeAgent;
pub use runtime::{ChatReply, ChatbotRuntime, ReplyRoute};
