//! Felt LLM - Provider abstraction and listing text enhancement
//!
//! This crate provides a single interface for both local and cloud LLMs:
//!
//! ## Local Providers (no API keys required)
//! - Ollama (default): `http://localhost:11434`
//! - OpenAI-compatible: vLLM, llama.cpp, OpenAI itself
//!
//! ## Cloud Providers
//! - Google (Gemini)
//!
//! ## Key Design Principles
//!
//! 1. Enhancement is optional enrichment, never a correctness dependency
//! 2. Empty input is rejected before any provider is called
//! 3. Every call is bounded by a timeout
//! 4. Deterministic fallback when no LLM is available

pub mod enhance;
pub mod providers;
pub mod router;
pub mod types;

pub use enhance::*;
pub use providers::*;
pub use router::*;
pub use types::*;
