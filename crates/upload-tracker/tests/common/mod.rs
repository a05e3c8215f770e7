//! Shared test utilities for upload-tracker integration tests.
//!
//! This module provides:
//! - Builder patterns for file handles and tracker configurations
//! - `ScriptedTransport` for deterministic upload outcomes

pub mod builders;
pub mod scripted;

pub use builders::*;
pub use scripted::{ScriptedTransport, Step};
