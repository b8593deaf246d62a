//! Integration test suite for upload-graph
//!
//! End-to-end tests exercising the public API the way the surrounding
//! message-send orchestrator would: build a graph inside a (notional)
//! transaction, read the dependency map, then hand the deferred chains to
//! the execution engine exactly once.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **planning**: mixed-batch planning, dedup accounting, serde handoff
//! - **consumption**: one-shot queue semantics under concurrent callers

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

// Integration tests
mod consumption;
mod planning;
