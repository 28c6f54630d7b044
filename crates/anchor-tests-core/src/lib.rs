// crates/anchor-tests-core/src/lib.rs
// ============================================================================
// Module: Anchor Tests Core Library
// Description: Public API surface for the conformance harness core.
// Purpose: Expose core types, interfaces, run events, and the execution runtime.
// Dependencies: crate::{core, events, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Anchor Tests core selects the conformance tests that apply to a run
//! configuration, orders them so dependencies run first, threads values
//! produced by one test into its dependents, and streams results as each test
//! completes. It is transport-agnostic and reaches the network only through
//! [`NetworkCaller`].
//! Invariants:
//! - Every planned test yields exactly one result per execution.
//! - Shared dependencies run at most once.
//! - Failed or skipped dependencies cause dependents to be skipped, never run.
//!
//! Security posture: anchors under test are untrusted; recorded requests are
//! redacted and response sizes are bounded by the transport.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod events;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::RunEvent;
pub use events::RunEventSink;
pub use events::StderrEventSink;
pub use interfaces::CallError;
pub use interfaces::NetworkCaller;
pub use runtime::CancelFlag;
pub use runtime::CatalogError;
pub use runtime::Execution;
pub use runtime::Harness;
pub use runtime::PlanEntry;
pub use runtime::PlanError;
pub use runtime::ResolveError;
pub use runtime::RunContext;
pub use runtime::RunSummary;
pub use runtime::TestCatalog;
pub use runtime::TestCatalogBuilder;
pub use runtime::TestPlan;
pub use runtime::TestRun;
pub use runtime::resolve;
