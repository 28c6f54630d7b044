// crates/anchor-tests-core/src/runtime/mod.rs
// ============================================================================
// Module: Anchor Tests Runtime
// Description: Catalog, dependency resolver, run context, and execution engine.
// Purpose: Select, order, and execute conformance tests for one configuration.
// Dependencies: crate::{core, events, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules turn a static catalog into an ordered plan and drive that
//! plan one test at a time. Discovery and execution share the same resolution,
//! so a preview always matches what a run executes.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod catalog;
pub mod context;
pub mod engine;
pub mod resolver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use catalog::CatalogError;
pub use catalog::TestCatalog;
pub use catalog::TestCatalogBuilder;
pub use context::RunContext;
pub use engine::CancelFlag;
pub use engine::Execution;
pub use engine::Harness;
pub use engine::PlanError;
pub use engine::RunSummary;
pub use engine::TestRun;
pub use resolver::MAX_RESOLUTION_DEPTH;
pub use resolver::PlanEntry;
pub use resolver::ResolveError;
pub use resolver::ResolvedTest;
pub use resolver::TestPlan;
pub use resolver::resolve;
