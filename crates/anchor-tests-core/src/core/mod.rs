// crates/anchor-tests-core/src/core/mod.rs
// ============================================================================
// Module: Anchor Tests Core Types
// Description: Canonical identifiers, definitions, context, and result structures.
// Purpose: Provide stable, serializable types shared by the runtime and suites.
// Dependencies: serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! Core types describe what a conformance test is (definitions, dependencies,
//! context slots, failure modes) and what a run produces (results, network
//! calls, run records). They carry no execution logic.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod config;
pub mod context;
pub mod definition;
pub mod failure;
pub mod identifiers;
pub mod network;
pub mod result;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::DEFAULT_REQUEST_TIMEOUT_MS;
pub use config::HarnessConfig;
pub use config::HarnessConfigError;
pub use context::ContextStore;
pub use context::TestContext;
pub use definition::ContextSchema;
pub use definition::Dependencies;
pub use definition::DependencyFn;
pub use definition::TestCheck;
pub use definition::TestDefinition;
pub use definition::TestError;
pub use failure::BAD_CONTENT_TYPE;
pub use failure::CONFIGURATION_ERROR;
pub use failure::CONNECTION_ERROR;
pub use failure::Failure;
pub use failure::FailureKind;
pub use failure::FailureMode;
pub use failure::FailureModes;
pub use failure::UNEXPECTED_ERROR;
pub use failure::UNEXPECTED_STATUS_CODE;
pub use failure::render_template;
pub use identifiers::ParseProtocolIdError;
pub use identifiers::ProtocolId;
pub use identifiers::TestId;
pub use network::ExpectationMismatch;
pub use network::HttpMethod;
pub use network::HttpRequest;
pub use network::HttpResponse;
pub use network::NetworkCall;
pub use network::ResponseBody;
pub use network::ResponseExpectation;
pub use network::TransportResponse;
pub use result::Outcome;
pub use result::TestResult;
pub use result::TestRunRecord;
pub use result::TestStatus;
