// crates/anchor-tests-core/src/core/result.rs
// ============================================================================
// Module: Anchor Tests Results
// Description: Per-test outcomes and the serializable run record.
// Purpose: Represent pass/fail/skip results with their recorded network calls.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! A [`TestResult`] pairs recorded network calls with an [`Outcome`]. The
//! outcome enum makes "failed and skipped" unrepresentable. [`TestRunRecord`]
//! is the flattened wire form streamed to callers and written as JSON lines.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::failure::Failure;
use crate::core::identifiers::ProtocolId;
use crate::core::identifiers::TestId;
use crate::core::network::NetworkCall;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Outcome of a single test.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The test ran and every assertion held.
    Passed,
    /// The test ran and reported a failure.
    Failed(Failure),
    /// The test was not run because a dependency did not pass.
    Skipped,
}

/// Coarse status of a test outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// Passed.
    Passed,
    /// Failed.
    Failed,
    /// Skipped.
    Skipped,
}

impl TestStatus {
    /// Returns the lowercase status label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one test run.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    /// Network interactions in issue order.
    pub network_calls: Vec<NetworkCall>,
    /// Outcome.
    pub outcome: Outcome,
}

impl TestResult {
    /// Passing result without recorded calls.
    #[must_use]
    pub const fn passed() -> Self {
        Self { network_calls: Vec::new(), outcome: Outcome::Passed }
    }

    /// Failing result without recorded calls.
    #[must_use]
    pub const fn failed(failure: Failure) -> Self {
        Self { network_calls: Vec::new(), outcome: Outcome::Failed(failure) }
    }

    /// Skipped result.
    #[must_use]
    pub const fn skipped() -> Self {
        Self { network_calls: Vec::new(), outcome: Outcome::Skipped }
    }

    /// Records a failure; the first failure wins.
    pub fn fail(&mut self, failure: Failure) {
        if !matches!(self.outcome, Outcome::Failed(_)) {
            self.outcome = Outcome::Failed(failure);
        }
    }

    /// Returns the coarse status.
    #[must_use]
    pub const fn status(&self) -> TestStatus {
        match self.outcome {
            Outcome::Passed => TestStatus::Passed,
            Outcome::Failed(_) => TestStatus::Failed,
            Outcome::Skipped => TestStatus::Skipped,
        }
    }

    /// Returns the failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            Outcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns true when the test was skipped.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped)
    }
}

// ============================================================================
// SECTION: Run Records
// ============================================================================

/// Serializable record of one streamed test run.
///
/// # Invariants
/// - `failure` is present only when `status` is `failed`.
/// - `skipped` is true only when `status` is `skipped`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunRecord {
    /// Test identifier.
    pub test_id: TestId,
    /// Protocol identifier.
    pub protocol: ProtocolId,
    /// Logical group.
    pub group: String,
    /// Assertion text.
    pub assertion: String,
    /// Outcome status.
    pub status: TestStatus,
    /// Skip flag.
    pub skipped: bool,
    /// Failure details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Recorded network calls.
    #[serde(default)]
    pub network_calls: Vec<NetworkCall>,
}
