// crates/anchor-tests-core/src/core/definition.rs
// ============================================================================
// Module: Anchor Tests Definitions
// Description: Immutable test definitions and their run contract.
// Purpose: Declare assertions, dependencies, context slots, and failure modes.
// Dependencies: crate::core, crate::runtime, thiserror
// ============================================================================

//! ## Overview
//! A [`TestDefinition`] is created once, registered in a catalog, and never
//! mutated. Dependencies are either a fixed list or a function of the run
//! configuration, evaluated once per resolution. The run contract is the
//! [`TestCheck`] trait, implemented for plain closures.
//!
//! Invariants:
//! - Failure modes always include the generic kinds.
//! - Evaluated dependency lists contain no duplicates and preserve order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::core::config::HarnessConfig;
use crate::core::failure::Failure;
use crate::core::failure::FailureKind;
use crate::core::failure::FailureModes;
use crate::core::identifiers::ProtocolId;
use crate::core::identifiers::TestId;
use crate::core::result::TestResult;
use crate::runtime::context::RunContext;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned from a test body.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - [`TestError::Misconfigured`] maps to `CONFIGURATION_ERROR`; every other
///   non-failure variant maps to `UNEXPECTED_ERROR`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TestError {
    /// The test reported a protocol failure.
    #[error("{0}")]
    Failed(Box<Failure>),
    /// The test's own sub-configuration is incomplete.
    #[error("improperly configured: {0}")]
    Misconfigured(String),
    /// A required context value was not populated by any dependency.
    #[error("missing context value: {0}")]
    MissingContext(String),
    /// A context name was used that the definition does not declare.
    #[error("undeclared context value: {0}")]
    UndeclaredContext(String),
    /// Any other internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Failure> for TestError {
    fn from(failure: Failure) -> Self {
        Self::Failed(Box::new(failure))
    }
}

// ============================================================================
// SECTION: Run Contract
// ============================================================================

/// Run contract for a test definition.
pub trait TestCheck: Send + Sync {
    /// Runs the test against the target.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] when the test fails or cannot run.
    fn run(&self, ctx: &mut RunContext<'_>) -> Result<TestResult, TestError>;
}

impl<F> TestCheck for F
where
    F: Fn(&mut RunContext<'_>) -> Result<TestResult, TestError> + Send + Sync,
{
    fn run(&self, ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
        self(ctx)
    }
}

// ============================================================================
// SECTION: Dependencies and Context
// ============================================================================

/// Function computing dependencies from the run configuration.
pub type DependencyFn = fn(&HarnessConfig) -> Vec<TestId>;

/// Declared dependencies of a test.
#[derive(Clone)]
pub enum Dependencies {
    /// Fixed ordered list.
    Fixed(Vec<TestId>),
    /// Computed from the configuration at resolution time.
    Dynamic(DependencyFn),
}

impl Default for Dependencies {
    fn default() -> Self {
        Self::Fixed(Vec::new())
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(ids) => f.debug_tuple("Fixed").field(ids).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl Dependencies {
    /// Evaluates the dependency list for `config`, dropping duplicates.
    #[must_use]
    pub fn evaluate(&self, config: &HarnessConfig) -> Vec<TestId> {
        let raw = match self {
            Self::Fixed(ids) => ids.clone(),
            Self::Dynamic(resolve) => resolve(config),
        };
        let mut seen = Vec::with_capacity(raw.len());
        for id in raw {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    /// Returns the fixed list, if the dependencies are static.
    #[must_use]
    pub fn fixed(&self) -> Option<&[TestId]> {
        match self {
            Self::Fixed(ids) => Some(ids),
            Self::Dynamic(_) => None,
        }
    }
}

/// Declared context slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextSchema {
    /// Names consumed from dependencies.
    pub expects: Vec<String>,
    /// Names produced for dependents.
    pub provides: Vec<String>,
}

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Immutable test definition.
#[derive(Clone)]
pub struct TestDefinition {
    /// Unique identifier.
    id: TestId,
    /// Protocol tag.
    protocol: ProtocolId,
    /// Logical group name.
    group: String,
    /// Human-readable claim.
    assertion: String,
    /// Declared dependencies.
    dependencies: Dependencies,
    /// Declared context slots.
    context: ContextSchema,
    /// Failure mode table.
    failure_modes: FailureModes,
    /// Run contract.
    check: Arc<dyn TestCheck>,
}

impl fmt::Debug for TestDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDefinition")
            .field("id", &self.id)
            .field("protocol", &self.protocol)
            .field("group", &self.group)
            .field("assertion", &self.assertion)
            .field("dependencies", &self.dependencies)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl TestDefinition {
    /// Creates a definition with no dependencies and only generic failure modes.
    #[must_use]
    pub fn new<F>(
        id: impl Into<TestId>,
        protocol: ProtocolId,
        group: impl Into<String>,
        assertion: impl Into<String>,
        check: F,
    ) -> Self
    where
        F: Fn(&mut RunContext<'_>) -> Result<TestResult, TestError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            protocol,
            group: group.into(),
            assertion: assertion.into(),
            dependencies: Dependencies::default(),
            context: ContextSchema::default(),
            failure_modes: FailureModes::generic(),
            check: Arc::new(check),
        }
    }

    /// Sets fixed dependencies.
    #[must_use]
    pub fn with_dependencies<I, T>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TestId>,
    {
        self.dependencies = Dependencies::Fixed(dependencies.into_iter().map(Into::into).collect());
        self
    }

    /// Sets configuration-dependent dependencies.
    #[must_use]
    pub fn with_dynamic_dependencies(mut self, resolve: DependencyFn) -> Self {
        self.dependencies = Dependencies::Dynamic(resolve);
        self
    }

    /// Declares consumed context names.
    #[must_use]
    pub fn with_expects(mut self, names: &[&str]) -> Self {
        self.context.expects = names.iter().map(|name| (*name).to_string()).collect();
        self
    }

    /// Declares produced context names.
    #[must_use]
    pub fn with_provides(mut self, names: &[&str]) -> Self {
        self.context.provides = names.iter().map(|name| (*name).to_string()).collect();
        self
    }

    /// Declares a test-specific failure mode.
    #[must_use]
    pub fn with_failure_mode(
        mut self,
        kind: impl Into<FailureKind>,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.failure_modes.insert(kind, name, template);
        self
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> &TestId {
        &self.id
    }

    /// Returns the protocol tag.
    #[must_use]
    pub const fn protocol(&self) -> ProtocolId {
        self.protocol
    }

    /// Returns the group name.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the assertion text.
    #[must_use]
    pub fn assertion(&self) -> &str {
        &self.assertion
    }

    /// Returns the declared dependencies.
    #[must_use]
    pub const fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Returns the declared context slots.
    #[must_use]
    pub const fn context(&self) -> &ContextSchema {
        &self.context
    }

    /// Returns the failure mode table.
    #[must_use]
    pub const fn failure_modes(&self) -> &FailureModes {
        &self.failure_modes
    }

    /// Invokes the run contract.
    pub(crate) fn check(&self, ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
        self.check.run(ctx)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
