// crates/anchor-tests-core/src/runtime/engine.rs
// ============================================================================
// Module: Anchor Tests Execution Engine
// Description: Plans and drives one sequential pass over resolved tests.
// Purpose: Run each test at most once, propagate skips, and stream results.
// Dependencies: crate::{core, events, interfaces, runtime}, serde, thiserror
// ============================================================================

//! ## Overview
//! [`Harness`] validates a configuration, seeds the resolver with the catalog
//! tests for the selected protocols, and returns an [`Execution`]. The
//! execution is a finite, non-restartable iterator: each call to `next` runs
//! (or skips) exactly one planned test and yields its [`TestRun`] immediately.
//!
//! Invariants:
//! - Emission order equals plan order.
//! - A test runs only when every dependency passed; otherwise it is skipped
//!   without invoking its run contract.
//! - Test state is memoized per execution by [`TestId`].
//! - Errors and panics inside a test body become failures of that test only.
//! - Plan errors are raised before any test runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::BTreeMap;
use std::panic;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::config::HarnessConfig;
use crate::core::config::HarnessConfigError;
use crate::core::context::ContextStore;
use crate::core::definition::TestDefinition;
use crate::core::definition::TestError;
use crate::core::failure::CONFIGURATION_ERROR;
use crate::core::failure::Failure;
use crate::core::failure::UNEXPECTED_ERROR;
use crate::core::identifiers::ProtocolId;
use crate::core::identifiers::TestId;
use crate::core::result::TestResult;
use crate::core::result::TestRunRecord;
use crate::core::result::TestStatus;
use crate::events::NoopEventSink;
use crate::events::RunEvent;
use crate::events::RunEventSink;
use crate::events::now_ms;
use crate::interfaces::NetworkCaller;
use crate::runtime::catalog::TestCatalog;
use crate::runtime::context::RunContext;
use crate::runtime::resolver::ResolveError;
use crate::runtime::resolver::ResolvedTest;
use crate::runtime::resolver::TestPlan;
use crate::runtime::resolver::resolve;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pass-level errors raised before any test runs.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// The configuration is structurally invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] HarnessConfigError),
    /// A selected protocol has no tests in the catalog.
    #[error("unknown protocol: {0}")]
    UnknownProtocol(ProtocolId),
    /// Dependency resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

// ============================================================================
// SECTION: Run Types
// ============================================================================

/// Cooperative cancellation flag checked between tests.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counts for a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Planned tests.
    pub planned: usize,
    /// Passed tests.
    pub passed: usize,
    /// Failed tests.
    pub failed: usize,
    /// Skipped tests.
    pub skipped: usize,
    /// True when the pass stopped early.
    pub cancelled: bool,
}

impl RunSummary {
    /// Returns the number of tests that produced a result.
    #[must_use]
    pub const fn completed(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Returns true when nothing failed and the pass was not cancelled.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }

    /// Counts one result.
    const fn count(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
    }
}

/// A definition paired with its result.
#[derive(Debug, Clone)]
pub struct TestRun {
    /// Definition that ran.
    pub definition: Arc<TestDefinition>,
    /// Result.
    pub result: TestResult,
}

impl TestRun {
    /// Returns the outcome status.
    #[must_use]
    pub const fn status(&self) -> TestStatus {
        self.result.status()
    }

    /// Returns the serializable record.
    #[must_use]
    pub fn to_record(&self) -> TestRunRecord {
        TestRunRecord {
            test_id: self.definition.id().clone(),
            protocol: self.definition.protocol(),
            group: self.definition.group().to_string(),
            assertion: self.definition.assertion().to_string(),
            status: self.result.status(),
            skipped: self.result.is_skipped(),
            failure: self.result.failure().cloned(),
            network_calls: self.result.network_calls.clone(),
        }
    }
}

// ============================================================================
// SECTION: Harness
// ============================================================================

/// Entry point for discovery and execution.
pub struct Harness {
    /// Shared catalog.
    catalog: Arc<TestCatalog>,
    /// Network collaborator.
    caller: Arc<dyn NetworkCaller>,
    /// Event sink.
    events: Arc<dyn RunEventSink>,
}

impl Harness {
    /// Creates a harness with a no-op event sink.
    #[must_use]
    pub fn new(catalog: Arc<TestCatalog>, caller: Arc<dyn NetworkCaller>) -> Self {
        Self { catalog, caller, events: Arc::new(NoopEventSink) }
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn RunEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &TestCatalog {
        &self.catalog
    }

    /// Resolves the plan for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] on invalid configuration or resolution failure.
    pub fn plan(&self, config: &HarnessConfig) -> Result<TestPlan, PlanError> {
        config.validate()?;
        let known = self.catalog.protocols();
        if let Some(unknown) = config.protocols.iter().find(|protocol| !known.contains(protocol)) {
            return Err(PlanError::UnknownProtocol(*unknown));
        }
        let seeds = self.catalog.list(&config.protocols);
        Ok(resolve(&self.catalog, config, &seeds)?)
    }

    /// Returns the ordered definitions a run of `config` would execute.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] on invalid configuration or resolution failure.
    pub fn get_tests(&self, config: &HarnessConfig) -> Result<Vec<Arc<TestDefinition>>, PlanError> {
        Ok(self.plan(config)?.definitions())
    }

    /// Starts an execution that owns `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] before any test runs.
    pub fn run(&self, config: HarnessConfig) -> Result<Execution, PlanError> {
        self.run_with_cancel(config, CancelFlag::new())
    }

    /// Starts an execution observing `cancel` between tests.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError`] before any test runs.
    pub fn run_with_cancel(
        &self,
        config: HarnessConfig,
        cancel: CancelFlag,
    ) -> Result<Execution, PlanError> {
        let plan = self.plan(&config)?;
        let summary = RunSummary { planned: plan.len(), ..RunSummary::default() };
        Ok(Execution {
            plan,
            cursor: 0,
            config,
            caller: Arc::clone(&self.caller),
            events: Arc::clone(&self.events),
            states: BTreeMap::new(),
            store: ContextStore::new(),
            summary,
            cancel,
            started: false,
            finished: false,
        })
    }
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// One execution pass, yielding results lazily in plan order.
pub struct Execution {
    /// Resolved plan.
    plan: TestPlan,
    /// Next plan position.
    cursor: usize,
    /// Run configuration owned by this pass.
    config: HarnessConfig,
    /// Network collaborator.
    caller: Arc<dyn NetworkCaller>,
    /// Event sink.
    events: Arc<dyn RunEventSink>,
    /// Memoized outcome per test.
    states: BTreeMap<TestId, TestStatus>,
    /// Published context values.
    store: ContextStore,
    /// Running counts.
    summary: RunSummary,
    /// Cancellation flag.
    cancel: CancelFlag,
    /// True once `run_started` was recorded.
    started: bool,
    /// True once the pass ended.
    finished: bool,
}

impl Execution {
    /// Returns the plan.
    #[must_use]
    pub const fn plan(&self) -> &TestPlan {
        &self.plan
    }

    /// Returns the running summary.
    #[must_use]
    pub const fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Returns the configuration as observed so far.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Returns the configuration, ending the pass.
    #[must_use]
    pub fn into_config(self) -> HarnessConfig {
        self.config
    }

    /// Returns a handle to the cancellation flag.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Returns the memoized status of `id`, if it produced a result.
    #[must_use]
    pub fn status_of(&self, id: &TestId) -> Option<TestStatus> {
        self.states.get(id).copied()
    }

    /// Runs or skips one resolved test.
    fn execute(&mut self, resolved: &ResolvedTest) -> TestResult {
        let definition = &resolved.definition;
        let ready = resolved
            .dependencies
            .iter()
            .all(|dependency| self.states.get(dependency) == Some(&TestStatus::Passed));
        if !ready {
            return TestResult::skipped();
        }

        let mut context = self.store.prepare(definition.context(), &resolved.dependencies);
        let (outcome, calls) = {
            let mut ctx = RunContext::new(
                &mut self.config,
                &mut context,
                self.caller.as_ref(),
                definition.failure_modes(),
            );
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| definition.check(&mut ctx)));
            (outcome, ctx.into_network_calls())
        };

        let mut result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => TestResult::failed(error_failure(definition, err)),
            Err(payload) => TestResult::failed(
                definition
                    .failure_modes()
                    .render(UNEXPECTED_ERROR, &[("error", panic_message(&*payload))]),
            ),
        };
        let mut network_calls = calls;
        network_calls.append(&mut result.network_calls);
        result.network_calls = network_calls;

        if result.status() == TestStatus::Passed {
            self.store.publish(definition.id().clone(), context);
        }
        result
    }

    /// Records `run_started` on the first pull.
    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.events.record(&RunEvent::RunStarted {
            timestamp_ms: now_ms(),
            domain: self.config.domain.clone(),
            protocols: self.config.protocols.clone(),
            planned: self.plan.len(),
        });
    }

    /// Ends the pass, recording cancellation when requested.
    fn finish(&mut self, cancelled: bool) {
        self.finished = true;
        if cancelled {
            self.summary.cancelled = true;
            self.events.record(&RunEvent::RunCancelled {
                timestamp_ms: now_ms(),
                completed: self.summary.completed(),
                planned: self.plan.len(),
            });
        }
        self.events.record(&RunEvent::RunFinished { timestamp_ms: now_ms(), summary: self.summary });
    }
}

impl Iterator for Execution {
    type Item = TestRun;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        self.start();
        let Some(resolved) = self.plan.get(self.cursor).cloned() else {
            self.finish(false);
            return None;
        };
        if self.cancel.is_cancelled() {
            self.finish(true);
            return None;
        }
        self.cursor += 1;

        let started = Instant::now();
        let result = self.execute(&resolved);
        let duration_ms = started.elapsed().as_millis();

        let status = result.status();
        self.states.insert(resolved.definition.id().clone(), status);
        self.summary.count(status);
        self.events.record(&RunEvent::TestFinished {
            timestamp_ms: now_ms(),
            test_id: resolved.definition.id().clone(),
            protocol: resolved.definition.protocol(),
            status,
            failure_kind: result.failure().map(|failure| failure.kind.clone()),
            duration_ms,
            network_calls: result.network_calls.len(),
        });
        Some(TestRun { definition: resolved.definition, result })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        (0, Some(self.plan.len().saturating_sub(self.cursor)))
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a test body error onto the definition's failure modes.
fn error_failure(definition: &TestDefinition, err: TestError) -> Failure {
    match err {
        TestError::Failed(failure) => *failure,
        TestError::Misconfigured(reason) => {
            definition.failure_modes().render(CONFIGURATION_ERROR, &[("reason", reason)])
        }
        other => definition.failure_modes().render(UNEXPECTED_ERROR, &[("error", other.to_string())]),
    }
}

/// Extracts a readable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("test panicked: {message}");
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("test panicked: {message}");
    }
    "test panicked".to_string()
}
