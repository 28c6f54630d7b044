// crates/anchor-tests-core/src/runtime/context.rs
// ============================================================================
// Module: Anchor Tests Run Context
// Description: Per-invocation handle passed to a test's run contract.
// Purpose: Lend the configuration, context slots, and network access to a test.
// Dependencies: crate::{core, interfaces}, serde_json
// ============================================================================

//! ## Overview
//! A [`RunContext`] exists for exactly one test invocation. It lends the run
//! configuration mutably (so early tests can fill defaults), exposes the test's
//! context slots, and performs network calls. Every call is recorded in issue
//! order and classified against a [`ResponseExpectation`] into the generic
//! failure kinds.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;

use crate::core::config::HarnessConfig;
use crate::core::context::TestContext;
use crate::core::definition::TestError;
use crate::core::failure::BAD_CONTENT_TYPE;
use crate::core::failure::CONNECTION_ERROR;
use crate::core::failure::Failure;
use crate::core::failure::FailureModes;
use crate::core::failure::UNEXPECTED_STATUS_CODE;
use crate::core::network::ExpectationMismatch;
use crate::core::network::HttpRequest;
use crate::core::network::HttpResponse;
use crate::core::network::NetworkCall;
use crate::core::network::ResponseExpectation;
use crate::interfaces::NetworkCaller;

// ============================================================================
// SECTION: Run Context
// ============================================================================

/// Handle passed to a test's run contract.
pub struct RunContext<'a> {
    /// Run configuration, lent for this invocation.
    config: &'a mut HarnessConfig,
    /// Context slots for this test.
    context: &'a mut TestContext,
    /// Network collaborator.
    caller: &'a dyn NetworkCaller,
    /// Failure modes of the running definition.
    failure_modes: &'a FailureModes,
    /// Calls recorded so far.
    network_calls: Vec<NetworkCall>,
}

impl<'a> RunContext<'a> {
    /// Creates a run context for one invocation.
    pub(crate) fn new(
        config: &'a mut HarnessConfig,
        context: &'a mut TestContext,
        caller: &'a dyn NetworkCaller,
        failure_modes: &'a FailureModes,
    ) -> Self {
        Self { config, context, caller, failure_modes, network_calls: Vec::new() }
    }

    /// Returns the run configuration.
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &*self.config
    }

    /// Returns the run configuration for default-filling.
    pub fn config_mut(&mut self) -> &mut HarnessConfig {
        &mut *self.config
    }

    /// Returns the test's context slots.
    #[must_use]
    pub fn context(&self) -> &TestContext {
        &*self.context
    }

    /// Returns an expected value, or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::UndeclaredContext`] for undeclared names.
    pub fn expect(&self, name: &str) -> Result<Option<&Value>, TestError> {
        self.context.expect(name)
    }

    /// Returns a populated expected value.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] when `name` is undeclared or unset.
    pub fn require(&self, name: &str) -> Result<&Value, TestError> {
        self.context.require(name)
    }

    /// Returns a populated expected string.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] when `name` is undeclared, unset, or not a string.
    pub fn require_str(&self, name: &str) -> Result<&str, TestError> {
        self.context.require_str(name)
    }

    /// Publishes a value for dependents.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::UndeclaredContext`] for undeclared names.
    pub fn provide(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TestError> {
        self.context.provide(name, value)
    }

    /// Renders a failure from the running definition's modes.
    #[must_use]
    pub fn failure(&self, kind: &str, args: &[(&str, String)]) -> Failure {
        self.failure_modes.render(kind, args)
    }

    /// Renders a failure and wraps it as a [`TestError`].
    #[must_use]
    pub fn fail(&self, kind: &str, args: &[(&str, String)]) -> TestError {
        TestError::from(self.failure(kind, args))
    }

    /// Returns the calls recorded so far.
    #[must_use]
    pub fn network_calls(&self) -> &[NetworkCall] {
        &self.network_calls
    }

    /// Sends `request`, records it, and checks the response against `expectation`.
    ///
    /// # Errors
    ///
    /// Returns a `CONNECTION_ERROR`, `UNEXPECTED_STATUS_CODE`, or
    /// `BAD_CONTENT_TYPE` failure.
    pub fn call(
        &mut self,
        request: HttpRequest,
        expectation: &ResponseExpectation,
    ) -> Result<HttpResponse, TestError> {
        let timeout = self.config.request_timeout();
        let recorded = request.redacted();
        let response = match self.caller.send(&request, timeout) {
            Ok(raw) => HttpResponse::from_transport(raw),
            Err(err) => {
                self.network_calls.push(NetworkCall { request: recorded, response: None });
                return Err(self.fail(
                    CONNECTION_ERROR,
                    &[("url", request.url.clone()), ("error", err.to_string())],
                ));
            }
        };
        self.network_calls.push(NetworkCall { request: recorded, response: Some(response.clone()) });
        let Err(mismatch) = expectation.check(&response) else {
            return Ok(response);
        };
        let method = request.method.to_string();
        let failure = match mismatch {
            ExpectationMismatch::Status { expected, actual } => {
                let expected_text =
                    expected.iter().map(u16::to_string).collect::<Vec<_>>().join(" or ");
                let expected_value =
                    if expected.len() == 1 { json!(expected[0]) } else { json!(expected) };
                self.failure(
                    UNEXPECTED_STATUS_CODE,
                    &[
                        ("method", method),
                        ("url", request.url.clone()),
                        ("expected", expected_text),
                        ("actual", actual.to_string()),
                    ],
                )
                .with_expected(expected_value)
                .with_actual(actual)
            }
            ExpectationMismatch::ContentType { expected, actual } => {
                let actual_text = actual.clone().unwrap_or_else(|| "none".to_string());
                self.failure(
                    BAD_CONTENT_TYPE,
                    &[
                        ("method", method),
                        ("url", request.url.clone()),
                        ("expected", expected.clone()),
                        ("actual", actual_text),
                    ],
                )
                .with_expected(expected)
                .with_actual(actual.map_or(Value::Null, Value::String))
            }
        };
        Err(TestError::from(failure))
    }

    /// Consumes the context, returning the recorded calls.
    pub(crate) fn into_network_calls(self) -> Vec<NetworkCall> {
        self.network_calls
    }
}
