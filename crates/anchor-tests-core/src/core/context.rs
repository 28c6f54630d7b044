// crates/anchor-tests-core/src/core/context.rs
// ============================================================================
// Module: Anchor Tests Context Store
// Description: Per-test context slots and the per-run store of published outputs.
// Purpose: Thread values produced by a test into the tests that depend on it.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! Each test receives a fresh [`TestContext`] whose `expects` slots are filled
//! by name from the published `provides` of its declared dependencies. A
//! dependency publishes only after it passed, so a slot is never populated by a
//! failed or skipped test. The [`ContextStore`] is scoped to one execution and
//! keyed by [`TestId`].
//!
//! Invariants:
//! - A test can read only names it declared in `expects`.
//! - A test can write only names it declared in `provides`.
//! - Values are visible only to tests that declare the owner as a dependency.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::definition::ContextSchema;
use crate::core::definition::TestError;
use crate::core::identifiers::TestId;

// ============================================================================
// SECTION: Test Context
// ============================================================================

/// Context slots for one test instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestContext {
    /// Declared slot names.
    schema: ContextSchema,
    /// Populated `expects` slots.
    expects: BTreeMap<String, Value>,
    /// Populated `provides` slots.
    provides: BTreeMap<String, Value>,
}

impl TestContext {
    /// Creates an empty context for `schema`.
    #[must_use]
    pub fn new(schema: ContextSchema) -> Self {
        Self { schema, expects: BTreeMap::new(), provides: BTreeMap::new() }
    }

    /// Returns the declared schema.
    #[must_use]
    pub const fn schema(&self) -> &ContextSchema {
        &self.schema
    }

    /// Returns an expected value, or `None` when no dependency populated it.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::UndeclaredContext`] when `name` is not expected.
    pub fn expect(&self, name: &str) -> Result<Option<&Value>, TestError> {
        if !self.schema.expects.iter().any(|declared| declared == name) {
            return Err(TestError::UndeclaredContext(name.to_string()));
        }
        Ok(self.expects.get(name))
    }

    /// Returns an expected value that must be populated.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] when `name` is undeclared or unset.
    pub fn require(&self, name: &str) -> Result<&Value, TestError> {
        self.expect(name)?.ok_or_else(|| TestError::MissingContext(name.to_string()))
    }

    /// Returns an expected string value that must be populated.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] when `name` is undeclared, unset, or not a string.
    pub fn require_str(&self, name: &str) -> Result<&str, TestError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| TestError::Internal(format!("context value {name} is not a string")))
    }

    /// Publishes a value for dependents.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::UndeclaredContext`] when `name` is not provided.
    pub fn provide(&mut self, name: &str, value: impl Into<Value>) -> Result<(), TestError> {
        if !self.schema.provides.iter().any(|declared| declared == name) {
            return Err(TestError::UndeclaredContext(name.to_string()));
        }
        self.provides.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Returns a value this test has published.
    #[must_use]
    pub fn provided(&self, name: &str) -> Option<&Value> {
        self.provides.get(name)
    }

    /// Copies published values into matching `expects` slots.
    fn merge_published(&mut self, published: &BTreeMap<String, Value>) {
        for name in &self.schema.expects {
            if let Some(value) = published.get(name) {
                self.expects.insert(name.clone(), value.clone());
            }
        }
    }
}

// ============================================================================
// SECTION: Context Store
// ============================================================================

/// Published outputs for one execution pass.
#[derive(Debug, Default)]
pub struct ContextStore {
    /// Outputs of passed tests keyed by test id.
    published: BTreeMap<TestId, BTreeMap<String, Value>>,
}

impl ContextStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a fresh context, merging outputs of `dependencies` in order.
    ///
    /// Later dependencies win when two publish the same name.
    #[must_use]
    pub fn prepare(&self, schema: &ContextSchema, dependencies: &[TestId]) -> TestContext {
        let mut context = TestContext::new(schema.clone());
        for dependency in dependencies {
            if let Some(published) = self.published.get(dependency) {
                context.merge_published(published);
            }
        }
        context
    }

    /// Publishes the outputs of a passed test.
    pub fn publish(&mut self, id: TestId, context: TestContext) {
        self.published.insert(id, context.provides);
    }

    /// Returns the published value `name` of test `id`.
    #[must_use]
    pub fn published(&self, id: &TestId, name: &str) -> Option<&Value> {
        self.published.get(id).and_then(|values| values.get(name))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
