// crates/anchor-tests-core/src/runtime/resolver.rs
// ============================================================================
// Module: Anchor Tests Dependency Resolver
// Description: Depth-first resolution of seed tests into an execution plan.
// Purpose: Order tests so every dependency precedes its dependents exactly once.
// Dependencies: crate::core, crate::runtime::catalog, serde, thiserror
// ============================================================================

//! ## Overview
//! [`resolve`] walks each seed depth-first, emitting dependencies before the
//! test that declares them. Dynamic dependency lists are evaluated once against
//! the configuration and stored on the plan, so the engine never re-evaluates
//! them. Resolution is per configuration and is not cached.
//!
//! Invariants:
//! - Each definition appears in the plan exactly once.
//! - Every dependency precedes every dependent.
//! - Re-entering a test on the current traversal path is a cycle error naming
//!   the full path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::config::HarnessConfig;
use crate::core::definition::TestDefinition;
use crate::core::identifiers::ProtocolId;
use crate::core::identifiers::TestId;
use crate::runtime::catalog::TestCatalog;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum dependency chain length accepted by the resolver.
pub const MAX_RESOLUTION_DEPTH: usize = 256;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Resolution errors. All are fatal and raised before any test runs.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The dependency graph contains a cycle.
    #[error("dependency cycle: {}", join_path(.path))]
    Cycle {
        /// Traversal path, starting and ending with the re-entered test.
        path: Vec<TestId>,
    },
    /// A dependency names an unregistered definition.
    #[error("test {test} depends on unknown test {dependency}")]
    UnknownDependency {
        /// Declaring test.
        test: TestId,
        /// Missing dependency.
        dependency: TestId,
    },
    /// The dependency chain exceeded [`MAX_RESOLUTION_DEPTH`].
    #[error("dependency chain exceeds depth limit of {limit}")]
    DepthExceeded {
        /// Depth limit.
        limit: usize,
    },
}

/// Formats a cycle path as `a -> b -> a`.
fn join_path(path: &[TestId]) -> String {
    path.iter().map(TestId::as_str).collect::<Vec<_>>().join(" -> ")
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// A definition with its dependencies evaluated for one configuration.
#[derive(Debug, Clone)]
pub struct ResolvedTest {
    /// Definition.
    pub definition: Arc<TestDefinition>,
    /// Evaluated dependency identifiers.
    pub dependencies: Vec<TestId>,
}

/// Serializable preview entry for a planned test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Test identifier.
    pub test_id: TestId,
    /// Protocol identifier.
    pub protocol: ProtocolId,
    /// Logical group.
    pub group: String,
    /// Assertion text.
    pub assertion: String,
    /// Evaluated dependencies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TestId>,
}

/// Ordered, deduplicated execution plan.
#[derive(Debug, Clone, Default)]
pub struct TestPlan {
    /// Tests in execution order.
    tests: Vec<ResolvedTest>,
}

impl TestPlan {
    /// Returns the planned definitions in order.
    #[must_use]
    pub fn definitions(&self) -> Vec<Arc<TestDefinition>> {
        self.tests.iter().map(|test| Arc::clone(&test.definition)).collect()
    }

    /// Iterates resolved tests in order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedTest> {
        self.tests.iter()
    }

    /// Returns the resolved test at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&ResolvedTest> {
        self.tests.get(position)
    }

    /// Returns the number of planned tests.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true when nothing is planned.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Returns serializable preview entries.
    #[must_use]
    pub fn entries(&self) -> Vec<PlanEntry> {
        self.tests
            .iter()
            .map(|test| PlanEntry {
                test_id: test.definition.id().clone(),
                protocol: test.definition.protocol(),
                group: test.definition.group().to_string(),
                assertion: test.definition.assertion().to_string(),
                dependencies: test.dependencies.clone(),
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Traversal mark for a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current traversal path.
    Visiting,
    /// Already emitted.
    Placed,
}

/// Depth-first traversal state.
struct Resolver<'a> {
    /// Catalog used for dependency lookup.
    catalog: &'a TestCatalog,
    /// Configuration for dynamic dependencies.
    config: &'a HarnessConfig,
    /// Marks by identifier.
    marks: BTreeMap<TestId, Mark>,
    /// Current traversal path.
    stack: Vec<TestId>,
    /// Emitted tests in order.
    placed: Vec<ResolvedTest>,
}

impl Resolver<'_> {
    /// Visits `definition`, emitting its dependencies first.
    fn visit(&mut self, definition: &Arc<TestDefinition>) -> Result<(), ResolveError> {
        let id = definition.id();
        match self.marks.get(id) {
            Some(Mark::Placed) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = self.stack.iter().position(|entry| entry == id).unwrap_or_default();
                let mut path = self.stack[start..].to_vec();
                path.push(id.clone());
                return Err(ResolveError::Cycle { path });
            }
            None => {}
        }
        if self.stack.len() >= MAX_RESOLUTION_DEPTH {
            return Err(ResolveError::DepthExceeded { limit: MAX_RESOLUTION_DEPTH });
        }
        self.marks.insert(id.clone(), Mark::Visiting);
        self.stack.push(id.clone());

        let dependencies = definition.dependencies().evaluate(self.config);
        for dependency in &dependencies {
            let Some(next) = self.catalog.get(dependency) else {
                return Err(ResolveError::UnknownDependency {
                    test: id.clone(),
                    dependency: dependency.clone(),
                });
            };
            let next = Arc::clone(next);
            self.visit(&next)?;
        }

        self.stack.pop();
        self.marks.insert(id.clone(), Mark::Placed);
        self.placed.push(ResolvedTest { definition: Arc::clone(definition), dependencies });
        Ok(())
    }
}

/// Resolves `seeds` and their transitive dependencies into a plan.
///
/// # Errors
///
/// Returns [`ResolveError`] on cycles, unknown dependencies, or excessive depth.
pub fn resolve(
    catalog: &TestCatalog,
    config: &HarnessConfig,
    seeds: &[Arc<TestDefinition>],
) -> Result<TestPlan, ResolveError> {
    let mut resolver = Resolver {
        catalog,
        config,
        marks: BTreeMap::new(),
        stack: Vec::new(),
        placed: Vec::new(),
    };
    for seed in seeds {
        resolver.visit(seed)?;
    }
    Ok(TestPlan { tests: resolver.placed })
}
