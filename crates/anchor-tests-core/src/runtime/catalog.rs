// crates/anchor-tests-core/src/runtime/catalog.rs
// ============================================================================
// Module: Anchor Tests Catalog
// Description: Static registry of test definitions in declaration order.
// Purpose: Look up definitions by protocol and identifier.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! A [`TestCatalog`] is built once and shared immutably across runs. Listing is
//! a pure lookup that preserves declaration order.
//!
//! Invariants:
//! - Identifiers are unique.
//! - Every fixed dependency names a registered definition.
//! - Fixed dependencies form a DAG across the whole catalog, not just the part
//!   a configuration selects. Dynamic edges are checked by the resolver.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;

use crate::core::definition::TestDefinition;
use crate::core::identifiers::ProtocolId;
use crate::core::identifiers::TestId;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Two definitions share an identifier.
    #[error("duplicate test id: {0}")]
    DuplicateTestId(TestId),
    /// A fixed dependency names an unregistered definition.
    #[error("test {test} depends on unknown test {dependency}")]
    UnknownDependency {
        /// Declaring test.
        test: TestId,
        /// Missing dependency.
        dependency: TestId,
    },
    /// Fixed dependencies form a cycle.
    #[error("dependency cycle: {}", join_path(.path))]
    Cycle {
        /// Traversal path, starting and ending with the re-entered test.
        path: Vec<TestId>,
    },
}

/// Formats a cycle path as `a -> b -> a`.
fn join_path(path: &[TestId]) -> String {
    path.iter().map(TestId::as_str).collect::<Vec<_>>().join(" -> ")
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Immutable registry of test definitions.
#[derive(Debug, Clone, Default)]
pub struct TestCatalog {
    /// Definitions in declaration order.
    definitions: Vec<Arc<TestDefinition>>,
    /// Position of each definition by identifier.
    index: BTreeMap<TestId, usize>,
}

impl TestCatalog {
    /// Starts a catalog builder.
    #[must_use]
    pub fn builder() -> TestCatalogBuilder {
        TestCatalogBuilder::default()
    }

    /// Returns definitions tagged with any of `protocols`, in declaration order.
    #[must_use]
    pub fn list(&self, protocols: &[ProtocolId]) -> Vec<Arc<TestDefinition>> {
        self.definitions
            .iter()
            .filter(|definition| protocols.contains(&definition.protocol()))
            .cloned()
            .collect()
    }

    /// Returns the definition registered under `id`.
    #[must_use]
    pub fn get(&self, id: &TestId) -> Option<&Arc<TestDefinition>> {
        self.index.get(id).and_then(|position| self.definitions.get(*position))
    }

    /// Returns the distinct protocols present in the catalog.
    #[must_use]
    pub fn protocols(&self) -> BTreeSet<ProtocolId> {
        self.definitions.iter().map(|definition| definition.protocol()).collect()
    }

    /// Iterates every definition in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TestDefinition>> {
        self.definitions.iter()
    }

    /// Returns the number of definitions.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true when no definition is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`TestCatalog`].
#[derive(Debug, Default)]
pub struct TestCatalogBuilder {
    /// Registered definitions in order.
    definitions: Vec<TestDefinition>,
}

impl TestCatalogBuilder {
    /// Registers a definition.
    #[must_use]
    pub fn register(mut self, definition: TestDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Registers definitions in order.
    #[must_use]
    pub fn register_all(mut self, definitions: impl IntoIterator<Item = TestDefinition>) -> Self {
        self.definitions.extend(definitions);
        self
    }

    /// Builds the catalog.
    ///
    /// Dynamic dependencies are checked at resolution time instead.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] on duplicate identifiers, unknown fixed
    /// dependencies, or a cycle among fixed dependencies.
    pub fn build(self) -> Result<TestCatalog, CatalogError> {
        let mut index = BTreeMap::new();
        for (position, definition) in self.definitions.iter().enumerate() {
            if index.insert(definition.id().clone(), position).is_some() {
                return Err(CatalogError::DuplicateTestId(definition.id().clone()));
            }
        }
        for definition in &self.definitions {
            let Some(fixed) = definition.dependencies().fixed() else {
                continue;
            };
            if let Some(missing) = fixed.iter().find(|dependency| !index.contains_key(*dependency))
            {
                return Err(CatalogError::UnknownDependency {
                    test: definition.id().clone(),
                    dependency: missing.clone(),
                });
            }
        }
        check_fixed_cycles(&self.definitions, &index)?;
        let definitions = self.definitions.into_iter().map(Arc::new).collect();
        Ok(TestCatalog { definitions, index })
    }
}

// ============================================================================
// SECTION: Cycle Detection
// ============================================================================

/// Traversal mark for a catalog position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current traversal path.
    Visiting,
    /// Fully explored.
    Done,
}

/// Walks every fixed edge depth-first, rejecting the first cycle found.
///
/// Uses an explicit stack so deep chains cannot overflow the call stack.
fn check_fixed_cycles(
    definitions: &[TestDefinition],
    index: &BTreeMap<TestId, usize>,
) -> Result<(), CatalogError> {
    let edges: Vec<Vec<usize>> = definitions
        .iter()
        .map(|definition| {
            definition
                .dependencies()
                .fixed()
                .unwrap_or_default()
                .iter()
                .filter_map(|dependency| index.get(dependency).copied())
                .collect()
        })
        .collect();
    let mut marks: Vec<Option<Mark>> = vec![None; definitions.len()];
    for root in 0..definitions.len() {
        if marks[root].is_some() {
            continue;
        }
        marks[root] = Some(Mark::Visiting);
        let mut path: Vec<(usize, usize)> = vec![(root, 0)];
        while let Some((node, next_edge)) = path.last_mut() {
            let node = *node;
            let Some(&target) = edges[node].get(*next_edge) else {
                marks[node] = Some(Mark::Done);
                path.pop();
                continue;
            };
            *next_edge += 1;
            match marks[target] {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start =
                        path.iter().position(|(entry, _)| *entry == target).unwrap_or_default();
                    let mut cycle: Vec<TestId> = path[start..]
                        .iter()
                        .map(|(entry, _)| definitions[*entry].id().clone())
                        .collect();
                    cycle.push(definitions[target].id().clone());
                    return Err(CatalogError::Cycle { path: cycle });
                }
                None => {
                    marks[target] = Some(Mark::Visiting);
                    path.push((target, 0));
                }
            }
        }
    }
    Ok(())
}
