// crates/anchor-tests-core/tests/resolver.rs
// ============================================================================
// Module: Dependency Resolver Tests
// Description: Tests for catalog construction and plan resolution.
// Purpose: Validate ordering, deduplication, dynamic dependencies, and cycles.
// Dependencies: anchor-tests-core
// ============================================================================
//! ## Overview
//! Exercises [`resolve`] and [`TestCatalog`] directly, without executing tests.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use anchor_tests_core::CatalogError;
use anchor_tests_core::HarnessConfig;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::ResolveError;
use anchor_tests_core::TestCatalog;
use anchor_tests_core::TestDefinition;
use anchor_tests_core::TestId;
use anchor_tests_core::TestResult;
use anchor_tests_core::resolve;
use anchor_tests_core::runtime::MAX_RESOLUTION_DEPTH;
use common::Counter;
use common::config;
use common::passing;
use serde_json::json;

/// Dynamic dependencies that add `auth` when authentication is required.
fn auth_when_required(config: &HarnessConfig) -> Vec<TestId> {
    let mut deps = vec![TestId::new("info")];
    if config.protocol_flag(ProtocolId::new(6).unwrap(), "authentication_required") {
        deps.push(TestId::new("auth"));
    }
    deps
}

/// Dynamic dependencies naming an unregistered test.
fn missing_dependency(_: &HarnessConfig) -> Vec<TestId> {
    vec![TestId::new("ghost")]
}

/// Dynamic dependency closing the `x -> y -> z` chain back onto `x`.
fn back_to_x(_: &HarnessConfig) -> Vec<TestId> {
    vec![TestId::new("x")]
}

/// Builds a definition tagged with `protocol`.
fn tagged(id: &str, protocol: u16) -> TestDefinition {
    TestDefinition::new(id, ProtocolId::new(protocol).unwrap(), "g", id, |_| Ok(TestResult::passed()))
}

/// Returns the ids of a resolved plan in order.
fn ids(catalog: &TestCatalog, config: &HarnessConfig) -> Vec<String> {
    let seeds = catalog.list(&config.protocols);
    resolve(catalog, config, &seeds)
        .unwrap()
        .iter()
        .map(|test| test.definition.id().to_string())
        .collect()
}

#[test]
fn list_filters_by_protocol_in_declaration_order() {
    let catalog = TestCatalog::builder()
        .register(tagged("b", 6))
        .register(tagged("a", 1))
        .register(tagged("c", 6))
        .register(tagged("d", 10))
        .build()
        .unwrap();
    let listed: Vec<_> = catalog
        .list(&[ProtocolId::new(6).unwrap(), ProtocolId::new(10).unwrap()])
        .iter()
        .map(|def| def.id().to_string())
        .collect();
    assert_eq!(listed, vec!["b", "c", "d"]);
    assert_eq!(catalog.protocols().len(), 3);
    assert!(catalog.get(&TestId::new("a")).is_some());
    assert!(catalog.get(&TestId::new("zzz")).is_none());
}

#[test]
fn catalog_rejects_duplicates_and_unknown_fixed_dependencies() {
    let counter = Counter::default();
    let duplicate =
        TestCatalog::builder().register(passing("a", &counter)).register(passing("a", &counter)).build();
    assert_eq!(duplicate.unwrap_err(), CatalogError::DuplicateTestId(TestId::new("a")));

    let unknown = TestCatalog::builder()
        .register(passing("a", &counter).with_dependencies(["missing"]))
        .build();
    assert_eq!(
        unknown.unwrap_err(),
        CatalogError::UnknownDependency { test: TestId::new("a"), dependency: TestId::new("missing") }
    );
}

#[test]
fn dependencies_outside_selected_protocols_are_pulled_in() {
    let catalog = TestCatalog::builder()
        .register(tagged("toml", 1))
        .register(tagged("auth", 10).with_dependencies(["toml"]))
        .register(tagged("info", 6).with_dependencies(["toml"]))
        .register(tagged("deposit", 6).with_dynamic_dependencies(auth_when_required))
        .build()
        .unwrap();

    let mut plain = config(&[6]);
    assert_eq!(ids(&catalog, &plain), vec!["toml", "info", "deposit"]);

    plain.protocol_config.insert("6".to_string(), json!({"authentication_required": true}));
    assert_eq!(ids(&catalog, &plain), vec!["toml", "info", "auth", "deposit"]);

    let seeds = catalog.list(&plain.protocols);
    let plan = resolve(&catalog, &plain, &seeds).unwrap();
    let deposit = plan.entries().pop().unwrap();
    assert_eq!(deposit.dependencies, vec![TestId::new("info"), TestId::new("auth")]);
    assert_eq!(plan.definitions().len(), plan.len());
}

#[test]
fn unknown_dynamic_dependency_is_rejected() {
    let catalog = TestCatalog::builder()
        .register(tagged("dynamic", 1).with_dynamic_dependencies(missing_dependency))
        .build()
        .unwrap();
    let seeds = catalog.list(&[ProtocolId::new(1).unwrap()]);
    let err = resolve(&catalog, &config(&[1]), &seeds).unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnknownDependency {
            test: TestId::new("dynamic"),
            dependency: TestId::new("ghost"),
        }
    );
}

#[test]
fn dynamic_cycle_error_names_the_path() {
    let counter = Counter::default();
    let catalog = TestCatalog::builder()
        .register(passing("entry", &counter).with_dependencies(["x"]))
        .register(passing("x", &counter).with_dependencies(["y"]))
        .register(passing("y", &counter).with_dependencies(["z"]))
        .register(passing("z", &counter).with_dynamic_dependencies(back_to_x))
        .build()
        .unwrap();
    let seeds = catalog.list(&[ProtocolId::new(1).unwrap()]);
    let err = resolve(&catalog, &config(&[1]), &seeds).unwrap_err();
    assert_eq!(err.to_string(), "dependency cycle: x -> y -> z -> x");
}

#[test]
fn fixed_cycle_is_rejected_even_when_not_selected() {
    let built = TestCatalog::builder()
        .register(tagged("a", 1).with_dependencies(["b"]))
        .register(tagged("b", 1).with_dependencies(["a"]))
        .register(tagged("c", 2))
        .build();
    let err = built.unwrap_err();
    assert_eq!(
        err,
        CatalogError::Cycle { path: vec![TestId::new("a"), TestId::new("b"), TestId::new("a")] }
    );
    assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
}

#[test]
fn fixed_self_dependency_is_a_cycle() {
    let built = TestCatalog::builder()
        .register(tagged("root", 6))
        .register(tagged("loop", 6).with_dependencies(["root", "loop"]))
        .build();
    assert_eq!(
        built.unwrap_err(),
        CatalogError::Cycle { path: vec![TestId::new("loop"), TestId::new("loop")] }
    );
}

#[test]
fn overly_deep_chains_are_rejected() {
    let counter = Counter::default();
    let mut builder = TestCatalog::builder().register(passing("t0", &counter));
    for index in 1..=MAX_RESOLUTION_DEPTH + 1 {
        let previous = format!("t{}", index - 1);
        builder = builder.register(
            passing(&format!("t{index}"), &counter).with_dependencies([previous.as_str()]),
        );
    }
    let catalog = builder.build().unwrap();
    let last = catalog.get(&TestId::new(format!("t{}", MAX_RESOLUTION_DEPTH + 1))).unwrap().clone();
    let err = resolve(&catalog, &config(&[1]), &[last]).unwrap_err();
    assert_eq!(err, ResolveError::DepthExceeded { limit: MAX_RESOLUTION_DEPTH });
}
