// crates/anchor-tests-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Shared fakes and builders for core integration tests.
// Purpose: Script network responses and count test body invocations.
// Dependencies: anchor-tests-core
// ============================================================================

//! ## Overview
//! Provides a scripted [`NetworkCaller`], a recording event sink, and small
//! definition builders that count how often their run contract is invoked.

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
#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anchor_tests_core::CallError;
use anchor_tests_core::HarnessConfig;
use anchor_tests_core::HttpRequest;
use anchor_tests_core::NetworkCaller;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::RunEvent;
use anchor_tests_core::RunEventSink;
use anchor_tests_core::TestDefinition;
use anchor_tests_core::TestResult;
use anchor_tests_core::TransportResponse;

/// Scripted network caller keyed by URL.
#[derive(Default)]
pub struct FakeCaller {
    /// Scripted outcomes.
    routes: Mutex<BTreeMap<String, Result<TransportResponse, CallError>>>,
    /// Requests received, unredacted.
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeCaller {
    /// Creates a caller with no routes; unknown URLs return 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a response for `url`.
    pub fn route(&self, url: &str, status: u16, content_type: &str, body: &str) {
        let response = TransportResponse {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.as_bytes().to_vec(),
        };
        self.routes.lock().unwrap().insert(url.to_string(), Ok(response));
    }

    /// Scripts a transport error for `url`.
    pub fn fail(&self, url: &str, error: CallError) {
        self.routes.lock().unwrap().insert(url.to_string(), Err(error));
    }

    /// Returns the requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl NetworkCaller for FakeCaller {
    fn send(
        &self,
        request: &HttpRequest,
        _timeout: Duration,
    ) -> Result<TransportResponse, CallError> {
        self.requests.lock().unwrap().push(request.clone());
        self.routes.lock().unwrap().get(&request.url).cloned().unwrap_or_else(|| {
            Ok(TransportResponse { status: 404, headers: Vec::new(), body: Vec::new() })
        })
    }
}

/// Event sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    /// Recorded events.
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingSink {
    /// Returns recorded event names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(RunEvent::name).collect()
    }

    /// Returns recorded events.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl RunEventSink for RecordingSink {
    fn record(&self, event: &RunEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Invocation counter shared with a test body.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    /// Returns the number of invocations.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Records one invocation.
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Protocol used by synthetic definitions.
pub const PROTOCOL: ProtocolId = ProtocolId::new(1).unwrap();

/// Builds a valid configuration for `protocols`.
pub fn config(protocols: &[u16]) -> HarnessConfig {
    HarnessConfig::new(
        "anchor.example",
        protocols.iter().map(|id| ProtocolId::new(*id).unwrap()).collect(),
    )
}

/// Definition that always passes and counts invocations.
pub fn passing(id: &str, counter: &Counter) -> TestDefinition {
    let counter = counter.clone();
    TestDefinition::new(id, PROTOCOL, "synthetic", format!("{id} passes"), move |_ctx| {
        counter.hit();
        Ok(TestResult::passed())
    })
}

/// Definition that always fails and counts invocations.
pub fn failing(id: &str, counter: &Counter) -> TestDefinition {
    let counter = counter.clone();
    TestDefinition::new(id, PROTOCOL, "synthetic", format!("{id} fails"), move |ctx| {
        counter.hit();
        Err(ctx.fail("BROKEN", &[]))
    })
    .with_failure_mode("BROKEN", "broken", "synthetic failure")
}
