// crates/anchor-tests-suites/tests/common/mod.rs
// ============================================================================
// Module: Stub Anchor
// Description: Loopback HTTP server impersonating an anchor.
// Purpose: Drive the built-in suites end to end without external services.
// Dependencies: anchor-tests-core, anchor-tests-http, tiny_http
// ============================================================================

//! ## Overview
//! [`StubAnchor`] serves scripted routes on `127.0.0.1` and records every
//! request it receives. [`healthy_routes`] describes a conforming anchor that
//! individual tests then break one route at a time.

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
use std::thread;
use std::thread::JoinHandle;

use anchor_tests_core::HarnessConfig;
use anchor_tests_core::Harness;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::TestRun;
use anchor_tests_http::ReqwestCaller;
use anchor_tests_suites::default_catalog;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

/// Testnet passphrase served by the stub.
pub const TESTNET: &str = "Test SDF Network ; September 2015";
/// Account used for web auth challenges.
pub const ACCOUNT: &str = "GCKFBEIYV2U22IO2BJ4KVJOIP7XPWQGQFKKWXR6DOSJBV7STMAQSMTGG";

/// Scripted response for one path.
#[derive(Clone)]
pub struct Route {
    /// Status code.
    pub status: u16,
    /// Content-Type header value.
    pub content_type: &'static str,
    /// Response body.
    pub body: String,
    /// Extra headers.
    pub headers: Vec<(&'static str, &'static str)>,
}

impl Route {
    /// JSON response.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self { status, content_type: "application/json", body: body.to_string(), headers: Vec::new() }
    }

    /// Plain text response.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self { status, content_type: "text/plain", body: body.into(), headers: Vec::new() }
    }

    /// Adds a header.
    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

/// Request seen by the stub.
#[derive(Debug, Clone)]
pub struct Seen {
    /// Path without query.
    pub path: String,
    /// Full request URL (path and query).
    pub url: String,
    /// Authorization header, if any.
    pub authorization: Option<String>,
}

/// Loopback anchor serving scripted routes.
pub struct StubAnchor {
    /// Base URL, `http://127.0.0.1:<port>`.
    pub base: String,
    /// Server handle used to stop the accept loop.
    server: Arc<Server>,
    /// Requests seen so far.
    seen: Arc<Mutex<Vec<Seen>>>,
    /// Accept loop thread.
    handle: Option<JoinHandle<()>>,
}

impl StubAnchor {
    /// Starts a stub whose routes are built from its base URL.
    pub fn start(routes: impl FnOnce(&str) -> BTreeMap<String, Route>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let base = format!("http://{}", server.server_addr().to_ip().unwrap());
        let routes = routes(&base);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = {
            let server = Arc::clone(&server);
            let seen = Arc::clone(&seen);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    let url = request.url().to_string();
                    let path = url.split('?').next().unwrap_or_default().to_string();
                    let authorization = request
                        .headers()
                        .iter()
                        .find(|header| header.field.equiv("Authorization"))
                        .map(|header| header.value.as_str().to_string());
                    seen.lock().unwrap().push(Seen { path: path.clone(), url, authorization });
                    let route = routes
                        .get(&path)
                        .cloned()
                        .unwrap_or_else(|| Route::text(404, "not found"));
                    let mut response = Response::from_data(route.body.into_bytes())
                        .with_status_code(route.status)
                        .with_header(Header::from_bytes("Content-Type", route.content_type).unwrap());
                    for (name, value) in route.headers {
                        response.add_header(Header::from_bytes(name, value).unwrap());
                    }
                    let _ = request.respond(response);
                }
            })
        };
        Self { base, server, seen, handle: Some(handle) }
    }

    /// Returns the requests seen so far.
    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    /// Counts requests for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.seen().iter().filter(|seen| seen.path == path).count()
    }

    /// Builds a configuration targeting this stub.
    pub fn config(&self, protocols: &[u16]) -> HarnessConfig {
        HarnessConfig::new(self.base.clone(), protocols.iter().map(|id| ProtocolId::new(*id).unwrap()).collect())
    }
}

impl Drop for StubAnchor {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Discovery file of a conforming anchor.
pub fn stellar_toml(base: &str) -> String {
    format!(
        "NETWORK_PASSPHRASE = \"{TESTNET}\"\n\
         SIGNING_KEY = \"{ACCOUNT}\"\n\
         WEB_AUTH_ENDPOINT = \"{base}/auth\"\n\
         TRANSFER_SERVER = \"{base}/sep6/\"\n"
    )
}

/// Routes of a conforming anchor.
pub fn healthy_routes(base: &str) -> BTreeMap<String, Route> {
    let mut routes = BTreeMap::new();
    routes.insert(
        "/.well-known/stellar.toml".to_string(),
        Route::text(200, stellar_toml(base)).header("Access-Control-Allow-Origin", "*"),
    );
    routes.insert(
        "/auth".to_string(),
        Route::json(
            200,
            &serde_json::json!({"transaction": "AAAAAgAAAAA=", "network_passphrase": TESTNET}),
        ),
    );
    routes.insert(
        "/sep6/info".to_string(),
        Route::json(
            200,
            &serde_json::json!({
                "deposit": {"USDC": {"enabled": true, "fee_fixed": 1}, "AAA": {"enabled": false}},
                "withdraw": {"USDC": {"enabled": true}}
            }),
        ),
    );
    routes.insert(
        "/sep6/deposit".to_string(),
        Route::json(400, &serde_json::json!({"error": "asset_code is required"})),
    );
    routes
}

/// Runs the default catalog against `config` and returns every run plus the final config.
pub fn run_suites(config: HarnessConfig) -> (Vec<TestRun>, HarnessConfig) {
    let harness =
        Harness::new(Arc::new(default_catalog().unwrap()), Arc::new(ReqwestCaller::new().unwrap()));
    let mut execution = harness.run(config).unwrap();
    let runs: Vec<TestRun> = execution.by_ref().collect();
    (runs, execution.into_config())
}

/// Returns the run for `id`.
pub fn run_of<'a>(runs: &'a [TestRun], id: &str) -> &'a TestRun {
    runs.iter().find(|run| run.definition.id().as_str() == id).unwrap()
}
