// system-tests/src/bin/restcheck_stub_server.rs
// ============================================================================
// Module: Restcheck Stub Server
// Description: Standalone runner for the stub REST API.
// Purpose: Serve the stub so the CLI can be pointed at it by hand.
// Dependencies: axum, system-tests, tokio
// ============================================================================

//! Standalone stub REST API for manual `restcheck run` sessions.
//!
//! Binds `RESTCHECK_SYSTEM_TEST_STUB_BIND` (default `127.0.0.1:3000`) and
//! serves until Ctrl-C.

#![allow(clippy::print_stderr, reason = "The stub binary reports status on stderr.")]

use std::net::SocketAddr;
use std::process::ExitCode;

use system_tests::config::SystemTestConfig;
use system_tests::stub::StubOptions;
use system_tests::stub::router;

/// Address used when no bind override is configured.
const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);

/// Serves the stub until interrupted.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let config = match SystemTestConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("restcheck-stub-server: config load failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let addr = config.stub_bind.unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND));

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("restcheck-stub-server: bind {addr} failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let (app, _inspector) = router(StubOptions::default());
    eprintln!("restcheck-stub-server: listening on http://{addr}");

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    if let Err(err) = axum::serve(listener, app).with_graceful_shutdown(shutdown).await {
        eprintln!("restcheck-stub-server: server failed: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
