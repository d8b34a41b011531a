//! acctpanel RPC Server: JSON-RPC over stdin/stdout for UI shell integration.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"selection.select", "params":{"criteria":"geo","value":"RU"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr; stdout carries protocol traffic only.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Instant;

use acctpanel::app::App;
use acctpanel::rpc_handler::handle_method;
use acctpanel::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn send(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

fn main() {
    let mut settings_engine = SettingsEngine::new(std::env::args().nth(1));
    let load_result = settings_engine.load();
    init_logging(&settings_engine.get_settings().logging.filter);
    if let Err(e) = load_result {
        tracing::warn!(error = %e, path = settings_engine.get_config_path(), "using default settings");
    }

    let app = match App::from_settings_engine(settings_engine) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize acctpanel");
            std::process::exit(1);
        }
    };
    let app = Mutex::new(app);

    // An unreachable backend is not fatal: the shell can retry with session.load.
    if let Ok(mut a) = app.lock() {
        if let Err(e) = a.startup() {
            tracing::warn!(error = %e, "initial session load failed");
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let ready = json!({"event":"ready","version":env!("CARGO_PKG_VERSION")});
    if send(&mut out, &ready).is_err() {
        return;
    }

    let mut rate_limiter = RateLimiter::new(200);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() { continue; }

        let response = match serde_json::from_str::<Value>(&line) {
            Err(e) => json!({"id":null,"error":format!("parse error: {}",e)}),
            Ok(req) => {
                let id = req.get("id").cloned().unwrap_or(Value::Null);
                if !rate_limiter.check() {
                    json!({"id": id, "error": "rate limit exceeded"})
                } else {
                    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
                    let params = req.get("params").cloned().unwrap_or(json!({}));
                    tracing::debug!(method, "rpc request");
                    match handle_method(&app, method, &params) {
                        Ok(val) => json!({"id": id, "result": val}),
                        Err(err) => json!({"id": id, "error": err}),
                    }
                }
            }
        };
        if send(&mut out, &response).is_err() {
            break;
        }
    }

    let guard = app.lock();
    if let Ok(mut a) = guard {
        a.shutdown();
    }
}
