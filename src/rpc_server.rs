//! Linkshelf RPC Server: JSON-RPC over stdin/stdout for the view layer.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"bookmark.add", "params":{"url":"...","title":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//! Pushed changes that altered session state follow the response as
//! {"event":"bookmarks.changed", ...} or {"event":"profile.changed", ...}.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Instant;

use linkshelf::app::App;
use linkshelf::platform;
use linkshelf::rpc_handler::{change_notifications, handle_method};
use linkshelf::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

use serde_json::{json, Value};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Simple rate limiter: max requests per one-second window.
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
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn emit(out: &mut impl Write, value: &Value) -> io::Result<()> {
    writeln!(out, "{}", value)?;
    out.flush()
}

/// Drains pushed events into the session and renders notifications.
fn pending_notifications(app: &Mutex<App>) -> Vec<Value> {
    let Ok(mut a) = app.lock() else {
        return Vec::new();
    };
    let Ok(session) = a.session_mut() else {
        return Vec::new();
    };
    let summary = session.pump_events();
    change_notifications(session, &summary)
}

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .ok();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = SettingsEngine::new(None).load().unwrap_or_default();
    init_tracing(&settings.log_filter);

    let db_path = platform::get_database_path();
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    info!(db = %db_path.display(), "linkshelf rpc server starting");
    let app = Mutex::new(App::new(&db_path.to_string_lossy())?);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    emit(&mut out, &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}))?;

    let mut rate_limiter = RateLimiter::new(settings.rate_limit_per_second);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                emit(&mut out, &json!({"id": null, "error": format!("parse error: {}", e)}))?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            warn!("rate limit exceeded");
            emit(&mut out, &json!({"id": id, "error": "rate limit exceeded"}))?;
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        emit(&mut out, &response)?;

        for notification in pending_notifications(&app) {
            emit(&mut out, &notification)?;
        }
    }

    if let Ok(mut a) = app.lock() {
        a.shutdown();
    }
    info!("linkshelf rpc server stopped");
    Ok(())
}
