//! RPC method handler for the Linkshelf JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches a call to the dashboard session or the
//! services held by [`App`].

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::app::{App, Session};
use crate::managers::session_manager::PumpSummary;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::site_url;

fn str_param<'a>(params: &'a Value, name: &str) -> Option<&'a str> {
    params.get(name).and_then(|v| v.as_str())
}

fn bookmark_list(session: &Session) -> Result<Value, String> {
    let items = session.bookmarks().to_vec();
    let count = items.len();
    let items = serde_json::to_value(items).map_err(|e| e.to_string())?;
    Ok(json!({"items": items, "count": count}))
}

fn profile_view(session: &Session) -> Value {
    json!({
        "profile": session.profile(),
        "display": session.display(),
        "email": session.user().email,
    })
}

/// Change notifications for the state touched by a pump.
pub fn change_notifications(session: &Session, summary: &PumpSummary) -> Vec<Value> {
    let mut events = Vec::new();
    if summary.bookmarks_changed {
        let items = serde_json::to_value(session.bookmarks().to_vec()).unwrap_or(Value::Null);
        events.push(json!({"event": "bookmarks.changed", "items": items}));
    }
    if summary.profile_changed {
        events.push(json!({"event": "profile.changed", "profile": session.profile(), "display": session.display()}));
    }
    events
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with the user-facing message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    let mut a = app.lock().map_err(|e| e.to_string())?;

    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Auth ───
        "auth.sign_in" => {
            let email = str_param(params, "email").ok_or("missing email")?;
            let user = a.sign_in(email).map_err(|e| e.to_string())?;
            Ok(json!({"user": user}))
        }
        "auth.sign_out" => {
            a.sign_out().map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "auth.callback_url" => {
            let sources = a.url_sources().with_forwarded(
                str_param(params, "forwarded_host"),
                str_param(params, "forwarded_proto"),
            );
            Ok(json!({"url": site_url::auth_callback_url(&sources)}))
        }
        "auth.redirect" => {
            let sources = a.url_sources().with_forwarded(
                str_param(params, "forwarded_host"),
                str_param(params, "forwarded_proto"),
            );
            let exchanged = params.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
            let url = site_url::auth_redirect(&sources, str_param(params, "next"), exchanged);
            Ok(json!({"url": url}))
        }

        // ─── Session ───
        "session.whoami" => {
            let session = a.session().map_err(|e| e.to_string())?;
            Ok(json!({"user": session.user(), "display": session.display()}))
        }
        "session.refresh" => {
            let changed = a.refresh_session().map_err(|e| e.to_string())?;
            Ok(json!({"changed": changed}))
        }

        // ─── Bookmarks ───
        "bookmark.add" => {
            let title = str_param(params, "title").unwrap_or("");
            let url = str_param(params, "url").unwrap_or("");
            let session = a.session_mut().map_err(|e| e.to_string())?;
            let bookmark = session.add_bookmark(title, url).map_err(|e| e.to_string())?;
            serde_json::to_value(bookmark).map_err(|e| e.to_string())
        }
        "bookmark.list" => {
            let session = a.session().map_err(|e| e.to_string())?;
            bookmark_list(session)
        }
        "bookmark.delete" => {
            let id = str_param(params, "id").ok_or("missing id")?;
            let session = a.session_mut().map_err(|e| e.to_string())?;
            session.delete_bookmark(id).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Profile ───
        "profile.get" => {
            let session = a.session().map_err(|e| e.to_string())?;
            Ok(profile_view(session))
        }
        "profile.save" => {
            let full_name = str_param(params, "full_name").unwrap_or("");
            let avatar_url = str_param(params, "avatar_url").unwrap_or("");
            let session = a.session_mut().map_err(|e| e.to_string())?;
            session.save_profile(full_name, avatar_url).map_err(|e| e.to_string())?;
            Ok(profile_view(session))
        }

        // ─── Change events ───
        "events.pump" => {
            let session = a.session_mut().map_err(|e| e.to_string())?;
            let summary = session.pump_events();
            serde_json::to_value(summary).map_err(|e| e.to_string())
        }

        // ─── Settings ───
        "settings.get" => {
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }
        "settings.set" => {
            let key = str_param(params, "key").ok_or("missing key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
