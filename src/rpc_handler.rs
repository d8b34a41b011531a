//! RPC method handler for the acctpanel JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! session, the selection manager and the bulk dispatcher via the `App` struct.

use std::sync::{Mutex, MutexGuard};

use crate::app::App;
use crate::managers::selection_manager::{SelectionManager, SelectionManagerTrait};
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::sort_engine::{sort, SortEngineTrait};
use crate::types::account::Account;
use crate::types::folder::clamp_cooldown_hours;
use crate::types::selection::{SelectCriterion, SelectionSet};
use crate::types::sort::{SortColumn, SortDirection};

use serde_json::{json, Value};

fn lock(app: &Mutex<App>) -> Result<MutexGuard<'_, App>, String> {
    app.lock().map_err(|e| e.to_string())
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn criterion_param(params: &Value) -> Result<SelectCriterion, String> {
    let name = str_param(params, "criteria")?;
    let value = params.get("value").and_then(|v| v.as_str());
    SelectCriterion::parse(name, value).map_err(|e| e.to_string())
}

fn confirmed(params: &Value) -> bool {
    params.get("confirm").and_then(|v| v.as_bool()).unwrap_or(false)
}

fn account_json(a: &Account, selection: &SelectionSet) -> Value {
    json!({
        "account_id": a.account_id,
        "folder_id": a.folder_id,
        "login": a.login,
        "email": a.email,
        "geo": a.geo,
        "geo_label": a.geo_label(),
        "format": a.format,
        "uploaded_at": a.uploaded_at.to_rfc3339(),
        "time_since_upload": a.time_since_upload,
        "cooldown_completed": a.cooldown_completed,
        "selected": selection.contains(&a.account_id),
    })
}

fn selection_json(app: &App) -> Value {
    let visible = app.session.accounts().len();
    json!({
        "account_ids": app.session.selection().to_vec(),
        "count": app.session.selection().len(),
        "all_checked": crate::managers::selection_manager::all_checked(app.session.selection(), visible),
    })
}

fn state_json(app: &App) -> Value {
    let session = &app.session;
    json!({
        "folders": session.folders(),
        "active_folder_id": session.active_folder_id(),
        "account_count": session.accounts().len(),
        "ready_count": session.ready_count(),
        "selected_count": session.selection().len(),
        "sort": app.sort_engine.state(),
        "drafts": {
            "upload_text": session.drafts.upload_text,
            "folder_name": session.drafts.folder_name,
        },
        "busy": app.dispatcher.busy_flag().is_busy(),
    })
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Session ───
        "session.state" => {
            let a = lock(app)?;
            Ok(state_json(&a))
        }
        "session.load" => {
            let mut a = lock(app)?;
            a.startup().map_err(|e| e.to_string())?;
            Ok(state_json(&a))
        }
        "session.login" => {
            let username = str_param(params, "username")?;
            let password = str_param(params, "password")?;
            let mut a = lock(app)?;
            a.login(username, password).map_err(|e| e.to_string())?;
            Ok(state_json(&a))
        }
        "session.logout" => {
            let mut a = lock(app)?;
            a.session.logout();
            Ok(json!({"ok": true}))
        }

        // ─── Folders ───
        "folder.list" => {
            let a = lock(app)?;
            Ok(json!({
                "folders": a.session.folders(),
                "active_folder_id": a.session.active_folder_id(),
            }))
        }
        "folder.select" => {
            let folder_id = str_param(params, "folder_id")?;
            let mut a = lock(app)?;
            a.session.select_folder(folder_id).map_err(|e| e.to_string())?;
            Ok(json!({"active_folder_id": folder_id, "account_count": a.session.accounts().len()}))
        }
        "folder.create" => {
            let mut guard = lock(app)?;
            let a = &mut *guard;
            if let Some(name) = params.get("name").and_then(|v| v.as_str()) {
                a.session.drafts.folder_name = name.to_string();
            }
            let folder = a.dispatcher.create_folder(&mut a.session).map_err(|e| e.to_string())?;
            Ok(json!(folder))
        }
        "folder.delete" => {
            let folder_id = str_param(params, "folder_id")?;
            let confirm = confirmed(params);
            let mut guard = lock(app)?;
            let a = &mut *guard;
            a.dispatcher
                .delete_folder(&mut a.session, folder_id, &move |_: &str| confirm)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "active_folder_id": a.session.active_folder_id()}))
        }
        "folder.set_cooldown" => {
            let raw = params.get("hours").and_then(|v| v.as_i64()).ok_or("missing hours")?;
            let hours = clamp_cooldown_hours(raw);
            let mut guard = lock(app)?;
            let a = &mut *guard;
            a.dispatcher
                .set_cooldown(&mut a.session, i64::from(hours))
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true, "hours": hours, "ready_count": a.session.ready_count()}))
        }

        // ─── Accounts ───
        "account.list" => {
            let a = lock(app)?;
            let mut state = a.sort_engine.state();
            if let Some(column) = params.get("column").and_then(|v| v.as_str()) {
                state.column = Some(SortColumn::parse(column).map_err(|e| e.to_string())?);
            }
            if let Some(direction) = params.get("direction").and_then(|v| v.as_str()) {
                state.direction = SortDirection::parse_lenient(direction);
            }
            let selection = a.session.selection();
            let arr: Vec<Value> = sort(a.session.accounts(), state.column, state.direction)
                .into_iter()
                .map(|acc| account_json(acc, selection))
                .collect();
            Ok(json!(arr))
        }
        "account.sort" => {
            let column = SortColumn::parse(str_param(params, "column")?).map_err(|e| e.to_string())?;
            let mut a = lock(app)?;
            let state = a.sort_engine.toggle(column);
            Ok(json!(state))
        }
        "account.geos" => {
            let a = lock(app)?;
            Ok(json!(crate::managers::selection_manager::available_geos(a.session.accounts())))
        }
        "account.upload" => {
            let mut guard = lock(app)?;
            let a = &mut *guard;
            if let Some(text) = params.get("accounts_text").and_then(|v| v.as_str()) {
                a.session.drafts.upload_text = text.to_string();
            }
            let count = a.dispatcher.upload(&mut a.session).map_err(|e| e.to_string())?;
            Ok(json!({"count": count}))
        }
        "account.take" => {
            let mut guard = lock(app)?;
            let a = &mut *guard;
            let path = a.dispatcher.take(&mut a.session).map_err(|e| e.to_string())?;
            Ok(json!({"path": path.to_string_lossy()}))
        }
        "account.delete" => {
            let confirm = confirmed(params);
            let mut guard = lock(app)?;
            let a = &mut *guard;
            let count = a
                .dispatcher
                .delete(&mut a.session, &move |_: &str| confirm)
                .map_err(|e| e.to_string())?;
            Ok(json!({"count": count}))
        }
        "account.move" => {
            let folder_id = str_param(params, "folder_id")?;
            let mut guard = lock(app)?;
            let a = &mut *guard;
            let count = a
                .dispatcher
                .move_accounts(&mut a.session, folder_id)
                .map_err(|e| e.to_string())?;
            Ok(json!({"count": count}))
        }

        // ─── Selection ───
        "selection.get" => {
            let a = lock(app)?;
            Ok(selection_json(&a))
        }
        "selection.select" => {
            let criterion = criterion_param(params)?;
            let mut a = lock(app)?;
            SelectionManager::new(&mut a.session).select(&criterion);
            Ok(selection_json(&a))
        }
        "selection.select_remote" => {
            let criterion = criterion_param(params)?;
            let mut a = lock(app)?;
            SelectionManager::new(&mut a.session)
                .select_remote(&criterion)
                .map_err(|e| e.to_string())?;
            Ok(selection_json(&a))
        }
        "selection.toggle" => {
            let account_id = str_param(params, "account_id")?;
            let checked = params.get("checked").and_then(|v| v.as_bool()).unwrap_or(true);
            let mut a = lock(app)?;
            if !SelectionManager::new(&mut a.session).toggle(account_id, checked) {
                return Err(format!("account not in active folder: {}", account_id));
            }
            Ok(selection_json(&a))
        }
        "selection.toggle_all" => {
            let checked = params.get("checked").and_then(|v| v.as_bool()).ok_or("missing checked")?;
            let mut a = lock(app)?;
            SelectionManager::new(&mut a.session).toggle_all(checked);
            Ok(selection_json(&a))
        }
        "selection.clear" => {
            let mut a = lock(app)?;
            a.session.clear_selection();
            Ok(selection_json(&a))
        }

        // ─── Drafts ───
        "draft.set_upload" => {
            let text = str_param(params, "text")?;
            let mut a = lock(app)?;
            a.session.drafts.upload_text = text.to_string();
            Ok(json!({"ok": true}))
        }
        "draft.set_folder_name" => {
            let name = str_param(params, "name")?;
            let mut a = lock(app)?;
            a.session.drafts.folder_name = name.to_string();
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = lock(app)?;
            let settings = a.settings_engine.get_settings();
            let json_val = serde_json::to_value(settings).map_err(|e| e.to_string())?;
            Ok(json_val)
        }
        "settings.set" => {
            let key = str_param(params, "key")?;
            let value = params.get("value").cloned().ok_or("missing value")?;
            let mut a = lock(app)?;
            a.settings_engine.set_value(key, value).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
