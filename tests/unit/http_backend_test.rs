//! Unit tests for `HttpBackend` against a minimal in-process HTTP server.
//!
//! The server answers each connection with one canned response and records the
//! request so tests can assert on method, path, headers and JSON body.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use acctpanel::backend::{Backend, HttpBackend};
use acctpanel::types::errors::BackendError;
use acctpanel::types::selection::SelectCriterion;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

struct Recorded {
    request_line: String,
    headers: Vec<String>,
    body: String,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_ascii_lowercase());
        self.headers
            .iter()
            .find(|h| h.to_ascii_lowercase().starts_with(&prefix))
            .map(|h| h[prefix.len()..].trim().to_string())
    }

    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serves `responses` in order, one per connection. Returns the base URL and
/// a channel of recorded requests.
fn serve(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<Recorded>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, body) in responses {
            let (stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut headers = Vec::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                headers.push(line);
            }
            let mut buf = vec![0u8; content_length];
            reader.read_exact(&mut buf).unwrap();

            let reason = if status < 400 { "OK" } else { "Error" };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            let _ = tx.send(Recorded {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(buf).unwrap(),
            });
        }
    });

    (base, rx)
}

fn backend(base: &str) -> HttpBackend {
    HttpBackend::new(base, Some("tok-123".into()), Duration::from_secs(5)).unwrap()
}

fn next(rx: &mpsc::Receiver<Recorded>) -> Recorded {
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}

#[test]
fn test_list_folders_parses_wire_format() {
    let body = json!({"folders": [
        {"folder_id": "f1", "name": "Main", "cooldown_hours": 4, "created_at": "2024-05-01T10:00:00.000000"},
        {"folder_id": "f2", "name": "Work"}
    ]});
    let (base, rx) = serve(vec![(200, body.to_string())]);

    let folders = backend(&base).list_folders().unwrap();
    assert_eq!(folders.len(), 2);
    assert!(folders[0].is_main());
    assert_eq!(folders[0].cooldown_hours, 4);
    assert_eq!(folders[0].created_at, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    assert_eq!(folders[1].cooldown_hours, 1);

    let req = next(&rx);
    assert_eq!(req.request_line, "GET /api/folders HTTP/1.1");
    assert_eq!(req.header("authorization").as_deref(), Some("Bearer tok-123"));
}

#[test]
fn test_list_accounts_sends_folder_query() {
    let body = json!({"accounts": [{
        "account_id": "a1", "folder_id": "f1", "login": "alice", "email": "a@x",
        "geo": "RU", "format_type": 1, "uploaded_at": "2024-05-01 08:00:00",
        "time_since_upload": "2:00:00", "cooldown_completed": true
    }, {
        "account_id": "a2", "folder_id": "f1", "login": "bob",
        "uploaded_at": "2024-05-01T09:00:00Z"
    }]});
    let (base, rx) = serve(vec![(200, body.to_string())]);

    let accounts = backend(&base).list_accounts("f1").unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].geo.as_deref(), Some("RU"));
    assert!(accounts[0].cooldown_completed);
    assert_eq!(accounts[0].time_since_upload, "2:00:00");
    assert_eq!(accounts[1].geo, None);
    assert!(!accounts[1].cooldown_completed);

    let req = next(&rx);
    assert_eq!(req.request_line, "GET /api/accounts?folder_id=f1 HTTP/1.1");
}

#[test]
fn test_upload_posts_text_and_folder() {
    let (base, rx) = serve(vec![(200, json!({"message": "ok", "count": 2}).to_string())]);

    let count = backend(&base).upload_accounts(Some("f1"), "a|b|c|d|RU").unwrap();
    assert_eq!(count, 2);

    let req = next(&rx);
    assert_eq!(req.request_line, "POST /api/accounts HTTP/1.1");
    assert_eq!(req.json(), json!({"accounts_text": "a|b|c|d|RU", "folder_id": "f1"}));
}

#[test]
fn test_delete_and_move_read_counts_from_message() {
    let (base, rx) = serve(vec![
        (200, json!({"message": "Deleted 3 accounts"}).to_string()),
        (200, json!({"message": "Moved 2 accounts"}).to_string()),
    ]);
    let b = backend(&base);
    let ids = vec!["a1".to_string(), "a2".to_string()];

    assert_eq!(b.delete_accounts(&ids).unwrap(), 3);
    let req = next(&rx);
    assert_eq!(req.request_line, "POST /api/accounts/delete HTTP/1.1");
    assert_eq!(req.json(), json!({"account_ids": ["a1", "a2"]}));

    assert_eq!(b.move_accounts(&ids, "f2").unwrap(), 2);
    let req = next(&rx);
    assert_eq!(req.json(), json!({"account_ids": ["a1", "a2"], "folder_id": "f2"}));
}

#[test]
fn test_download_returns_export_file() {
    let body = json!({"content": "a|b|c|d|RU", "filename": "accounts_20240501_100000.txt"});
    let (base, _rx) = serve(vec![(200, body.to_string())]);

    let export = backend(&base).download_accounts(&["a1".to_string()]).unwrap();
    assert_eq!(export.content, "a|b|c|d|RU");
    assert_eq!(export.filename, "accounts_20240501_100000.txt");
}

#[test]
fn test_select_sends_criterion() {
    let (base, rx) = serve(vec![(200, json!({"account_ids": ["a1"]}).to_string())]);

    let ids = backend(&base)
        .select_accounts("f1", &SelectCriterion::Geo("RU".into()))
        .unwrap();
    assert_eq!(ids, vec!["a1"]);
    assert_eq!(
        next(&rx).json(),
        json!({"criteria": "geo", "value": "RU", "folder_id": "f1"})
    );
}

#[test]
fn test_folder_endpoints() {
    let (base, rx) = serve(vec![
        (200, json!({"folder": {"folder_id": "f9", "name": "Work", "cooldown_hours": 1}}).to_string()),
        (200, json!({"message": "ok"}).to_string()),
        (200, json!({"message": "ok"}).to_string()),
    ]);
    let b = backend(&base);

    let folder = b.create_folder("Work").unwrap();
    assert_eq!(folder.folder_id, "f9");
    assert_eq!(next(&rx).json(), json!({"name": "Work"}));

    b.set_cooldown("f9", 12).unwrap();
    let req = next(&rx);
    assert_eq!(req.request_line, "POST /api/folders/f9/cooldown HTTP/1.1");
    assert_eq!(req.json(), json!({"hours": 12}));

    b.delete_folder("f9").unwrap();
    assert_eq!(next(&rx).request_line, "DELETE /api/folders/f9 HTTP/1.1");
}

#[test]
fn test_error_detail_is_surfaced() {
    let (base, _rx) = serve(vec![
        (404, json!({"detail": "Folder not found"}).to_string()),
        (500, "upstream exploded".to_string()),
    ]);
    let b = backend(&base);

    match b.list_accounts("nope") {
        Err(BackendError::Status { status, detail }) => {
            assert_eq!(status, 404);
            assert_eq!(detail, "Folder not found");
        }
        other => panic!("unexpected result: {:?}", other.map(|a| a.len())),
    }
    match b.list_folders() {
        Err(BackendError::Status { status, detail }) => {
            assert_eq!(status, 500);
            assert_eq!(detail, "upstream exploded");
        }
        other => panic!("unexpected result: {:?}", other.map(|f| f.len())),
    }
}

#[test]
fn test_malformed_body_is_decode_error() {
    let (base, _rx) = serve(vec![(200, json!({"unexpected": true}).to_string())]);
    assert!(matches!(backend(&base).list_folders(), Err(BackendError::Decode(_))));
}

#[test]
fn test_unreachable_backend_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    assert!(matches!(backend(&base).list_folders(), Err(BackendError::Network(_))));
}

#[test]
fn test_login_stores_bearer_token() {
    let (base, rx) = serve(vec![
        (200, json!({"access_token": "fresh", "token_type": "bearer"}).to_string()),
        (200, json!({"folders": []}).to_string()),
    ]);
    let mut b = HttpBackend::new(&base, None, Duration::from_secs(5)).unwrap();
    assert!(b.token().is_none());

    b.login("admin", "hunter2").unwrap();
    assert_eq!(b.token(), Some("fresh"));
    let req = next(&rx);
    assert_eq!(req.json(), json!({"username": "admin", "password": "hunter2"}));
    assert!(req.header("authorization").is_none());

    b.list_folders().unwrap();
    assert_eq!(next(&rx).header("authorization").as_deref(), Some("Bearer fresh"));
}

// ─── Login through the RPC surface ───

fn http_app(base: &str, dir: &tempfile::TempDir) -> std::sync::Mutex<acctpanel::app::App> {
    use acctpanel::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

    let mut engine = SettingsEngine::new(Some(dir.path().join("settings.json").to_string_lossy().to_string()));
    engine.set_value("backend.base_url", json!(base)).unwrap();
    engine
        .set_value("export.directory", json!(dir.path().join("exports").to_string_lossy()))
        .unwrap();
    std::sync::Mutex::new(acctpanel::app::App::from_settings_engine(engine).unwrap())
}

#[test]
fn test_session_login_loads_session_with_token() {
    use acctpanel::rpc_handler::handle_method;

    let (base, rx) = serve(vec![
        (200, json!({"access_token": "fresh"}).to_string()),
        (200, json!({"folders": [{"folder_id": "m", "name": "Main", "cooldown_hours": 1}]}).to_string()),
        (200, json!({"accounts": []}).to_string()),
    ]);
    let dir = tempfile::TempDir::new().unwrap();
    let app = http_app(&base, &dir);

    let state = handle_method(&app, "session.login", &json!({"username": "admin", "password": "pw"})).unwrap();
    assert_eq!(state["active_folder_id"], "m");

    assert_eq!(next(&rx).request_line, "POST /api/login HTTP/1.1");
    let folders = next(&rx);
    assert_eq!(folders.request_line, "GET /api/folders HTTP/1.1");
    assert_eq!(folders.header("authorization").as_deref(), Some("Bearer fresh"));
    assert_eq!(next(&rx).header("authorization").as_deref(), Some("Bearer fresh"));

    let settings = handle_method(&app, "settings.get", &json!({})).unwrap();
    assert_eq!(settings["backend"]["token"], "fresh");
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join("settings.json")).unwrap()).unwrap();
    assert_eq!(saved["backend"]["token"], "fresh");
}

#[test]
fn test_failed_session_login_keeps_settings() {
    use acctpanel::rpc_handler::handle_method;

    let (base, _rx) = serve(vec![(401, json!({"detail": "Incorrect username or password"}).to_string())]);
    let dir = tempfile::TempDir::new().unwrap();
    let app = http_app(&base, &dir);

    let err = handle_method(&app, "session.login", &json!({"username": "admin", "password": "bad"})).unwrap_err();
    assert_eq!(err, "Backend returned 401: Incorrect username or password");
    let settings = handle_method(&app, "settings.get", &json!({})).unwrap();
    assert_eq!(settings["backend"]["token"], Value::Null);
}
