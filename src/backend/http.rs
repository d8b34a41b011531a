//! REST client for the remote inventory API.
//!
//! Uses a blocking `reqwest` client with bearer-token auth. Non-success
//! responses are mapped to [`BackendError::Status`] carrying the `detail`
//! field of the error body when there is one.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::Backend;
use crate::types::account::{Account, AccountFormat};
use crate::types::errors::BackendError;
use crate::types::export::ExportFile;
use crate::types::folder::{Folder, DEFAULT_COOLDOWN_HOURS};
use crate::types::selection::SelectCriterion;
use crate::types::settings::BackendSettings;

#[derive(Debug, Deserialize)]
struct FoldersResponse {
    folders: Vec<WireFolder>,
}

#[derive(Debug, Deserialize)]
struct FolderResponse {
    folder: WireFolder,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<WireAccount>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    count: usize,
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    account_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct WireFolder {
    folder_id: String,
    name: String,
    cooldown_hours: Option<u32>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireAccount {
    account_id: String,
    folder_id: String,
    login: String,
    email: Option<String>,
    geo: Option<String>,
    format_type: Option<u8>,
    uploaded_at: String,
    time_since_upload: Option<String>,
    cooldown_completed: Option<bool>,
}

impl WireFolder {
    fn into_folder(self) -> Result<Folder, BackendError> {
        let created_at = match self.created_at.as_deref() {
            Some(raw) => parse_timestamp(raw)?,
            None => DateTime::<Utc>::default(),
        };
        Ok(Folder {
            folder_id: self.folder_id,
            name: self.name,
            cooldown_hours: self.cooldown_hours.unwrap_or(DEFAULT_COOLDOWN_HOURS),
            created_at,
        })
    }
}

impl WireAccount {
    fn into_account(self) -> Result<Account, BackendError> {
        let format = self
            .format_type
            .and_then(AccountFormat::from_code)
            .unwrap_or(if self.geo.is_some() { AccountFormat::Geo } else { AccountFormat::ClientKey });
        Ok(Account {
            uploaded_at: parse_timestamp(&self.uploaded_at)?,
            account_id: self.account_id,
            folder_id: self.folder_id,
            login: self.login,
            email: self.email,
            geo: self.geo,
            format,
            time_since_upload: self.time_since_upload.unwrap_or_else(|| "0:00:00".to_string()),
            cooldown_completed: self.cooldown_completed.unwrap_or(false),
        })
    }
}

/// Parses an RFC 3339 timestamp, or a naive ISO timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BackendError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| BackendError::Decode(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Remote backend speaking the panel's JSON API.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_settings(settings: &BackendSettings) -> Result<Self, BackendError> {
        Self::new(
            &settings.base_url,
            settings.token.clone(),
            Duration::from_secs(settings.timeout_secs.max(1)),
        )
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Exchanges credentials for a bearer token and keeps it for later calls.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), BackendError> {
        let resp: LoginResponse = Self::send(
            self.request(Method::POST, "/api/login")
                .json(&json!({"username": username, "password": password})),
        )?;
        self.token = Some(resp.access_token);
        tracing::info!(username, "logged in");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, BackendError> {
        let resp = Self::check(builder.send()?)?;
        resp.json::<T>().map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn send_unit(builder: RequestBuilder) -> Result<(), BackendError> {
        Self::check(builder.send()?)?;
        Ok(())
    }

    fn check(resp: Response) -> Result<Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("detail").map(|d| d.as_str().map(str::to_string).unwrap_or_else(|| d.to_string())))
            .unwrap_or(body);
        tracing::warn!(status = status.as_u16(), %detail, "backend request failed");
        Err(BackendError::Status { status: status.as_u16(), detail })
    }

    /// Pulls the affected count out of messages like "Deleted 3 accounts".
    fn count_from_message(value: &Value) -> usize {
        value
            .get("message")
            .and_then(Value::as_str)
            .and_then(|m| m.split_whitespace().find_map(|w| w.parse::<usize>().ok()))
            .unwrap_or(0)
    }
}

impl Backend for HttpBackend {
    fn list_folders(&self) -> Result<Vec<Folder>, BackendError> {
        let resp: FoldersResponse = Self::send(self.request(Method::GET, "/api/folders"))?;
        resp.folders.into_iter().map(WireFolder::into_folder).collect()
    }

    fn list_accounts(&self, folder_id: &str) -> Result<Vec<Account>, BackendError> {
        let resp: AccountsResponse = Self::send(
            self.request(Method::GET, "/api/accounts")
                .query(&[("folder_id", folder_id)]),
        )?;
        resp.accounts.into_iter().map(WireAccount::into_account).collect()
    }

    fn create_folder(&self, name: &str) -> Result<Folder, BackendError> {
        let resp: FolderResponse = Self::send(
            self.request(Method::POST, "/api/folders").json(&json!({"name": name})),
        )?;
        resp.folder.into_folder()
    }

    fn delete_folder(&self, folder_id: &str) -> Result<(), BackendError> {
        Self::send_unit(self.request(Method::DELETE, &format!("/api/folders/{}", folder_id)))
    }

    fn set_cooldown(&self, folder_id: &str, hours: u32) -> Result<(), BackendError> {
        Self::send_unit(
            self.request(Method::POST, &format!("/api/folders/{}/cooldown", folder_id))
                .json(&json!({"hours": hours})),
        )
    }

    fn upload_accounts(&self, folder_id: Option<&str>, raw_text: &str) -> Result<usize, BackendError> {
        let resp: UploadResponse = Self::send(
            self.request(Method::POST, "/api/accounts")
                .json(&json!({"accounts_text": raw_text, "folder_id": folder_id})),
        )?;
        Ok(resp.count)
    }

    fn download_accounts(&self, account_ids: &[String]) -> Result<ExportFile, BackendError> {
        Self::send(
            self.request(Method::POST, "/api/accounts/download")
                .json(&json!({"account_ids": account_ids})),
        )
    }

    fn delete_accounts(&self, account_ids: &[String]) -> Result<usize, BackendError> {
        let resp: Value = Self::send(
            self.request(Method::POST, "/api/accounts/delete")
                .json(&json!({"account_ids": account_ids})),
        )?;
        Ok(Self::count_from_message(&resp))
    }

    fn move_accounts(&self, account_ids: &[String], target_folder_id: &str) -> Result<usize, BackendError> {
        let resp: Value = Self::send(
            self.request(Method::POST, "/api/accounts/move")
                .json(&json!({"account_ids": account_ids, "folder_id": target_folder_id})),
        )?;
        Ok(Self::count_from_message(&resp))
    }

    fn select_accounts(&self, folder_id: &str, criterion: &SelectCriterion) -> Result<Vec<String>, BackendError> {
        let resp: SelectResponse = Self::send(
            self.request(Method::POST, "/api/accounts/select").json(&json!({
                "criteria": criterion.name(),
                "value": criterion.value(),
                "folder_id": folder_id,
            })),
        )?;
        Ok(resp.account_ids)
    }
}
