use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Layout of an uploaded account line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountFormat {
    /// `email|email_password|login|account_password|geo`
    Geo,
    /// `email|email_password|login|account_password|client_id|key`
    ClientKey,
}

impl AccountFormat {
    /// Numeric code used by the remote API (`format_type`).
    pub fn code(self) -> u8 {
        match self {
            AccountFormat::Geo => 1,
            AccountFormat::ClientKey => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(AccountFormat::Geo),
            2 => Some(AccountFormat::ClientKey),
            _ => None,
        }
    }
}

/// An inventory entry as fetched from the backend.
///
/// `time_since_upload` and `cooldown_completed` are computed by the backend
/// on every fetch and are displayed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub folder_id: String,
    pub login: String,
    pub email: Option<String>,
    pub geo: Option<String>,
    pub format: AccountFormat,
    pub uploaded_at: DateTime<Utc>,
    pub time_since_upload: String,
    pub cooldown_completed: bool,
}

impl Account {
    /// Geo tag for display; absent tags render as `N/A`.
    pub fn geo_label(&self) -> &str {
        self.geo.as_deref().unwrap_or("N/A")
    }
}

/// One parsed upload line, secrets included. Wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct AccountLine {
    pub email: String,
    pub email_password: String,
    pub login: String,
    pub account_password: String,
    pub geo: Option<String>,
    pub client_id: Option<String>,
    pub key: Option<String>,
    #[zeroize(skip)]
    pub format: AccountFormat,
}

impl fmt::Debug for AccountLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountLine")
            .field("login", &self.login)
            .field("email", &self.email)
            .field("geo", &self.geo)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

impl AccountLine {
    /// Parses one pipe-separated line. Returns `None` for blank lines, lines
    /// with an unsupported field count, and lines with an empty login.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let parts: Vec<&str> = line.split('|').collect();
        let parsed = match parts.as_slice() {
            [email, email_password, login, account_password, geo] => AccountLine {
                email: email.to_string(),
                email_password: email_password.to_string(),
                login: login.to_string(),
                account_password: account_password.to_string(),
                geo: Some(geo.to_string()),
                client_id: None,
                key: None,
                format: AccountFormat::Geo,
            },
            [email, email_password, login, account_password, client_id, key] => AccountLine {
                email: email.to_string(),
                email_password: email_password.to_string(),
                login: login.to_string(),
                account_password: account_password.to_string(),
                geo: None,
                client_id: Some(client_id.to_string()),
                key: Some(key.to_string()),
                format: AccountFormat::ClientKey,
            },
            _ => return None,
        };
        if parsed.login.is_empty() {
            return None;
        }
        Some(parsed)
    }

    /// Parses a pasted batch, one account per line.
    ///
    /// Returns the accepted lines and the number of non-blank lines that
    /// were skipped.
    pub fn parse_batch(text: &str) -> (Vec<AccountLine>, usize) {
        let mut accepted = Vec::new();
        let mut skipped = 0;
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            match Self::parse(line) {
                Some(parsed) => accepted.push(parsed),
                None => skipped += 1,
            }
        }
        (accepted, skipped)
    }

    /// Renders the line back into its upload format.
    pub fn render(&self) -> String {
        match self.format {
            AccountFormat::Geo => format!(
                "{}|{}|{}|{}|{}",
                self.email,
                self.email_password,
                self.login,
                self.account_password,
                self.geo.as_deref().unwrap_or_default()
            ),
            AccountFormat::ClientKey => format!(
                "{}|{}|{}|{}|{}|{}",
                self.email,
                self.email_password,
                self.login,
                self.account_password,
                self.client_id.as_deref().unwrap_or_default(),
                self.key.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Formats an elapsed duration as `H:MM:SS`, or `N day(s), H:MM:SS` past a day.
/// Sub-second precision is dropped and negative spans read as zero.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let days = total / 86_400;
    let rem = total % 86_400;
    let clock = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}
