use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub type AccountId = Uuid;

/// A registered user of the wallet. The balance is never stored here;
/// it is always derived from the account's transactions.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    /// Opaque digest produced by the credential hasher
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// Emails are matched case-insensitively, so they are stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
