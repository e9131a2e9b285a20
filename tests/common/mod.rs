// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use purse::application::WalletService;
use purse::credentials::Argon2Hasher;
use purse::domain::{Account, AccountId, Category, CategoryTag, Cents, TransactionKind};
use purse::storage::StoreConfig;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database.
/// Argon2 runs with minimal cost so registration stays fast.
pub async fn test_service() -> Result<(WalletService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let config = StoreConfig::new(temp_dir.path().join("test.db"));
    let service = WalletService::init(&config)
        .await?
        .with_hasher(Argon2Hasher::with_cost(8, 1, 1)?);
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Helper to parse a date and time into DateTime<Utc>
pub fn parse_datetime(date_str: &str, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

/// Register an account whose email and password derive from the username.
pub async fn register(service: &WalletService, username: &str) -> Result<Account> {
    Ok(service
        .register(
            username,
            &format!("{}@example.com", username),
            &format!("{}-password", username),
        )
        .await?)
}

/// Record a salary income now.
pub async fn deposit(service: &WalletService, account: AccountId, amount: Cents) -> Result<()> {
    service
        .record_transaction(
            account,
            amount,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Salary),
            None,
        )
        .await?;
    Ok(())
}

/// Test fixture: two funded accounts
pub struct Pair {
    pub alice: Account,
    pub bob: Account,
}

impl Pair {
    /// Alice and Bob, each starting with the given balance.
    pub async fn funded(service: &WalletService, alice_cents: Cents, bob_cents: Cents) -> Result<Self> {
        let alice = register(service, "alice").await?;
        let bob = register(service, "bob").await?;
        if alice_cents > 0 {
            deposit(service, alice.id, alice_cents).await?;
        }
        if bob_cents > 0 {
            deposit(service, bob.id, bob_cents).await?;
        }
        Ok(Self { alice, bob })
    }
}
