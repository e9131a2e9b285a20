use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::credentials::{Argon2Hasher, CredentialHasher};
use crate::domain::{
    Account, AccountId, Category, Cents, IntegrityReport, LedgerEntry, MAX_AMOUNT_CENTS,
    MAX_REFERENCE_LEN, Party, Transaction, TransactionId, TransactionKind, TransferPair,
    build_integrity_report, category_choices, compute_all_balances, format_cents,
    normalize_email,
};
use crate::storage::{AccountInsert, DateRange, LedgerWrite, Repository, StoreConfig};

use super::WalletError;

/// Application service for the wallet ledger.
/// This is the primary interface for any client (CLI, HTTP handlers, tests).
///
/// Every operation takes the acting account explicitly; there is no notion
/// of a current user at this level.
#[derive(Clone)]
pub struct WalletService {
    repo: Repository,
    hasher: Arc<dyn CredentialHasher>,
}

/// Detailed account information
pub struct AccountInfo {
    pub account: Account,
    pub balance: Cents,
    pub income_count: i64,
    pub expense_count: i64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// Filter for querying an account's transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub range: DateRange,
    pub limit: Option<usize>,
}

/// Ids of the two halves written by a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    pub expense_id: TransactionId,
    pub income_id: TransactionId,
}

impl WalletService {
    /// Create a wallet service over an existing repository, hashing
    /// credentials with Argon2 defaults.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            hasher: Arc::new(Argon2Hasher::new()),
        }
    }

    /// Replace the credential hasher.
    pub fn with_hasher(mut self, hasher: impl CredentialHasher + 'static) -> Self {
        self.hasher = Arc::new(hasher);
        self
    }

    /// Initialize a new database (creating the file) and run migrations.
    pub async fn init(config: &StoreConfig) -> Result<Self, WalletError> {
        let repo = Repository::init(config).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(config: &StoreConfig) -> Result<Self, WalletError> {
        let repo = Repository::connect(config).await?;
        Ok(Self::new(repo))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Account operations
    // ========================

    /// Register a new account. The password is only ever stored hashed.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, WalletError> {
        let username = username.trim();
        let email = normalize_email(email);

        if username.is_empty() {
            return Err(WalletError::InvalidInput("username is required".to_string()));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(WalletError::InvalidInput(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
        if password.trim().is_empty() {
            return Err(WalletError::InvalidInput("password is required".to_string()));
        }

        if self.repo.get_account_by_username(username).await?.is_some() {
            tracing::warn!(username, "Registration rejected: username taken");
            return Err(WalletError::AccountAlreadyExists("username"));
        }
        if self.repo.get_account_by_email(&email).await?.is_some() {
            tracing::warn!(username, "Registration rejected: email taken");
            return Err(WalletError::AccountAlreadyExists("email"));
        }

        let password_hash = self.hasher.hash(password)?;
        let account = Account::new(username.to_string(), email, password_hash);

        // A concurrent registration can still win between the check and the insert.
        if self.repo.insert_account(&account).await? == AccountInsert::Duplicate {
            tracing::warn!(username, "Registration rejected: duplicate account");
            return Err(WalletError::AccountAlreadyExists("username or email"));
        }

        tracing::info!(account_id = %account.id, username, "Registered account");
        Ok(account)
    }

    /// Check an email and password pair. Unknown emails and wrong passwords
    /// produce the same error.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, WalletError> {
        let email = normalize_email(email);
        let account = self.repo.get_account_by_email(&email).await?;

        match account {
            Some(account) if self.hasher.verify(password, &account.password_hash) => {
                tracing::info!(account_id = %account.id, "Authenticated");
                Ok(account)
            }
            _ => {
                tracing::warn!("Authentication failed");
                Err(WalletError::InvalidCredentials)
            }
        }
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Account, WalletError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or_else(|| WalletError::account_not_found(id))
    }

    /// Get an account by username.
    pub async fn find_account_by_username(&self, username: &str) -> Result<Account, WalletError> {
        self.repo
            .get_account_by_username(username.trim())
            .await?
            .ok_or_else(|| WalletError::AccountNotFound(username.to_string()))
    }

    /// Resolve a transfer receiver by username.
    pub async fn find_receiver(&self, username: &str) -> Result<Account, WalletError> {
        match self.find_account_by_username(username).await {
            Err(WalletError::AccountNotFound(name)) => {
                tracing::warn!(receiver = %name, "Transfer rejected: unknown receiver");
                Err(WalletError::ReceiverNotFound(name))
            }
            other => other,
        }
    }

    /// Every account other than `account_id`: the possible transfer receivers.
    pub async fn list_counterparties(&self, account_id: AccountId) -> Result<Vec<Account>, WalletError> {
        Ok(self.repo.list_accounts_except(account_id).await?)
    }

    /// Get detailed account information.
    pub async fn account_info(&self, id: AccountId) -> Result<AccountInfo, WalletError> {
        let account = self.get_account(id).await?;
        let balance = self.repo.compute_balance(id).await?;
        let (income_count, expense_count) = self.repo.count_transactions_for_account(id).await?;
        let last_activity = self.repo.get_last_activity(id).await?;

        Ok(AccountInfo {
            account,
            balance,
            income_count,
            expense_count,
            last_activity,
        })
    }

    /// Delete an account and, by cascade, every transaction it owns.
    /// Transfer counterparts on other accounts are left in place and their
    /// links read back as dangling.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), WalletError> {
        if !self.repo.delete_account(id).await? {
            return Err(WalletError::account_not_found(id));
        }
        tracing::info!(account_id = %id, "Deleted account");
        Ok(())
    }

    // ========================
    // Ledger operations
    // ========================

    /// Current balance of an account, derived from its transactions.
    pub async fn balance(&self, account_id: AccountId) -> Result<Cents, WalletError> {
        self.get_account(account_id).await?;
        Ok(self.repo.compute_balance(account_id).await?)
    }

    /// Record an income or expense happening now.
    pub async fn record_transaction(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
        kind: TransactionKind,
        category: Category,
        reference: Option<String>,
    ) -> Result<TransactionId, WalletError> {
        self.record_transaction_at(account_id, amount_cents, kind, category, reference, Utc::now())
            .await
    }

    /// Record an income or expense with an explicit occurrence time.
    ///
    /// An expense is checked against the balance read inside the same write
    /// unit, so no concurrent write can slip between the check and the insert.
    pub async fn record_transaction_at(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
        kind: TransactionKind,
        category: Category,
        reference: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<TransactionId, WalletError> {
        if let Err(e) = check_amount(amount_cents) {
            tracing::warn!(%account_id, amount_cents, "Transaction rejected: invalid amount");
            return Err(e);
        }
        let reference = clean_text(reference.as_deref())?;

        let category = category.normalized();
        if let Err(e) = category.validate_for(kind) {
            tracing::warn!(%account_id, error = %e, "Transaction rejected: invalid category");
            return Err(e.into());
        }

        let mut unit = self.repo.begin_write(1).await?;

        if unit.get_account(account_id).await?.is_none() {
            return abort(unit, WalletError::account_not_found(account_id)).await;
        }

        let balance = unit.compute_balance(account_id).await?;
        tracing::debug!(%account_id, balance, "Balance read before write");

        if kind == TransactionKind::Income && balance.checked_add(amount_cents).is_none() {
            tracing::warn!(%account_id, balance, amount_cents, "Income rejected: balance overflow");
            return abort(
                unit,
                WalletError::InvalidAmount("Balance would exceed the supported range".to_string()),
            )
            .await;
        }

        if kind == TransactionKind::Expense && balance < amount_cents {
            tracing::warn!(
                %account_id,
                balance,
                amount_cents,
                "Expense rejected: insufficient funds"
            );
            return abort(
                unit,
                WalletError::InsufficientFunds {
                    balance,
                    required: amount_cents,
                },
            )
            .await;
        }

        let mut transaction = Transaction::new(account_id, amount_cents, kind, category, timestamp)
            .with_reference(reference);

        unit.insert_transaction(&mut transaction).await?;
        unit.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            %account_id,
            kind = %kind,
            amount = %format_cents(amount_cents),
            category = %transaction.category,
            "Recorded transaction"
        );
        Ok(transaction.id)
    }

    /// Move money from one account to another, happening now.
    pub async fn record_transfer(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount_cents: Cents,
        note: Option<&str>,
    ) -> Result<TransferReceipt, WalletError> {
        self.record_transfer_at(sender_id, receiver_id, amount_cents, note, Utc::now())
            .await
    }

    /// Move money between two accounts with an explicit occurrence time.
    ///
    /// Both halves are built cross-linked in memory, inserted in the same
    /// write unit and committed once: either both rows become visible or
    /// neither does.
    pub async fn record_transfer_at(
        &self,
        sender_id: AccountId,
        receiver_id: AccountId,
        amount_cents: Cents,
        note: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Result<TransferReceipt, WalletError> {
        if sender_id == receiver_id {
            tracing::warn!(%sender_id, "Transfer rejected: self transfer");
            return Err(WalletError::SelfTransfer);
        }
        if let Err(e) = check_amount(amount_cents) {
            tracing::warn!(%sender_id, amount_cents, "Transfer rejected: invalid amount");
            return Err(e);
        }
        let note = clean_text(note)?;

        let mut unit = self.repo.begin_write(2).await?;

        let Some(sender) = unit.get_account(sender_id).await? else {
            return abort(unit, WalletError::account_not_found(sender_id)).await;
        };
        let Some(receiver) = unit.get_account(receiver_id).await? else {
            tracing::warn!(%sender_id, %receiver_id, "Transfer rejected: unknown receiver");
            return abort(unit, WalletError::ReceiverNotFound(receiver_id.to_string())).await;
        };

        let balance = unit.compute_balance(sender_id).await?;
        tracing::debug!(%sender_id, balance, "Balance read for transfer");
        if balance < amount_cents {
            tracing::warn!(
                %sender_id,
                %receiver_id,
                balance,
                amount_cents,
                "Transfer rejected: insufficient funds"
            );
            return abort(
                unit,
                WalletError::InsufficientFunds {
                    balance,
                    required: amount_cents,
                },
            )
            .await;
        }

        let receiver_balance = unit.compute_balance(receiver_id).await?;
        if receiver_balance.checked_add(amount_cents).is_none() {
            tracing::warn!(%receiver_id, receiver_balance, amount_cents, "Transfer rejected: balance overflow");
            return abort(
                unit,
                WalletError::InvalidAmount("Balance would exceed the supported range".to_string()),
            )
            .await;
        }

        let TransferPair {
            mut expense,
            mut income,
        } = TransferPair::new(
            Party {
                id: sender.id,
                username: &sender.username,
            },
            Party {
                id: receiver.id,
                username: &receiver.username,
            },
            amount_cents,
            note.as_deref(),
            timestamp,
        );

        unit.insert_transaction(&mut expense).await?;
        unit.insert_transaction(&mut income).await?;
        unit.commit().await?;

        tracing::info!(
            expense_id = %expense.id,
            income_id = %income.id,
            from = %sender.username,
            to = %receiver.username,
            amount = %format_cents(amount_cents),
            "Recorded transfer"
        );

        Ok(TransferReceipt {
            expense_id: expense.id,
            income_id: income.id,
        })
    }

    /// Get one of the account's transactions with its transfer link resolved.
    pub async fn get_transaction(
        &self,
        account_id: AccountId,
        transaction_id: TransactionId,
    ) -> Result<LedgerEntry, WalletError> {
        self.repo
            .get_transaction(transaction_id)
            .await?
            .filter(|entry| entry.transaction.account_id == account_id)
            .ok_or(WalletError::TransactionNotFound(transaction_id))
    }

    /// An account's transactions, newest first.
    pub async fn transaction_history(
        &self,
        account_id: AccountId,
        filter: TransactionFilter,
    ) -> Result<Vec<LedgerEntry>, WalletError> {
        self.get_account(account_id).await?;
        Ok(self
            .repo
            .list_transactions_filtered(
                account_id,
                filter.kind,
                filter.category.as_deref(),
                filter.range,
                filter.limit,
            )
            .await?)
    }

    /// Category labels offered for a kind, "Others" last.
    pub fn categories_for(&self, kind: TransactionKind) -> Vec<&'static str> {
        category_choices(kind)
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check ledger integrity and return a report.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, WalletError> {
        let stats = self.repo.get_integrity_stats().await?;
        let halves = self.repo.list_transfer_halves().await?;
        let stored = self.repo.compute_all_balances().await?;
        let transactions = self.repo.list_all_transactions().await?;
        let recomputed = compute_all_balances(&transactions);

        let report = build_integrity_report(&stats, &halves, &stored, &recomputed);
        if !report.is_healthy() {
            tracing::warn!(issues = report.issues.len(), "Ledger integrity issues found");
        }
        Ok(report)
    }
}

/// Roll back a write unit and surface the rejection.
async fn abort<T>(unit: LedgerWrite, err: WalletError) -> Result<T, WalletError> {
    unit.rollback().await?;
    Err(err)
}

fn check_amount(amount_cents: Cents) -> Result<(), WalletError> {
    if amount_cents <= 0 {
        return Err(WalletError::InvalidAmount("Amount must be positive".to_string()));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(WalletError::InvalidAmount(format!(
            "Amount must not exceed {}",
            format_cents(MAX_AMOUNT_CENTS)
        )));
    }
    Ok(())
}

/// Trim free text, dropping it when blank and rejecting it when too long.
fn clean_text(text: Option<&str>) -> Result<Option<String>, WalletError> {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    let len = text.chars().count();
    if len > MAX_REFERENCE_LEN {
        return Err(WalletError::InvalidInput(format!(
            "reference is {} characters long, at most {} are allowed",
            len, MAX_REFERENCE_LEN
        )));
    }
    Ok(Some(text.to_string()))
}
