use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, Category, CategoryTag, Cents, IntegrityStats, LedgerEntry, LinkSide,
    Transaction, TransactionId, TransactionKind, TransferHalf, TransferLink,
};

use super::{MIGRATION_001_INITIAL, StoreConfig};

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, created_at";

/// Transaction columns joined with the existence of their transfer counterpart.
const ENTRY_SELECT: &str = r#"
    SELECT t.id, t.sequence, t.account_id, t.amount_cents, t.kind, t.category, t.timestamp,
           t.recorded_at, t.reference, t.linked_transaction_id,
           (l.id IS NOT NULL) AS link_present
    FROM transactions t
    LEFT JOIN transactions l ON l.id = t.linked_transaction_id
"#;

/// Half-open time window `[from, to)` over transaction timestamps.
/// A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Append the window conditions for `column` and collect their bindings.
    fn push_conditions(&self, sql: &mut String, column: &str, binds: &mut Vec<String>) {
        if let Some(from) = self.from {
            sql.push_str(&format!(" AND {} >= ?", column));
            binds.push(encode_timestamp(from));
        }
        if let Some(to) = self.to {
            sql.push_str(&format!(" AND {} < ?", column));
            binds.push(encode_timestamp(to));
        }
    }
}

/// Expense total for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAggregate {
    pub category: String,
    pub count: i64,
    pub total: Cents,
}

/// Outcome of inserting an account when username or email may be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountInsert {
    Inserted,
    Duplicate,
}

/// Repository for persisting and querying accounts and transactions.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the SQLite database described by `config`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to database {}",
                    config.database_path.display()
                )
            })?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a database (connect, creating the file, then migrate).
    pub async fn init(config: &StoreConfig) -> Result<Self> {
        let config = config.clone().with_create_if_missing(true);
        let repo = Self::connect(&config).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Insert a new account. Username and email uniqueness is enforced by
    /// the schema; a collision is reported as `Duplicate`.
    pub async fn insert_account(&self, account: &Account) -> Result<AccountInsert> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(encode_timestamp(account.created_at))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(AccountInsert::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(AccountInsert::Duplicate)
            }
            Err(e) => Err(e).context("Failed to save account"),
        }
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&self.pool, id).await
    }

    /// Get an account by email (case-insensitive).
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE email = ? COLLATE NOCASE",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by email")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// Get an account by username.
    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE username = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by username")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// List every account except `excluded`, ordered by username.
    pub async fn list_accounts_except(&self, excluded: AccountId) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE id != ? ORDER BY username",
            ACCOUNT_COLUMNS
        ))
        .bind(excluded.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(row_to_account).collect()
    }

    /// Delete an account. Its transactions go with it through the foreign
    /// key cascade. Returns false when the account did not exist.
    pub async fn delete_account(&self, id: AccountId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Ledger writes
    // ========================

    /// Open an atomic ledger write that will insert `rows` transactions.
    ///
    /// The first statement reserves the sequence numbers, which takes the
    /// SQLite writer lock before anything is read. Balance checks made
    /// through the returned unit therefore cannot race another writer.
    pub async fn begin_write(&self, rows: i64) -> Result<LedgerWrite> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin ledger write")?;

        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + ?
            WHERE name = 'transaction_sequence'
            RETURNING value
            "#,
        )
        .bind(rows)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to reserve sequence numbers")?;

        let last_sequence: i64 = row.get("value");
        Ok(LedgerWrite {
            tx,
            next_sequence: last_sequence - rows + 1,
            last_sequence,
        })
    }

    // ========================
    // Ledger reads
    // ========================

    /// Compute the balance for an account using SQL aggregation.
    pub async fn compute_balance(&self, account_id: AccountId) -> Result<Cents> {
        fetch_balance(&self.pool, account_id).await
    }

    /// Compute balances for all accounts in a single query.
    /// Accounts with no transactions won't be in the map (balance = 0).
    pub async fn compute_all_balances(&self) -> Result<HashMap<AccountId, Cents>> {
        let rows = sqlx::query(
            r#"
            SELECT
                account_id,
                SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE -amount_cents END) AS balance
            FROM transactions
            GROUP BY account_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to compute all balances")?;

        let mut balances = HashMap::new();
        for row in rows {
            let account_id = parse_uuid(row.get("account_id"), "account ID")?;
            balances.insert(account_id, row.get::<Cents, _>("balance"));
        }

        Ok(balances)
    }

    /// Get a transaction by ID with its transfer link resolved.
    pub async fn get_transaction(&self, id: TransactionId) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(&format!("{} WHERE t.id = ?", ENTRY_SELECT))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch transaction")?;

        row.as_ref().map(row_to_entry).transpose()
    }

    /// List every transaction in the ledger, ordered by sequence number.
    pub async fn list_all_transactions(&self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!("{} ORDER BY t.sequence", ENTRY_SELECT))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter()
            .map(|row| row_to_entry(row).map(|entry| entry.transaction))
            .collect()
    }

    /// List an account's transactions, newest first, with optional filters.
    pub async fn list_transactions_filtered(
        &self,
        account_id: AccountId,
        kind: Option<TransactionKind>,
        category: Option<&str>,
        range: DateRange,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>> {
        let mut query = format!("{} WHERE t.account_id = ?", ENTRY_SELECT);
        let mut binds = vec![account_id.to_string()];

        if let Some(kind) = kind {
            query.push_str(" AND t.kind = ?");
            binds.push(kind.as_str().to_string());
        }
        if let Some(category) = category {
            query.push_str(" AND t.category = ?");
            binds.push(category.to_string());
        }
        range.push_conditions(&mut query, "t.timestamp", &mut binds);

        query.push_str(" ORDER BY t.timestamp DESC, t.sequence DESC");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query);
        for value in &binds {
            sql_query = sql_query.bind(value.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list filtered transactions")?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Count an account's transactions (income and expense separately).
    pub async fn count_transactions_for_account(&self, account_id: AccountId) -> Result<(i64, i64)> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN 1 ELSE 0 END), 0) AS income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN 1 ELSE 0 END), 0) AS expense
            FROM transactions
            WHERE account_id = ?
            "#,
        )
        .bind(account_id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to count transactions")?;

        Ok((row.get("income"), row.get("expense")))
    }

    /// Get the most recent transaction timestamp for an account.
    pub async fn get_last_activity(&self, account_id: AccountId) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT MAX(timestamp) AS last_activity FROM transactions WHERE account_id = ?",
        )
        .bind(account_id.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to get last activity")?;

        let last_activity: Option<String> = row.get("last_activity");
        last_activity
            .map(|s| parse_timestamp(&s, "last activity"))
            .transpose()
    }

    // ========================
    // Aggregates for reporting
    // ========================

    /// Income and expense totals for an account within a window.
    pub async fn sum_by_kind(&self, account_id: AccountId, range: DateRange) -> Result<(Cents, Cents)> {
        let mut query = String::from(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE 0 END), 0) AS income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount_cents ELSE 0 END), 0) AS expense
            FROM transactions
            WHERE account_id = ?
            "#,
        );
        let mut binds = vec![account_id.to_string()];
        range.push_conditions(&mut query, "timestamp", &mut binds);

        let mut sql_query = sqlx::query(&query);
        for value in &binds {
            sql_query = sql_query.bind(value.as_str());
        }

        let row = sql_query
            .fetch_one(&self.pool)
            .await
            .context("Failed to sum transactions by kind")?;

        Ok((row.get("income"), row.get("expense")))
    }

    /// Expense totals grouped by category, largest first.
    pub async fn sum_expense_by_category(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<Vec<CategoryAggregate>> {
        let mut query = String::from(
            "SELECT category, COUNT(*) AS count, SUM(amount_cents) AS total \
             FROM transactions WHERE account_id = ? AND kind = 'expense'",
        );
        let mut binds = vec![account_id.to_string()];
        range.push_conditions(&mut query, "timestamp", &mut binds);
        query.push_str(" GROUP BY category ORDER BY total DESC, category");

        let mut sql_query = sqlx::query(&query);
        for value in &binds {
            sql_query = sql_query.bind(value.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to sum expenses by category")?;

        Ok(rows
            .iter()
            .map(|row| CategoryAggregate {
                category: row.get("category"),
                count: row.get("count"),
                total: row.get("total"),
            })
            .collect())
    }

    /// Expense totals per calendar day (UTC), oldest first.
    pub async fn sum_expense_by_day(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<Vec<(NaiveDate, Cents)>> {
        let mut query = String::from(
            "SELECT substr(timestamp, 1, 10) AS day, SUM(amount_cents) AS total \
             FROM transactions WHERE account_id = ? AND kind = 'expense'",
        );
        let mut binds = vec![account_id.to_string()];
        range.push_conditions(&mut query, "timestamp", &mut binds);
        query.push_str(" GROUP BY day ORDER BY day");

        let mut sql_query = sqlx::query(&query);
        for value in &binds {
            sql_query = sql_query.bind(value.as_str());
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to sum expenses by day")?;

        rows.iter()
            .map(|row| -> Result<(NaiveDate, Cents)> {
                Ok((parse_day(row.get("day"))?, row.get("total")))
            })
            .collect()
    }

    // ========================
    // Integrity
    // ========================

    /// Get statistics for integrity checking.
    pub async fn get_integrity_stats(&self) -> Result<IntegrityStats> {
        let account_count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM accounts")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let transaction_count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM transactions")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        let sequence_check = sqlx::query(
            r#"
            SELECT
                (SELECT MAX(sequence) FROM transactions) AS max_seq,
                (SELECT value FROM sequence_counter WHERE name = 'transaction_sequence') AS counter
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let max_seq: Option<i64> = sequence_check.get("max_seq");
        let counter: Option<i64> = sequence_check.get("counter");
        let sequence_counter_behind = match (max_seq, counter) {
            (Some(max), Some(counter)) => counter < max,
            (Some(_), None) => true,
            _ => false,
        };

        let invalid_amounts: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM transactions WHERE amount_cents <= 0")
                .fetch_one(&self.pool)
                .await?
                .get("count");

        let orphaned_transactions: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM transactions t
            WHERE NOT EXISTS (SELECT 1 FROM accounts a WHERE a.id = t.account_id)
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        Ok(IntegrityStats {
            account_count,
            transaction_count,
            sequence_counter_behind,
            invalid_amounts,
            orphaned_transactions,
        })
    }

    /// Every transaction that is linked or categorized as a transfer, joined
    /// with its counterpart when the counterpart still exists.
    pub async fn list_transfer_halves(&self) -> Result<Vec<TransferHalf>> {
        let rows = sqlx::query(
            r#"
            SELECT
                t.id, t.account_id, t.kind, t.amount_cents, t.category, t.linked_transaction_id,
                l.id AS c_id, l.account_id AS c_account_id, l.kind AS c_kind,
                l.amount_cents AS c_amount_cents, l.category AS c_category,
                l.linked_transaction_id AS c_linked_transaction_id
            FROM transactions t
            LEFT JOIN transactions l ON l.id = t.linked_transaction_id
            WHERE t.linked_transaction_id IS NOT NULL OR t.category = ?
            ORDER BY t.sequence
            "#,
        )
        .bind(CategoryTag::Transfer.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transfer halves")?;

        rows.iter()
            .map(|row| -> Result<TransferHalf> {
                let half = LinkSide {
                    id: parse_uuid(row.get("id"), "transaction ID")?,
                    account_id: parse_uuid(row.get("account_id"), "account ID")?,
                    kind: parse_kind(row.get("kind"))?,
                    amount_cents: row.get("amount_cents"),
                    is_transfer_category: row.get::<String, _>("category")
                        == CategoryTag::Transfer.as_str(),
                    linked_transaction_id: parse_optional_uuid(row.get("linked_transaction_id"))?,
                };

                let counterpart_id: Option<String> = row.get("c_id");
                let counterpart = match counterpart_id {
                    Some(id) => Some(LinkSide {
                        id: parse_uuid(id, "counterpart ID")?,
                        account_id: parse_uuid(row.get("c_account_id"), "counterpart account ID")?,
                        kind: parse_kind(row.get("c_kind"))?,
                        amount_cents: row.get("c_amount_cents"),
                        is_transfer_category: row.get::<String, _>("c_category")
                            == CategoryTag::Transfer.as_str(),
                        linked_transaction_id: parse_optional_uuid(
                            row.get("c_linked_transaction_id"),
                        )?,
                    }),
                    None => None,
                };

                Ok(TransferHalf { half, counterpart })
            })
            .collect()
    }
}

/// An open, uncommitted ledger write. Rows inserted here stay invisible to
/// other connections until `commit`; dropping the unit rolls everything back.
pub struct LedgerWrite {
    tx: sqlx::Transaction<'static, Sqlite>,
    next_sequence: i64,
    last_sequence: i64,
}

impl LedgerWrite {
    /// Look up an account inside the unit.
    pub async fn get_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        fetch_account(&mut *self.tx, id).await
    }

    /// Derived balance as seen by this unit, including its own uncommitted rows.
    pub async fn compute_balance(&mut self, account_id: AccountId) -> Result<Cents> {
        fetch_balance(&mut *self.tx, account_id).await
    }

    /// Insert a transaction, assigning the next reserved sequence number.
    pub async fn insert_transaction(&mut self, transaction: &mut Transaction) -> Result<()> {
        if self.next_sequence > self.last_sequence {
            bail!("No reserved sequence number left for transaction {}", transaction.id);
        }
        transaction.sequence = self.next_sequence;

        sqlx::query(
            r#"
            INSERT INTO transactions (id, sequence, account_id, amount_cents, kind, category, timestamp, recorded_at, reference, linked_transaction_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.sequence)
        .bind(transaction.account_id.to_string())
        .bind(transaction.amount_cents)
        .bind(transaction.kind.as_str())
        .bind(transaction.category.label())
        .bind(encode_timestamp(transaction.timestamp))
        .bind(encode_timestamp(transaction.recorded_at))
        .bind(&transaction.reference)
        .bind(transaction.linked_transaction_id.map(|id| id.to_string()))
        .execute(&mut *self.tx)
        .await
        .context("Failed to save transaction")?;

        self.next_sequence += 1;
        Ok(())
    }

    /// Make every write in the unit visible at once.
    pub async fn commit(self) -> Result<()> {
        if self.next_sequence <= self.last_sequence {
            bail!(
                "Ledger write reserved {} sequence number(s) it did not use",
                self.last_sequence - self.next_sequence + 1
            );
        }
        self.tx.commit().await.context("Failed to commit ledger write")
    }

    /// Discard every write in the unit.
    pub async fn rollback(self) -> Result<()> {
        self.tx.rollback().await.context("Failed to roll back ledger write")
    }
}

async fn fetch_account<'e, E>(executor: E, id: AccountId) -> Result<Option<Account>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(&format!("SELECT {} FROM accounts WHERE id = ?", ACCOUNT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(executor)
        .await
        .context("Failed to fetch account")?;

    row.as_ref().map(row_to_account).transpose()
}

async fn fetch_balance<'e, E>(executor: E, account_id: AccountId) -> Result<Cents>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN kind = 'income' THEN amount_cents ELSE 0 END), 0) -
            COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount_cents ELSE 0 END), 0) AS balance
        FROM transactions
        WHERE account_id = ?
        "#,
    )
    .bind(account_id.to_string())
    .fetch_one(executor)
    .await
    .context("Failed to compute balance")?;

    Ok(row.get("balance"))
}

/// Timestamps are stored as fixed-width RFC 3339 UTC strings so that string
/// comparison in SQL matches chronological order.
fn encode_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str, what: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid {} timestamp", what))?
        .with_timezone(&Utc))
}

fn parse_day(s: String) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| format!("Invalid day '{}'", s))
}

fn parse_uuid(s: String, what: &str) -> Result<Uuid> {
    Uuid::parse_str(&s).with_context(|| format!("Invalid {}", what))
}

fn parse_optional_uuid(s: Option<String>) -> Result<Option<Uuid>> {
    s.map(|s| parse_uuid(s, "linked transaction ID")).transpose()
}

fn parse_kind(s: String) -> Result<TransactionKind> {
    s.parse()
        .map_err(|e: String| anyhow::anyhow!("Invalid transaction kind: {}", e))
}

fn row_to_account(row: &SqliteRow) -> Result<Account> {
    let created_at: String = row.get("created_at");

    Ok(Account {
        id: parse_uuid(row.get("id"), "account ID")?,
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn row_to_entry(row: &SqliteRow) -> Result<LedgerEntry> {
    let timestamp: String = row.get("timestamp");
    let recorded_at: String = row.get("recorded_at");
    let category: String = row.get("category");
    let linked_transaction_id = parse_optional_uuid(row.get("linked_transaction_id"))?;

    let transaction = Transaction {
        id: parse_uuid(row.get("id"), "transaction ID")?,
        sequence: row.get("sequence"),
        account_id: parse_uuid(row.get("account_id"), "account ID")?,
        amount_cents: row.get("amount_cents"),
        kind: parse_kind(row.get("kind"))?,
        category: Category::from_stored(&category),
        timestamp: parse_timestamp(&timestamp, "transaction")?,
        recorded_at: parse_timestamp(&recorded_at, "recorded_at")?,
        reference: row.get("reference"),
        linked_transaction_id,
    };

    let link = TransferLink::resolve(
        linked_transaction_id,
        row.get::<i32, _>("link_present") != 0,
    );

    Ok(LedgerEntry { transaction, link })
}
