use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Category, CategoryTag, Cents};

pub type TransactionId = Uuid;

/// Longest reference or transfer note a user may supply, in characters.
pub const MAX_REFERENCE_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money entering the account (balance increases)
    Income,
    /// Money leaving the account (balance decreases)
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Effect of this kind on the balance: +1 for income, -1 for expense.
    pub fn sign(&self) -> i64 {
        match self {
            TransactionKind::Income => 1,
            TransactionKind::Expense => -1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            TransactionKind::Income => TransactionKind::Expense,
            TransactionKind::Expense => TransactionKind::Income,
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction kind '{}'", other)),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single immutable ledger entry owned by one account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Monotonically increasing sequence number for ordering
    pub sequence: i64,
    pub account_id: AccountId,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub kind: TransactionKind,
    pub category: Category,
    /// When the transaction occurred in the real world
    pub timestamp: DateTime<Utc>,
    /// When it was written to the ledger
    pub recorded_at: DateTime<Utc>,
    pub reference: Option<String>,
    /// The other half of a transfer. Not an ownership edge: the counterpart
    /// may belong to an account that has since been deleted.
    pub linked_transaction_id: Option<TransactionId>,
}

impl Transaction {
    /// Create a new transaction. Sequence number must be assigned by the repository.
    pub fn new(
        account_id: AccountId,
        amount_cents: Cents,
        kind: TransactionKind,
        category: Category,
        timestamp: DateTime<Utc>,
    ) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            account_id,
            amount_cents,
            kind,
            category,
            timestamp,
            recorded_at: Utc::now(),
            reference: None,
            linked_transaction_id: None,
        }
    }

    pub fn with_reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    pub fn with_link(mut self, counterpart: TransactionId) -> Self {
        self.linked_transaction_id = Some(counterpart);
        self
    }

    /// Signed effect on the owner's balance.
    pub fn signed_amount(&self) -> Cents {
        self.kind.sign() * self.amount_cents
    }
}

/// Resolved state of a transfer cross-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "id", rename_all = "lowercase")]
pub enum TransferLink {
    /// The counterpart transaction still exists
    Live(TransactionId),
    /// The counterpart was removed together with its owning account
    Dangling(TransactionId),
}

impl TransferLink {
    pub fn resolve(linked_id: Option<TransactionId>, counterpart_exists: bool) -> Option<Self> {
        linked_id.map(|id| {
            if counterpart_exists {
                TransferLink::Live(id)
            } else {
                TransferLink::Dangling(id)
            }
        })
    }

    pub fn id(&self) -> TransactionId {
        match self {
            TransferLink::Live(id) | TransferLink::Dangling(id) => *id,
        }
    }

    pub fn is_dangling(&self) -> bool {
        matches!(self, TransferLink::Dangling(_))
    }

    pub fn status(&self) -> &'static str {
        match self {
            TransferLink::Live(_) => "live",
            TransferLink::Dangling(_) => "dangling",
        }
    }
}

/// A transaction as read back from the ledger, with its transfer link resolved.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub transaction: Transaction,
    pub link: Option<TransferLink>,
}

/// Participant of a transfer, identified by id and shown by username.
#[derive(Debug, Clone, Copy)]
pub struct Party<'a> {
    pub id: AccountId,
    pub username: &'a str,
}

/// The two halves of a transfer, already cross-linked.
///
/// Both ids are generated up front, so each half can carry the other's id
/// before either is written and the pair is inserted in one atomic unit.
#[derive(Debug, Clone)]
pub struct TransferPair {
    pub expense: Transaction,
    pub income: Transaction,
}

impl TransferPair {
    pub fn new(
        sender: Party<'_>,
        receiver: Party<'_>,
        amount_cents: Cents,
        note: Option<&str>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let expense = Transaction::new(
            sender.id,
            amount_cents,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Transfer),
            timestamp,
        )
        .with_reference(Some(transfer_reference("To", receiver.username, note)));

        let income = Transaction::new(
            receiver.id,
            amount_cents,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Transfer),
            timestamp,
        )
        .with_reference(Some(transfer_reference("From", sender.username, note)))
        .with_link(expense.id);

        let expense = expense.with_link(income.id);

        Self { expense, income }
    }
}

fn transfer_reference(direction: &str, username: &str, note: Option<&str>) -> String {
    match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{} {}: {}", direction, username, note),
        None => format!("{} {}", direction, username),
    }
}
