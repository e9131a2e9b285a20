use thiserror::Error;

use crate::domain::{AccountId, Cents, CategoryError, TransactionId};

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(#[from] CategoryError),

    #[error("Insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Cents, required: Cents },

    #[error("Cannot transfer money to the same account")]
    SelfTransfer,

    #[error("Receiver not found: {0}")]
    ReceiverNotFound(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("An account with this {0} already exists")]
    AccountAlreadyExists(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] anyhow::Error),
}

impl WalletError {
    pub(crate) fn account_not_found(id: AccountId) -> Self {
        WalletError::AccountNotFound(id.to_string())
    }

    /// Storage failures leave the ledger untouched and may succeed on retry
    /// (for instance after a busy timeout). Every other error is a rejection
    /// that will repeat for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WalletError::StorageFailure(_))
    }
}
