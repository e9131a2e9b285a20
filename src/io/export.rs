use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::{TransactionFilter, WalletService};
use crate::domain::{Account, AccountId, Cents, LedgerEntry, format_cents};

/// JSON snapshot of one account and its ledger
#[derive(Debug, Clone, Serialize)]
pub struct AccountSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub account: Account,
    pub balance: Cents,
    pub transactions: Vec<LedgerEntry>,
}

/// Exporter for converting an account's ledger to various formats
pub struct Exporter<'a> {
    service: &'a WalletService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a WalletService) -> Self {
        Self { service }
    }

    /// Export an account's transactions to CSV, newest first
    pub async fn export_transactions_csv<W: Write>(
        &self,
        account_id: AccountId,
        writer: W,
    ) -> Result<usize> {
        let entries = self
            .service
            .transaction_history(account_id, TransactionFilter::default())
            .await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "id",
            "sequence",
            "timestamp",
            "kind",
            "category",
            "amount",
            "reference",
            "linked_transaction_id",
            "link_status",
        ])?;

        let mut count = 0;
        for LedgerEntry { transaction, link } in &entries {
            csv_writer.write_record([
                transaction.id.to_string(),
                transaction.sequence.to_string(),
                transaction.timestamp.to_rfc3339(),
                transaction.kind.to_string(),
                transaction.category.to_string(),
                format_cents(transaction.amount_cents),
                transaction.reference.clone().unwrap_or_default(),
                link.map(|l| l.id().to_string()).unwrap_or_default(),
                link.map(|l| l.status().to_string()).unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export an account (without its password hash), its balance and its
    /// transactions as pretty-printed JSON
    pub async fn export_account_json<W: Write>(
        &self,
        account_id: AccountId,
        mut writer: W,
    ) -> Result<AccountSnapshot> {
        let account = self.service.get_account(account_id).await?;
        let balance = self.service.balance(account_id).await?;
        let transactions = self
            .service
            .transaction_history(account_id, TransactionFilter::default())
            .await?;

        let snapshot = AccountSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            account,
            balance,
            transactions,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
