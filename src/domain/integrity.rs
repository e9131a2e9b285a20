use std::collections::HashMap;

use serde::Serialize;

use super::{AccountId, Cents, TransactionId, TransactionKind};

/// Counters gathered by the store for an integrity pass.
#[derive(Debug, Clone, Default)]
pub struct IntegrityStats {
    pub account_count: i64,
    pub transaction_count: i64,
    /// The sequence counter is lower than the highest sequence in use
    pub sequence_counter_behind: bool,
    pub invalid_amounts: i64,
    pub orphaned_transactions: i64,
}

/// The fields of a transaction that matter when checking transfer links.
#[derive(Debug, Clone)]
pub struct LinkSide {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount_cents: Cents,
    pub is_transfer_category: bool,
    pub linked_transaction_id: Option<TransactionId>,
}

/// A transaction that is (or claims to be) half of a transfer, joined with
/// its counterpart if the counterpart still exists.
#[derive(Debug, Clone)]
pub struct TransferHalf {
    pub half: LinkSide,
    pub counterpart: Option<LinkSide>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub account_count: i64,
    pub transaction_count: i64,
    pub transfer_halves: usize,
    pub dangling_links: usize,
    /// Net signed amount of all transfer halves across every account
    pub transfer_net: Cents,
    /// Net signed amount of the halves whose counterpart is gone
    pub dangling_net: Cents,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }

    /// Live transfers net to zero; only dangling halves may leave a residue.
    pub fn transfers_balanced(&self) -> bool {
        self.transfer_net == self.dangling_net
    }
}

/// Build an integrity report from store statistics, every transfer half, and
/// balances computed two independent ways (SQL aggregate and in-memory fold).
pub fn build_integrity_report(
    stats: &IntegrityStats,
    halves: &[TransferHalf],
    stored_balances: &HashMap<AccountId, Cents>,
    recomputed_balances: &HashMap<AccountId, Cents>,
) -> IntegrityReport {
    let mut issues = Vec::new();

    if stats.sequence_counter_behind {
        issues.push("Sequence counter is behind the highest recorded sequence".to_string());
    }
    if stats.invalid_amounts > 0 {
        issues.push(format!(
            "{} transaction(s) have a non-positive amount",
            stats.invalid_amounts
        ));
    }
    if stats.orphaned_transactions > 0 {
        issues.push(format!(
            "{} transaction(s) belong to an account that does not exist",
            stats.orphaned_transactions
        ));
    }

    let mut transfer_net = 0;
    let mut dangling_net = 0;
    let mut dangling_links = 0;

    for TransferHalf { half, counterpart } in halves {
        let signed = half.kind.sign() * half.amount_cents;
        transfer_net += signed;

        let Some(linked_id) = half.linked_transaction_id else {
            issues.push(format!("Transfer {} has no linked counterpart", half.id));
            continue;
        };

        if !half.is_transfer_category {
            issues.push(format!(
                "Transaction {} is linked but not categorized as a transfer",
                half.id
            ));
        }

        let Some(other) = counterpart else {
            dangling_links += 1;
            dangling_net += signed;
            continue;
        };

        if other.id != linked_id {
            issues.push(format!("Transfer {} resolved to the wrong counterpart", half.id));
        }
        if other.linked_transaction_id != Some(half.id) {
            issues.push(format!(
                "Transfer {} points to {} but is not linked back",
                half.id, other.id
            ));
        }
        if other.kind != half.kind.opposite() {
            issues.push(format!(
                "Transfer {} and {} have the same kind ({})",
                half.id, other.id, half.kind
            ));
        }
        if other.amount_cents != half.amount_cents {
            issues.push(format!(
                "Transfer {} and {} disagree on amount ({} vs {})",
                half.id, other.id, half.amount_cents, other.amount_cents
            ));
        }
        if other.account_id == half.account_id {
            issues.push(format!("Transfer {} is linked to its own account", half.id));
        }
    }

    if transfer_net != dangling_net {
        issues.push(format!(
            "Transfers do not net to zero (residue {} cents)",
            transfer_net - dangling_net
        ));
    }

    for (account_id, stored) in stored_balances {
        let recomputed = recomputed_balances.get(account_id).copied().unwrap_or(0);
        if *stored != recomputed {
            issues.push(format!(
                "Balance drift on account {}: aggregate {} vs recomputed {}",
                account_id, stored, recomputed
            ));
        }
    }
    for account_id in recomputed_balances.keys() {
        if !stored_balances.contains_key(account_id) {
            issues.push(format!("Account {} is missing from the balance aggregate", account_id));
        }
    }

    IntegrityReport {
        account_count: stats.account_count,
        transaction_count: stats.transaction_count,
        transfer_halves: halves.len(),
        dangling_links,
        transfer_net,
        dangling_net,
        issues,
    }
}
