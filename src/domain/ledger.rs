use std::collections::HashMap;

use super::{AccountId, Cents, Transaction};

/// Compute balances for every account that owns at least one transaction.
/// Balance = sum of income - sum of expense over the account's own rows.
pub fn compute_all_balances(transactions: &[Transaction]) -> HashMap<AccountId, Cents> {
    let mut balances: HashMap<AccountId, Cents> = HashMap::new();

    for txn in transactions {
        *balances.entry(txn.account_id).or_insert(0) += txn.signed_amount();
    }

    balances
}
