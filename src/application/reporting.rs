use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::domain::{AccountId, Cents, LedgerEntry};
use crate::storage::{DateRange, Repository};

use super::WalletError;

/// Number of transactions shown on the dashboard.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CashFlowSummary {
    pub total_income: Cents,
    pub total_expense: Cents,
    pub net: Cents,
}

impl CashFlowSummary {
    fn new(total_income: Cents, total_expense: Cents) -> Self {
        Self {
            total_income,
            total_expense,
            net: total_income - total_expense,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub total: Cents,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub balance: Cents,
    pub cash_flow: CashFlowSummary,
    pub categories: Vec<CategorySummary>,
    pub recent: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub total_income: Cents,
    pub total_expense: Cents,
    pub net: Cents,
    pub days_in_month: u32,
    /// Month's expense spread over every calendar day of the month
    pub average_daily_expense: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthComparison {
    pub current: MonthSummary,
    pub previous: MonthSummary,
    /// Current net minus previous net
    pub change: Cents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyAmount {
    pub date: NaiveDate,
    pub amount: Cents,
}

/// One calendar day of activity: its net total and the transactions behind it.
#[derive(Debug, Clone, Serialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub net: Cents,
    pub transactions: Vec<LedgerEntry>,
}

/// Read-only aggregations for dashboards and analytics. Nothing here takes
/// part in validating a write.
#[derive(Clone)]
pub struct ReportingService {
    repo: Repository,
}

impl ReportingService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Total income and expense inside a window.
    pub async fn cash_flow(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<CashFlowSummary, WalletError> {
        let (income, expense) = self.repo.sum_by_kind(account_id, range).await?;
        Ok(CashFlowSummary::new(income, expense))
    }

    /// Expense totals per category, largest first.
    pub async fn expense_by_category(
        &self,
        account_id: AccountId,
        range: DateRange,
    ) -> Result<Vec<CategorySummary>, WalletError> {
        let aggregates = self.repo.sum_expense_by_category(account_id, range).await?;
        let grand_total: Cents = aggregates.iter().map(|a| a.total).sum();

        Ok(aggregates
            .into_iter()
            .map(|agg| CategorySummary {
                percentage: if grand_total > 0 {
                    (agg.total as f64 / grand_total as f64) * 100.0
                } else {
                    0.0
                },
                category: agg.category,
                total: agg.total,
                count: agg.count,
            })
            .collect())
    }

    /// The most recent transactions, newest first.
    pub async fn recent_transactions(
        &self,
        account_id: AccountId,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, WalletError> {
        Ok(self
            .repo
            .list_transactions_filtered(account_id, None, None, DateRange::all(), Some(limit))
            .await?)
    }

    /// Everything the home screen shows, over the whole history.
    pub async fn dashboard(&self, account_id: AccountId) -> Result<Dashboard, WalletError> {
        if self.repo.get_account(account_id).await?.is_none() {
            return Err(WalletError::account_not_found(account_id));
        }

        Ok(Dashboard {
            balance: self.repo.compute_balance(account_id).await?,
            cash_flow: self.cash_flow(account_id, DateRange::all()).await?,
            categories: self.expense_by_category(account_id, DateRange::all()).await?,
            recent: self.recent_transactions(account_id, RECENT_LIMIT).await?,
        })
    }

    /// Income, expense and net for one calendar month (UTC).
    pub async fn month_summary(
        &self,
        account_id: AccountId,
        year: i32,
        month: u32,
    ) -> Result<MonthSummary, WalletError> {
        let window = MonthWindow::new(year, month)?;
        let (income, expense) = self.repo.sum_by_kind(account_id, window.range()).await?;
        let days = window.days();

        Ok(MonthSummary {
            year,
            month,
            total_income: income,
            total_expense: expense,
            net: income - expense,
            days_in_month: days,
            average_daily_expense: average_per_day(expense, days),
        })
    }

    /// A month's summary next to the month before it.
    pub async fn month_comparison(
        &self,
        account_id: AccountId,
        year: i32,
        month: u32,
    ) -> Result<MonthComparison, WalletError> {
        let (prev_year, prev_month) = MonthWindow::new(year, month)?.previous();
        let current = self.month_summary(account_id, year, month).await?;
        let previous = self.month_summary(account_id, prev_year, prev_month).await?;

        Ok(MonthComparison {
            change: current.net - previous.net,
            current,
            previous,
        })
    }

    /// Expense per day of a month. Days without expenses are omitted.
    pub async fn daily_expenses(
        &self,
        account_id: AccountId,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyAmount>, WalletError> {
        let window = MonthWindow::new(year, month)?;
        let days = self.repo.sum_expense_by_day(account_id, window.range()).await?;

        Ok(days
            .into_iter()
            .map(|(date, amount)| DailyAmount { date, amount })
            .collect())
    }

    /// The full history grouped by day, newest day first, each with its net.
    ///
    /// Nets are summed from the listed rows so every group agrees with the
    /// transactions under it.
    pub async fn daily_net_totals(&self, account_id: AccountId) -> Result<Vec<DayGroup>, WalletError> {
        let entries = self
            .repo
            .list_transactions_filtered(account_id, None, None, DateRange::all(), None)
            .await?;

        // Entries arrive newest first, so each day's rows are contiguous.
        let mut groups: Vec<DayGroup> = Vec::new();
        for entry in entries {
            let date = entry.transaction.timestamp.date_naive();
            let signed = entry.transaction.signed_amount();
            if let Some(group) = groups.last_mut().filter(|g| g.date == date) {
                group.net += signed;
                group.transactions.push(entry);
                continue;
            }
            groups.push(DayGroup {
                date,
                net: signed,
                transactions: vec![entry],
            });
        }

        Ok(groups)
    }
}

/// A calendar month as a half-open UTC window.
struct MonthWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthWindow {
    fn new(year: i32, month: u32) -> Result<Self, WalletError> {
        let invalid = || WalletError::InvalidInput(format!("{}-{:02} is not a valid month", year, month));
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(invalid)?;
        Ok(Self { start, end })
    }

    fn range(&self) -> DateRange {
        DateRange::between(midnight(self.start), midnight(self.end))
    }

    fn days(&self) -> u32 {
        (self.end - self.start).num_days() as u32
    }

    fn previous(&self) -> (i32, u32) {
        if self.start.month() == 1 {
            (self.start.year() - 1, 12)
        } else {
            (self.start.year(), self.start.month() - 1)
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Integer average rounded half up.
fn average_per_day(total: Cents, days: u32) -> Cents {
    if days == 0 {
        return 0;
    }
    let days = Cents::from(days);
    (total + days / 2) / days
}
