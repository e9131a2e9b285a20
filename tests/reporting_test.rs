mod common;

use anyhow::Result;
use chrono::NaiveDate;
use common::{parse_date, parse_datetime, register, test_service};
use purse::application::{RECENT_LIMIT, ReportingService, WalletError, WalletService};
use purse::domain::{Account, Category, CategoryTag, TransactionKind};
use purse::storage::DateRange;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// December 2023 through February 2024 for one account.
async fn seed_history(service: &WalletService) -> Result<Account> {
    let alice = register(service, "alice").await?;

    let entries = [
        (50000, TransactionKind::Income, CategoryTag::Salary, parse_date("2023-12-15")),
        (310000, TransactionKind::Income, CategoryTag::Salary, parse_date("2024-01-05")),
        (3100, TransactionKind::Expense, CategoryTag::FoodAndDrink, parse_date("2024-01-10")),
        (6200, TransactionKind::Expense, CategoryTag::Housing, parse_datetime("2024-01-20", 9, 0)),
        (1000, TransactionKind::Income, CategoryTag::Gift, parse_datetime("2024-01-20", 18, 30)),
        (100, TransactionKind::Income, CategoryTag::CashDeposit, parse_date("2024-02-01")),
    ];

    for (amount, kind, tag, timestamp) in entries {
        service
            .record_transaction_at(alice.id, amount, kind, Category::Listed(tag), None, timestamp)
            .await?;
    }

    Ok(alice)
}

fn reporting(service: &WalletService) -> ReportingService {
    ReportingService::new(service.repository().clone())
}

#[tokio::test]
async fn test_cash_flow() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;
    let reports = reporting(&service);

    let all = reports.cash_flow(alice.id, DateRange::all()).await?;
    assert_eq!(all.total_income, 50000 + 310000 + 1000 + 100);
    assert_eq!(all.total_expense, 9300);
    assert_eq!(all.net, all.total_income - all.total_expense);
    assert_eq!(all.net, service.balance(alice.id).await?);

    let january = reports
        .cash_flow(
            alice.id,
            DateRange::between(parse_date("2024-01-01"), parse_date("2024-02-01")),
        )
        .await?;
    assert_eq!(january.total_income, 311000);
    assert_eq!(january.total_expense, 9300);
    Ok(())
}

#[tokio::test]
async fn test_cash_flow_for_empty_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let bob = register(&service, "bob").await?;

    let flow = reporting(&service).cash_flow(bob.id, DateRange::all()).await?;
    assert_eq!((flow.total_income, flow.total_expense, flow.net), (0, 0, 0));
    Ok(())
}

#[tokio::test]
async fn test_expense_by_category_descending() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;

    let categories = reporting(&service)
        .expense_by_category(alice.id, DateRange::all())
        .await?;

    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].category, "Housing");
    assert_eq!(categories[0].total, 6200);
    assert_eq!(categories[1].category, "Food & Drink");
    assert_eq!(categories[1].count, 1);
    assert!((categories[0].percentage - 66.666).abs() < 0.01);
    Ok(())
}

#[tokio::test]
async fn test_recent_transactions_and_dashboard() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;
    let reports = reporting(&service);

    let recent = reports.recent_transactions(alice.id, 2).await?;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].transaction.amount_cents, 100);
    assert_eq!(recent[1].transaction.amount_cents, 1000);

    let dashboard = reports.dashboard(alice.id).await?;
    assert_eq!(dashboard.balance, 351800);
    assert_eq!(dashboard.recent.len(), RECENT_LIMIT);
    assert_eq!(dashboard.categories.len(), 2);
    assert_eq!(dashboard.cash_flow.net, dashboard.balance);
    Ok(())
}

#[tokio::test]
async fn test_month_summary() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;

    let january = reporting(&service).month_summary(alice.id, 2024, 1).await?;

    assert_eq!(january.total_income, 311000);
    assert_eq!(january.total_expense, 9300);
    assert_eq!(january.net, 301700);
    assert_eq!(january.days_in_month, 31);
    assert_eq!(january.average_daily_expense, 300);
    Ok(())
}

#[tokio::test]
async fn test_month_comparison_wraps_to_previous_year() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;

    let comparison = reporting(&service)
        .month_comparison(alice.id, 2024, 1)
        .await?;

    assert_eq!((comparison.previous.year, comparison.previous.month), (2023, 12));
    assert_eq!(comparison.previous.net, 50000);
    assert_eq!(comparison.change, 301700 - 50000);
    Ok(())
}

#[tokio::test]
async fn test_invalid_month_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    let result = reporting(&service).month_summary(alice.id, 2024, 13).await;
    assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    Ok(())
}

#[tokio::test]
async fn test_daily_expenses_skip_quiet_days() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;

    let days = reporting(&service).daily_expenses(alice.id, 2024, 1).await?;

    let pairs: Vec<_> = days.iter().map(|d| (d.date, d.amount)).collect();
    assert_eq!(
        pairs,
        vec![(day("2024-01-10"), 3100), (day("2024-01-20"), 6200)]
    );
    Ok(())
}

#[tokio::test]
async fn test_daily_net_totals_group_transactions() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;

    let groups = reporting(&service).daily_net_totals(alice.id).await?;

    let dates: Vec<_> = groups.iter().map(|g| g.date).collect();
    assert_eq!(
        dates,
        vec![
            day("2024-02-01"),
            day("2024-01-20"),
            day("2024-01-10"),
            day("2024-01-05"),
            day("2023-12-15"),
        ]
    );

    let busy = &groups[1];
    assert_eq!(busy.net, 1000 - 6200);
    assert_eq!(busy.transactions.len(), 2);
    assert_eq!(busy.transactions[0].transaction.amount_cents, 1000, "newest first");

    let grouped: usize = groups.iter().map(|g| g.transactions.len()).sum();
    assert_eq!(grouped, 6);

    for group in &groups {
        let listed: i64 = group
            .transactions
            .iter()
            .map(|e| e.transaction.signed_amount())
            .sum();
        assert_eq!(group.net, listed, "net for {} matches its rows", group.date);
    }
    let overall: i64 = groups.iter().map(|g| g.net).sum();
    assert_eq!(overall, service.balance(alice.id).await?);
    Ok(())
}

#[tokio::test]
async fn test_transfers_appear_in_reports() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = seed_history(&service).await?;
    let bob = register(&service, "bob").await?;

    service
        .record_transfer_at(alice.id, bob.id, 4000, None, parse_date("2024-01-25"))
        .await?;

    let reports = reporting(&service);
    let categories = reports
        .expense_by_category(alice.id, DateRange::all())
        .await?;
    assert!(categories.iter().any(|c| c.category == "Transfer" && c.total == 4000));

    let bob_january = reports.month_summary(bob.id, 2024, 1).await?;
    assert_eq!(bob_january.total_income, 4000);
    Ok(())
}
