mod common;

use anyhow::Result;
use common::{Pair, deposit, parse_date, register, test_service};
use purse::application::{TransactionFilter, WalletError};
use purse::domain::{
    Category, CategoryError, CategoryTag, MAX_AMOUNT_CENTS, MAX_REFERENCE_LEN, TransactionKind,
    parse_cents,
};
use purse::storage::DateRange;
use uuid::Uuid;

#[tokio::test]
async fn test_balance_is_income_minus_expense() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    assert_eq!(service.balance(alice.id).await?, 0);

    deposit(&service, alice.id, 50000).await?;
    service
        .record_transaction(
            alice.id,
            12000,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Housing),
            None,
        )
        .await?;
    service
        .record_transaction(
            alice.id,
            2550,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Gift),
            Some("birthday".into()),
        )
        .await?;

    assert_eq!(service.balance(alice.id).await?, 50000 - 12000 + 2550);
    Ok(())
}

#[tokio::test]
async fn test_first_income_worked_example() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    let id = service
        .record_transaction(
            alice.id,
            50000,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Salary),
            None,
        )
        .await?;

    assert_eq!(service.balance(alice.id).await?, 50000);

    let entry = service.get_transaction(alice.id, id).await?;
    assert_eq!(entry.transaction.amount_cents, 50000);
    assert_eq!(entry.transaction.kind, TransactionKind::Income);
    assert_eq!(entry.transaction.category, Category::Listed(CategoryTag::Salary));
    assert!(entry.link.is_none());
    Ok(())
}

#[tokio::test]
async fn test_expense_exceeding_balance_is_rejected_without_effect() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Pair { alice, .. } = Pair::funded(&service, 1000, 0).await?;

    let result = service
        .record_transaction(
            alice.id,
            1001,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Shopping),
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(WalletError::InsufficientFunds {
            balance: 1000,
            required: 1001
        })
    ));
    assert_eq!(service.balance(alice.id).await?, 1000);
    let history = service
        .transaction_history(alice.id, TransactionFilter::default())
        .await?;
    assert_eq!(history.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_expense_of_exact_balance_is_allowed() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Pair { alice, .. } = Pair::funded(&service, 1000, 0).await?;

    service
        .record_transaction(
            alice.id,
            1000,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Bills),
            None,
        )
        .await?;

    assert_eq!(service.balance(alice.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_non_positive_amount_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    for amount in [0, -500] {
        let result = service
            .record_transaction(
                alice.id,
                amount,
                TransactionKind::Income,
                Category::Listed(CategoryTag::Salary),
                None,
            )
            .await;
        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
    }

    assert_eq!(service.balance(alice.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_amount_above_maximum_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    let huge = parse_cents("60000000000000000.00")?;
    for amount in [huge, MAX_AMOUNT_CENTS + 1] {
        let result = service
            .record_transaction(
                alice.id,
                amount,
                TransactionKind::Income,
                Category::Listed(CategoryTag::Salary),
                None,
            )
            .await;
        assert!(matches!(result, Err(WalletError::InvalidAmount(_))));
    }

    // The balance stays computable and the account stays usable
    assert_eq!(service.balance(alice.id).await?, 0);
    deposit(&service, alice.id, MAX_AMOUNT_CENTS).await?;
    deposit(&service, alice.id, MAX_AMOUNT_CENTS).await?;
    service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Bills),
            None,
        )
        .await?;
    assert_eq!(service.balance(alice.id).await?, 2 * MAX_AMOUNT_CENTS - 100);
    Ok(())
}

#[tokio::test]
async fn test_overlong_reference_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    let result = service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Salary),
            Some("x".repeat(MAX_REFERENCE_LEN + 1)),
        )
        .await;
    assert!(matches!(result, Err(WalletError::InvalidInput(_))));
    assert_eq!(service.balance(alice.id).await?, 0);

    let id = service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Salary),
            Some(format!("  {}  ", "x".repeat(MAX_REFERENCE_LEN))),
        )
        .await?;
    let entry = service.get_transaction(alice.id, id).await?;
    assert_eq!(entry.transaction.reference.map(|r| r.len()), Some(MAX_REFERENCE_LEN));
    Ok(())
}

#[tokio::test]
async fn test_custom_category_requires_label() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Pair { alice, .. } = Pair::funded(&service, 5000, 0).await?;

    let blank = service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Expense,
            Category::Custom("   ".into()),
            None,
        )
        .await;
    assert!(matches!(
        blank,
        Err(WalletError::InvalidCategory(CategoryError::BlankCustomLabel))
    ));

    let id = service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Expense,
            Category::Custom("  Books ".into()),
            None,
        )
        .await?;
    let entry = service.get_transaction(alice.id, id).await?;
    assert_eq!(entry.transaction.category, Category::Custom("Books".into()));

    assert_eq!(service.balance(alice.id).await?, 4900);
    Ok(())
}

#[tokio::test]
async fn test_transfer_category_is_reserved() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Pair { alice, .. } = Pair::funded(&service, 5000, 0).await?;

    let listed = service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Transfer),
            None,
        )
        .await;
    assert!(matches!(
        listed,
        Err(WalletError::InvalidCategory(CategoryError::Reserved(_)))
    ));

    let disguised = service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Expense,
            Category::Custom("transfer".into()),
            None,
        )
        .await;
    assert!(matches!(
        disguised,
        Err(WalletError::InvalidCategory(CategoryError::Reserved(_)))
    ));

    assert_eq!(service.balance(alice.id).await?, 5000);
    Ok(())
}

#[tokio::test]
async fn test_category_must_match_kind() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    let result = service
        .record_transaction(
            alice.id,
            100,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Shopping),
            None,
        )
        .await;

    assert!(matches!(
        result,
        Err(WalletError::InvalidCategory(CategoryError::NotAllowedForKind { .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn test_unknown_account_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .record_transaction(
            Uuid::new_v4(),
            100,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Gift),
            None,
        )
        .await;
    assert!(matches!(result, Err(WalletError::AccountNotFound(_))));

    assert!(matches!(
        service.balance(Uuid::new_v4()).await,
        Err(WalletError::AccountNotFound(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_rejections_do_not_consume_sequence_numbers() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Pair { alice, .. } = Pair::funded(&service, 100, 0).await?;

    let _ = service
        .record_transaction(
            alice.id,
            500,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Bills),
            None,
        )
        .await;
    let id = service
        .record_transaction(
            alice.id,
            50,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Bills),
            None,
        )
        .await?;

    let entry = service.get_transaction(alice.id, id).await?;
    assert_eq!(entry.transaction.sequence, 2);
    assert!(service.check_integrity().await?.is_healthy());
    Ok(())
}

#[tokio::test]
async fn test_history_filters_and_ordering() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let alice = register(&service, "alice").await?;

    service
        .record_transaction_at(
            alice.id,
            100000,
            TransactionKind::Income,
            Category::Listed(CategoryTag::Salary),
            None,
            parse_date("2024-01-01"),
        )
        .await?;
    service
        .record_transaction_at(
            alice.id,
            2000,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::FoodAndDrink),
            Some("lunch".into()),
            parse_date("2024-01-10"),
        )
        .await?;
    service
        .record_transaction_at(
            alice.id,
            3000,
            TransactionKind::Expense,
            Category::Listed(CategoryTag::Transport),
            None,
            parse_date("2024-02-03"),
        )
        .await?;

    let all = service
        .transaction_history(alice.id, TransactionFilter::default())
        .await?;
    let amounts: Vec<_> = all.iter().map(|e| e.transaction.amount_cents).collect();
    assert_eq!(amounts, vec![3000, 2000, 100000], "newest first");

    let expenses = service
        .transaction_history(
            alice.id,
            TransactionFilter {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(expenses.len(), 2);

    let january = service
        .transaction_history(
            alice.id,
            TransactionFilter {
                range: DateRange::between(parse_date("2024-01-01"), parse_date("2024-02-01")),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(january.len(), 2);

    let food = service
        .transaction_history(
            alice.id,
            TransactionFilter {
                category: Some("Food & Drink".into()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(food.len(), 1);
    assert_eq!(food[0].transaction.reference.as_deref(), Some("lunch"));

    let limited = service
        .transaction_history(
            alice.id,
            TransactionFilter {
                limit: Some(1),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].transaction.amount_cents, 3000);
    Ok(())
}

#[tokio::test]
async fn test_transactions_are_private_to_their_account() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let Pair { alice, bob } = Pair::funded(&service, 1000, 0).await?;

    let history = service
        .transaction_history(alice.id, TransactionFilter::default())
        .await?;
    let id = history[0].transaction.id;

    assert!(service.get_transaction(alice.id, id).await.is_ok());
    assert!(matches!(
        service.get_transaction(bob.id, id).await,
        Err(WalletError::TransactionNotFound(_))
    ));
    assert!(
        service
            .transaction_history(bob.id, TransactionFilter::default())
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn test_categories_for_kind() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert_eq!(
        service.categories_for(TransactionKind::Income),
        vec!["Salary", "Gift", "Cash Deposit", "Transfer", "Others"]
    );
    assert_eq!(
        service.categories_for(TransactionKind::Expense),
        vec![
            "Food & Drink",
            "Shopping",
            "Housing",
            "Bills",
            "Transport",
            "Entertainment",
            "Transfer",
            "Others"
        ]
    );
    Ok(())
}
