mod helpers;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use herdbook_ledger::{
    account::{error::AccountError, NewAccount},
    transaction::TransactionInput,
    *,
};

#[tokio::test]
async fn opening_balance_posts_against_the_equity_account() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let code = format!("SUP-{}", uuid::Uuid::new_v4());

    let supplier = ledger
        .accounts()
        .create(
            NewAccount::builder()
                .id(uuid::Uuid::new_v4())
                .code(code.as_str())
                .name("Greenfields Feed Co")
                .kind(AccountKind::Supplier)
                .opening_balance(dec!(500))
                .build()?,
        )
        .await?;
    assert_eq!(supplier.balance, dec!(500));

    let supplier = ledger.accounts().find_by_id(supplier.id).await?;
    assert_eq!(supplier.balance, dec!(500));

    let opening = ledger
        .accounts()
        .find_by_id(ledger.system_accounts().opening)
        .await?;
    assert_eq!(opening.balance, dec!(-500));
    assert_eq!(opening.kind, AccountKind::Equity);

    // the opening balance is a real posting, visible on the statement
    let statement = ledger
        .account_statement(supplier.id, Default::default())
        .await?;
    assert_eq!(statement.lines.len(), 1);
    assert_eq!(statement.lines[0].debit, dec!(500));
    assert_eq!(statement.closing_balance, dec!(500));

    let trial_balance = ledger.trial_balance(Utc::now().date_naive()).await?;
    assert_eq!(trial_balance.total_debit, trial_balance.total_credit);
    Ok(())
}

#[tokio::test]
async fn negative_opening_balance_credits_the_new_account() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;

    let supplier = ledger
        .accounts()
        .create(
            NewAccount::builder()
                .id(uuid::Uuid::new_v4())
                .code(format!("SUP-{}", uuid::Uuid::new_v4()))
                .name("Outstanding Feed Bill")
                .kind(AccountKind::Supplier)
                .opening_balance(dec!(-250))
                .build()?,
        )
        .await?;
    assert_eq!(supplier.balance, dec!(-250));

    let opening = ledger
        .accounts()
        .find_by_id(ledger.system_accounts().opening)
        .await?;
    assert_eq!(opening.balance, dec!(250));
    Ok(())
}

#[tokio::test]
async fn zero_opening_balance_posts_nothing() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let customer = ledger.accounts().create(helpers::test_customer()).await?;

    assert_eq!(customer.balance, Decimal::ZERO);
    assert!(ledger.journal_entries().list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn account_codes_are_unique() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let code = format!("CUS-{}", uuid::Uuid::new_v4());
    let new_account = |name: &str| {
        NewAccount::builder()
            .id(uuid::Uuid::new_v4())
            .code(code.as_str())
            .name(name)
            .kind(AccountKind::Customer)
            .build()
    };

    ledger.accounts().create(new_account("First")?).await?;
    let err = ledger
        .accounts()
        .create(new_account("Second")?)
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::DuplicateCode(c) if c == code));
    Ok(())
}

#[tokio::test]
async fn only_settled_accounts_can_be_deactivated() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let customer = ledger.accounts().create(helpers::test_customer()).await?;
    let today = Utc::now().date_naive();

    ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Sale)
                .entity_id(customer.id)
                .amount(dec!(120))
                .date(today)
                .build()?,
        )
        .await?;

    let err = ledger.accounts().deactivate(customer.id).await.unwrap_err();
    assert!(matches!(
        err,
        AccountError::HasOpenBalance {
            balance,
            ..
        } if balance == dec!(120)
    ));

    ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Receipt)
                .entity_id(customer.id)
                .amount(dec!(120))
                .date(today)
                .payment_method(PaymentMethod::Cash)
                .build()?,
        )
        .await?;

    let customer = ledger.accounts().deactivate(customer.id).await?;
    assert_eq!(customer.status, AccountStatus::Inactive);

    let err = ledger.accounts().deactivate(customer.id).await.unwrap_err();
    assert!(matches!(err, AccountError::Inactive(_)));
    Ok(())
}

#[tokio::test]
async fn duplicate_code_with_opening_balance_leaves_no_partial_state() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let code = format!("SUP-{}", uuid::Uuid::new_v4());
    let new_account = |name: &str| {
        NewAccount::builder()
            .id(uuid::Uuid::new_v4())
            .code(code.as_str())
            .name(name)
            .kind(AccountKind::Supplier)
            .opening_balance(dec!(500))
            .build()
    };

    ledger.accounts().create(new_account("First")?).await?;
    let accounts_before = ledger.accounts().list().await?.len();
    let entries_before = ledger.journal_entries().list().await?.len();

    let err = ledger
        .accounts()
        .create(new_account("Second")?)
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::DuplicateCode(c) if c == code));

    // the rejected account left neither a row nor an opening entry behind
    assert_eq!(ledger.accounts().list().await?.len(), accounts_before);
    assert_eq!(ledger.journal_entries().list().await?.len(), entries_before);
    let opening = ledger
        .accounts()
        .find_by_id(ledger.system_accounts().opening)
        .await?;
    assert_eq!(opening.balance, dec!(-500));
    Ok(())
}

#[tokio::test]
async fn deactivating_an_unknown_account_fails() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let err = ledger
        .accounts()
        .deactivate(AccountId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn system_accounts_bootstrap_is_idempotent() -> anyhow::Result<()> {
    let store = std::sync::Arc::new(herdbook_ledger::store::MemoryLedgerStore::new());
    let ledger = Ledger::with_store(store.clone()).await?;

    let purchases = ledger.accounts().find_by_code("SYS-PURCHASES").await?;
    assert_eq!(purchases.id, ledger.system_accounts().purchases);
    assert!(purchases.is_active());

    // a second init on the same store reuses the existing accounts
    let rebuilt = Ledger::with_store(store).await?;
    assert_eq!(
        rebuilt.system_accounts().purchases,
        ledger.system_accounts().purchases
    );
    assert_eq!(
        rebuilt.accounts().list().await?.len(),
        ledger.accounts().list().await?.len()
    );
    Ok(())
}

#[tokio::test]
async fn system_account_codes_are_configurable() -> anyhow::Result<()> {
    let store = std::sync::Arc::new(herdbook_ledger::store::MemoryLedgerStore::new());
    let ledger = Ledger::with_store_and_codes(
        store,
        SystemAccountCodes {
            purchases: "6000".to_string(),
            sales: "7000".to_string(),
            cash: "5700".to_string(),
            opening: "9000".to_string(),
        },
    )
    .await?;

    let cash = ledger.accounts().find_by_code("5700").await?;
    assert_eq!(cash.id, ledger.system_accounts().cash);
    let opening = ledger.accounts().find_by_code("9000").await?;
    assert_eq!(opening.kind, AccountKind::Equity);

    // the standard chart was never created on this store
    let err = ledger.accounts().find_by_code("SYS-CASH").await.unwrap_err();
    assert!(matches!(err, AccountError::CodeNotFound(_)));
    Ok(())
}
