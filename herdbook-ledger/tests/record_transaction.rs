mod helpers;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use herdbook_ledger::{
    store::DateRange,
    transaction::{error::TransactionError, TransactionInput},
    *,
};

#[tokio::test]
async fn purchase_credits_the_supplier() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let supplier = ledger.accounts().create(helpers::test_supplier()).await?;
    let today = Utc::now().date_naive();

    let tx = ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Purchase)
                .entity_id(supplier.id)
                .amount(dec!(1000))
                .date(today)
                .notes("40 bags of feed")
                .build()?,
        )
        .await?;

    let supplier = ledger.accounts().find_by_id(supplier.id).await?;
    assert_eq!(supplier.balance, dec!(-1000));

    let entry = ledger
        .journal_entries()
        .find_by_id(tx.journal_entry_id)
        .await?;
    assert_eq!(entry.status, JournalEntryStatus::Approved);
    assert!(entry.is_balanced());
    assert_eq!(entry.total_debit(), dec!(1000));
    assert!(entry
        .lines
        .iter()
        .any(|l| l.account_id == supplier.id && l.credit == dec!(1000)));

    // purchases are on credit, no voucher
    assert!(ledger.vouchers().find_for_transaction(tx.id).await.is_err());

    let trial_balance = ledger.trial_balance(today).await?;
    assert_eq!(trial_balance.total_debit, trial_balance.total_credit);
    Ok(())
}

#[tokio::test]
async fn payment_settles_the_supplier_and_issues_a_voucher() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let supplier = ledger.accounts().create(helpers::test_supplier()).await?;
    let today = Utc::now().date_naive();

    ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Purchase)
                .entity_id(supplier.id)
                .amount(dec!(1000))
                .date(today)
                .build()?,
        )
        .await?;
    let payment = ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Payment)
                .entity_id(supplier.id)
                .amount(dec!(1000))
                .date(today)
                .payment_method(PaymentMethod::BankTransfer)
                .build()?,
        )
        .await?;

    let supplier = ledger.accounts().find_by_id(supplier.id).await?;
    assert_eq!(supplier.balance, Decimal::ZERO);

    let voucher = ledger.vouchers().find_for_transaction(payment.id).await?;
    assert_eq!(voucher.voucher_type, VoucherType::Payment);
    assert_eq!(voucher.amount, payment.amount);
    assert_eq!(voucher.status, VoucherStatus::Issued);
    assert_eq!(voucher.entity_id, supplier.id);

    let trial_balance = ledger.trial_balance(today).await?;
    assert_eq!(trial_balance.total_debit, trial_balance.total_credit);
    Ok(())
}

#[tokio::test]
async fn sale_and_receipt_mirror_the_supplier_flow() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let customer = ledger.accounts().create(helpers::test_customer()).await?;
    let today = Utc::now().date_naive();

    ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Sale)
                .entity_id(customer.id)
                .amount(dec!(500))
                .date(today)
                .build()?,
        )
        .await?;
    let account = ledger.accounts().find_by_id(customer.id).await?;
    assert_eq!(account.balance, dec!(500));

    let receipt = ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Receipt)
                .entity_id(customer.id)
                .amount(dec!(500))
                .date(today)
                .payment_method(PaymentMethod::Cash)
                .build()?,
        )
        .await?;
    let account = ledger.accounts().find_by_id(customer.id).await?;
    assert_eq!(account.balance, Decimal::ZERO);

    let voucher = ledger.vouchers().find_for_transaction(receipt.id).await?;
    assert_eq!(voucher.voucher_type, VoucherType::Receipt);
    Ok(())
}

#[tokio::test]
async fn rejects_invalid_amounts_without_persisting_anything() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let supplier = ledger.accounts().create(helpers::test_supplier()).await?;
    let today = Utc::now().date_naive();

    for amount in [dec!(-5), Decimal::ZERO, dec!(9.999)] {
        let err = ledger
            .record_transaction(
                TransactionInput::builder()
                    .tx_type(TransactionType::Purchase)
                    .entity_id(supplier.id)
                    .amount(amount)
                    .date(today)
                    .build()?,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransactionError(TransactionError::InvalidAmount(_))
        ));
    }

    let statement = ledger
        .account_statement(supplier.id, DateRange::default())
        .await?;
    assert!(statement.lines.is_empty());
    assert_eq!(statement.closing_balance, Decimal::ZERO);
    assert!(ledger.transactions().list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn cash_movements_require_a_payment_method() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let supplier = ledger.accounts().create(helpers::test_supplier()).await?;

    let err = ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Payment)
                .entity_id(supplier.id)
                .amount(dec!(100))
                .date(Utc::now().date_naive())
                .build()?,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::TransactionError(TransactionError::MissingPaymentMethod(_))
    ));
    Ok(())
}

#[tokio::test]
async fn only_suppliers_and_customers_can_transact() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let cost_center = ledger.accounts().create(helpers::test_cost_center()).await?;
    let today = Utc::now().date_naive();

    // cost centers and system accounts are posting destinations, not parties
    for entity_id in [cost_center.id, ledger.system_accounts().cash] {
        let err = ledger
            .record_transaction(
                TransactionInput::builder()
                    .tx_type(TransactionType::Sale)
                    .entity_id(entity_id)
                    .amount(dec!(75))
                    .date(today)
                    .build()?,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::TransactionError(TransactionError::InvalidEntityKind(id, _)) if id == entity_id
        ));
    }

    assert!(ledger.transactions().list().await?.is_empty());
    assert!(ledger.journal_entries().list().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn rejects_unknown_and_inactive_entities() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let today = Utc::now().date_naive();

    let err = ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Sale)
                .entity_id(AccountId::new())
                .amount(dec!(10))
                .date(today)
                .build()?,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::TransactionError(TransactionError::UnknownEntity(_))
    ));

    let supplier = ledger.accounts().create(helpers::test_supplier()).await?;
    ledger.accounts().deactivate(supplier.id).await?;
    let err = ledger
        .record_transaction(
            TransactionInput::builder()
                .tx_type(TransactionType::Purchase)
                .entity_id(supplier.id)
                .amount(dec!(10))
                .date(today)
                .build()?,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::TransactionError(TransactionError::InactiveEntity(_))
    ));
    Ok(())
}
