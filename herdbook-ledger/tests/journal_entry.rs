mod helpers;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use herdbook_ledger::{
    journal_entry::{error::JournalEntryError, JournalLineSpec, NewJournalEntry},
    *,
};

#[tokio::test]
async fn drafts_have_no_balance_effect_until_approved() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let feed = ledger.accounts().create(helpers::test_cost_center()).await?;
    let vet = ledger.accounts().create(helpers::test_cost_center()).await?;

    let draft = ledger
        .journal_entries()
        .create_draft(
            NewJournalEntry::builder()
                .date(Utc::now().date_naive())
                .description("reallocate vet costs")
                .created_by("bookkeeper")
                .line(JournalLineSpec::debit(vet.id, dec!(80)))
                .line(JournalLineSpec::credit(feed.id, dec!(80)))
                .build()?,
        )
        .await?;
    assert_eq!(draft.status, JournalEntryStatus::Draft);
    assert!(draft.entry_number.starts_with("JE-"));

    let vet_account = ledger.accounts().find_by_id(vet.id).await?;
    assert_eq!(vet_account.balance, Decimal::ZERO);

    let approved = ledger.journal_entries().approve(draft.id).await?;
    assert_eq!(approved.status, JournalEntryStatus::Approved);

    let vet_account = ledger.accounts().find_by_id(vet.id).await?;
    let feed_account = ledger.accounts().find_by_id(feed.id).await?;
    assert_eq!(vet_account.balance, dec!(80));
    assert_eq!(feed_account.balance, dec!(-80));
    Ok(())
}

#[tokio::test]
async fn unbalanced_drafts_cannot_be_approved() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let a = ledger.accounts().create(helpers::test_cost_center()).await?;
    let b = ledger.accounts().create(helpers::test_cost_center()).await?;

    let draft = ledger
        .journal_entries()
        .create_draft(
            NewJournalEntry::builder()
                .date(Utc::now().date_naive())
                .description("does not add up")
                .line(JournalLineSpec::debit(a.id, dec!(100)))
                .line(JournalLineSpec::credit(b.id, dec!(90)))
                .build()?,
        )
        .await?;

    let err = ledger.journal_entries().approve(draft.id).await.unwrap_err();
    assert!(matches!(
        err,
        JournalEntryError::Unbalanced {
            debits,
            credits,
        } if debits == dec!(100) && credits == dec!(90)
    ));

    // still a draft, still correctable
    let entry = ledger.journal_entries().find_by_id(draft.id).await?;
    assert_eq!(entry.status, JournalEntryStatus::Draft);
    let account = ledger.accounts().find_by_id(a.id).await?;
    assert_eq!(account.balance, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn rejected_drafts_never_touch_balances() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let a = ledger.accounts().create(helpers::test_cost_center()).await?;
    let b = ledger.accounts().create(helpers::test_cost_center()).await?;

    let draft = ledger
        .journal_entries()
        .create_draft(
            NewJournalEntry::builder()
                .date(Utc::now().date_naive())
                .description("entered twice by mistake")
                .line(JournalLineSpec::debit(a.id, dec!(40)))
                .line(JournalLineSpec::credit(b.id, dec!(40)))
                .build()?,
        )
        .await?;

    let rejected = ledger.journal_entries().reject(draft.id).await?;
    assert_eq!(rejected.status, JournalEntryStatus::Rejected);

    let account = ledger.accounts().find_by_id(a.id).await?;
    assert_eq!(account.balance, Decimal::ZERO);

    // rejected lines never show on statements either
    let statement = ledger
        .account_statement(a.id, Default::default())
        .await?;
    assert!(statement.lines.is_empty());
    Ok(())
}

#[tokio::test]
async fn finalized_entries_are_terminal() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let a = ledger.accounts().create(helpers::test_cost_center()).await?;
    let b = ledger.accounts().create(helpers::test_cost_center()).await?;

    let draft = ledger
        .journal_entries()
        .create_draft(
            NewJournalEntry::builder()
                .date(Utc::now().date_naive())
                .description("one-shot approval")
                .line(JournalLineSpec::debit(a.id, dec!(40)))
                .line(JournalLineSpec::credit(b.id, dec!(40)))
                .build()?,
        )
        .await?;
    ledger.journal_entries().approve(draft.id).await?;

    for result in [
        ledger.journal_entries().approve(draft.id).await,
        ledger.journal_entries().reject(draft.id).await,
    ] {
        assert!(matches!(
            result.unwrap_err(),
            JournalEntryError::AlreadyFinalized(_)
        ));
    }

    // the balance effect applied exactly once
    let account = ledger.accounts().find_by_id(a.id).await?;
    assert_eq!(account.balance, dec!(40));
    Ok(())
}

#[tokio::test]
async fn approval_requires_active_line_accounts() -> anyhow::Result<()> {
    let ledger = helpers::init_ledger().await?;
    let a = ledger.accounts().create(helpers::test_cost_center()).await?;
    let b = ledger.accounts().create(helpers::test_cost_center()).await?;

    let draft = ledger
        .journal_entries()
        .create_draft(
            NewJournalEntry::builder()
                .date(Utc::now().date_naive())
                .description("posts to a closed account")
                .line(JournalLineSpec::debit(a.id, dec!(25)))
                .line(JournalLineSpec::credit(b.id, dec!(25)))
                .build()?,
        )
        .await?;
    ledger.accounts().deactivate(b.id).await?;

    let err = ledger.journal_entries().approve(draft.id).await.unwrap_err();
    assert!(matches!(err, JournalEntryError::AccountInactive(id) if id == b.id));

    let entry = ledger.journal_entries().find_by_id(draft.id).await?;
    assert_eq!(entry.status, JournalEntryStatus::Draft);
    Ok(())
}
