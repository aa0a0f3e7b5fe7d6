use chrono::{DateTime, NaiveDate, Utc};
use derive_builder::Builder;
use rust_decimal::Decimal;

pub use herdbook_core_types::journal_entry::*;

use crate::primitives::*;

/// Amounts are held in currency minor units: at most 2 decimal places.
pub(crate) fn has_minor_unit_scale(amount: &Decimal) -> bool {
    amount.round_dp(2) == *amount
}

/// One line of a draft journal entry: the target account and either a debit
/// or a credit amount, never both.
#[derive(Debug, Clone)]
pub struct JournalLineSpec {
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl JournalLineSpec {
    pub fn debit(account_id: impl Into<AccountId>, amount: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    pub fn credit(account_id: impl Into<AccountId>, amount: Decimal) -> Self {
        Self {
            account_id: account_id.into(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    fn check(&self) -> Result<(), String> {
        let one_sided = (self.debit > Decimal::ZERO && self.credit == Decimal::ZERO)
            || (self.credit > Decimal::ZERO && self.debit == Decimal::ZERO);
        if !one_sided {
            return Err(format!(
                "Line against {} must carry exactly one positive side (debit {}, credit {})",
                self.account_id, self.debit, self.credit
            ));
        }
        if !has_minor_unit_scale(&self.debit) || !has_minor_unit_scale(&self.credit) {
            return Err(format!(
                "Line against {} has more than 2 decimal places",
                self.account_id
            ));
        }
        Ok(())
    }

    fn into_values(self) -> JournalLineValues {
        JournalLineValues {
            id: JournalLineId::new(),
            account_id: self.account_id,
            debit: self.debit,
            credit: self.credit,
        }
    }
}

/// Representation of a ***new*** manual journal entry. Built entries start
/// life as drafts; balance is only enforced when the draft is approved.
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct NewJournalEntry {
    pub(super) date: NaiveDate,
    #[builder(setter(into))]
    pub(super) description: String,
    #[builder(setter(into), default = "\"system\".to_string()")]
    pub(super) created_by: String,
    #[builder(setter(each(name = "line")), default)]
    pub(super) lines: Vec<JournalLineSpec>,
}

impl NewJournalEntry {
    pub fn builder() -> NewJournalEntryBuilder {
        NewJournalEntryBuilder::default()
    }

    pub(super) fn into_values(
        self,
        id: JournalEntryId,
        entry_number: String,
        created_at: DateTime<Utc>,
    ) -> JournalEntryValues {
        JournalEntryValues {
            id,
            entry_number,
            date: self.date,
            description: self.description,
            status: JournalEntryStatus::Draft,
            created_by: self.created_by,
            created_at,
            lines: self.lines.into_iter().map(JournalLineSpec::into_values).collect(),
        }
    }
}

impl NewJournalEntryBuilder {
    fn validate(&self) -> Result<(), String> {
        let lines = self.lines.as_deref().unwrap_or_default();
        if lines.len() < 2 {
            return Err("A journal entry needs at least two lines".to_string());
        }
        for line in lines {
            line.check()?;
        }
        Ok(())
    }
}

/// Builds the already-approved two-line entry behind a recorded transaction
/// or an opening balance. Both lines derive from the same amount, so the
/// entry is balanced by construction.
pub(crate) fn synthesized_entry(
    entry_number: String,
    date: NaiveDate,
    description: String,
    created_by: &str,
    debit_account: AccountId,
    credit_account: AccountId,
    amount: Decimal,
) -> JournalEntryValues {
    JournalEntryValues {
        id: JournalEntryId::new(),
        entry_number,
        date,
        description,
        status: JournalEntryStatus::Approved,
        created_by: created_by.to_string(),
        created_at: Utc::now(),
        lines: vec![
            JournalLineValues {
                id: JournalLineId::new(),
                account_id: debit_account,
                debit: amount,
                credit: Decimal::ZERO,
            },
            JournalLineValues {
                id: JournalLineId::new(),
                account_id: credit_account,
                debit: Decimal::ZERO,
                credit: amount,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn it_builds() {
        let a = AccountId::new();
        let b = AccountId::new();
        let new_entry = NewJournalEntry::builder()
            .date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .description("vet costs allocation")
            .line(JournalLineSpec::debit(a, dec!(120)))
            .line(JournalLineSpec::credit(b, dec!(120)))
            .build()
            .unwrap();
        assert_eq!(new_entry.lines.len(), 2);
        assert_eq!(new_entry.created_by, "system");
    }

    #[test]
    fn rejects_single_line_entries() {
        let new_entry = NewJournalEntry::builder()
            .date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .description("half an entry")
            .line(JournalLineSpec::debit(AccountId::new(), dec!(120)))
            .build();
        assert!(new_entry.is_err());
    }

    #[test]
    fn rejects_two_sided_lines() {
        let bad = JournalLineSpec {
            account_id: AccountId::new(),
            debit: dec!(10),
            credit: dec!(10),
        };
        let new_entry = NewJournalEntry::builder()
            .date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .description("both sides")
            .line(bad)
            .line(JournalLineSpec::credit(AccountId::new(), dec!(10)))
            .build();
        assert!(new_entry.is_err());
    }

    #[test]
    fn synthesized_entries_are_balanced() {
        let entry = synthesized_entry(
            "JE-000001".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            "feed purchase".to_string(),
            "ledger",
            AccountId::new(),
            AccountId::new(),
            dec!(1000),
        );
        assert!(entry.is_balanced());
        assert_eq!(entry.status, JournalEntryStatus::Approved);
    }
}
