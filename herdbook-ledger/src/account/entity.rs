use chrono::{DateTime, Utc};
use derive_builder::Builder;
use rust_decimal::Decimal;

pub use herdbook_core_types::account::*;

use crate::primitives::*;

/// Representation of a ***new*** ledger account with required/optional
/// properties and a builder.
///
/// A non-zero `opening_balance` is not written directly: registering the
/// account posts a balanced journal entry against the opening-balances
/// equity account, so the balance invariant holds from the first record.
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct NewAccount {
    #[builder(setter(into))]
    pub id: AccountId,
    #[builder(setter(into))]
    pub(super) code: String,
    #[builder(setter(into))]
    pub(super) name: String,
    pub(super) kind: AccountKind,
    #[builder(default)]
    pub(super) opening_balance: Decimal,
}

impl NewAccount {
    pub fn builder() -> NewAccountBuilder {
        NewAccountBuilder::default()
    }

    pub(super) fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    pub(super) fn into_values(self, created_at: DateTime<Utc>) -> AccountValues {
        AccountValues {
            id: self.id,
            code: self.code,
            kind: self.kind,
            name: self.name,
            balance: Decimal::ZERO,
            status: AccountStatus::Active,
            created_at,
        }
    }
}

impl NewAccountBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(code) = self.code.as_ref() {
            if code.is_empty() || code.len() > 50 || code.contains(' ') {
                return Err(format!("Invalid account code '{code}'"));
            }
        }
        if let Some(opening_balance) = self.opening_balance.as_ref() {
            if opening_balance.round_dp(2) != *opening_balance {
                return Err(format!(
                    "Opening balance {opening_balance} has more than 2 decimal places"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn it_builds() {
        let new_account = NewAccount::builder()
            .id(uuid::Uuid::new_v4())
            .code("SUP-001")
            .name("Greenfields Feed Co")
            .kind(AccountKind::Supplier)
            .build()
            .unwrap();
        assert_eq!(new_account.code, "SUP-001");
        assert_eq!(new_account.kind, AccountKind::Supplier);
        assert_eq!(new_account.opening_balance, Decimal::ZERO);
    }

    #[test]
    fn fails_when_mandatory_fields_are_missing() {
        let new_account = NewAccount::builder().build();
        assert!(new_account.is_err());
    }

    #[test]
    fn rejects_code_with_spaces() {
        let new_account = NewAccount::builder()
            .id(uuid::Uuid::new_v4())
            .code("SUP 001")
            .name("Greenfields Feed Co")
            .kind(AccountKind::Supplier)
            .build();
        assert!(new_account.is_err());
    }

    #[test]
    fn rejects_sub_cent_opening_balance() {
        let new_account = NewAccount::builder()
            .id(uuid::Uuid::new_v4())
            .code("CUS-001")
            .name("Acme")
            .kind(AccountKind::Customer)
            .opening_balance(dec!(500.005))
            .build();
        assert!(new_account.is_err());
    }
}
