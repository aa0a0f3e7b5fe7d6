#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

pub mod account;
pub mod balance;
pub mod journal_entry;
mod ledger;
pub mod store;
pub mod transaction;
pub mod voucher;

pub use ledger::*;

pub mod primitives {
    pub use herdbook_core_types::primitives::*;
}

pub use primitives::*;
