#![allow(dead_code)]
use std::sync::Arc;

use rand::distr::{Alphanumeric, SampleString};

use herdbook_ledger::{account::*, store::MemoryLedgerStore, AccountKind, Ledger};

pub async fn init_ledger() -> anyhow::Result<Ledger> {
    Ok(Ledger::with_store(Arc::new(MemoryLedgerStore::new())).await?)
}

pub fn test_supplier() -> NewAccount {
    let code = Alphanumeric.sample_string(&mut rand::rng(), 12);
    NewAccount::builder()
        .id(uuid::Uuid::new_v4())
        .code(format!("SUP-{code}"))
        .name(format!("Test Supplier {code}"))
        .kind(AccountKind::Supplier)
        .build()
        .unwrap()
}

pub fn test_customer() -> NewAccount {
    let code = Alphanumeric.sample_string(&mut rand::rng(), 12);
    NewAccount::builder()
        .id(uuid::Uuid::new_v4())
        .code(format!("CUS-{code}"))
        .name(format!("Test Customer {code}"))
        .kind(AccountKind::Customer)
        .build()
        .unwrap()
}

pub fn test_cost_center() -> NewAccount {
    let code = Alphanumeric.sample_string(&mut rand::rng(), 12);
    NewAccount::builder()
        .id(uuid::Uuid::new_v4())
        .code(format!("CC-{code}"))
        .name(format!("Test Cost Center {code}"))
        .kind(AccountKind::CostCenter)
        .build()
        .unwrap()
}
