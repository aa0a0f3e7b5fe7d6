use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("StoreError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("StoreError - Migrate: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
    #[error("StoreError - duplicate {entity} '{value}'")]
    Duplicate {
        entity: &'static str,
        value: String,
    },
    #[error("StoreError - row not found for {0}")]
    MissingRow(&'static str),
    #[error("StoreError - stale write on {0}")]
    StaleWrite(&'static str),
    #[error("StoreError - could not decode stored {entity}: {reason}")]
    Decode {
        entity: &'static str,
        reason: String,
    },
}

impl StoreError {
    pub(crate) fn duplicate(entity: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            value: value.into(),
        }
    }

    pub(crate) fn decode(entity: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            entity,
            reason: reason.to_string(),
        }
    }
}
