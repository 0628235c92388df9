use std::fmt::Display;

use strum::IntoEnumIterator;
use surrealdb::sql::{Id, Thing};
use surrealdb::Response;

use crate::middleware::error::AppError;

pub const THROW_TASK_STATE_CHANGED: &str = "Task state changed";
pub const THROW_CONTRIBUTION_STATE_CHANGED: &str = "Contribution state changed";
pub const THROW_CONTRIBUTION_ALREADY_PAID: &str = "Contribution already paid";
pub const THROW_ESCROW_CHANGED: &str = "Task escrow changed";
pub const THROW_USER_NOT_FOUND: &str = "User not found";
pub const THROW_ESCROW_BUSY: &str = "Task escrow locked";

const THROWN_MARKERS: [&str; 6] = [
    THROW_TASK_STATE_CHANGED,
    THROW_CONTRIBUTION_STATE_CHANGED,
    THROW_CONTRIBUTION_ALREADY_PAID,
    THROW_ESCROW_CHANGED,
    THROW_USER_NOT_FOUND,
    THROW_ESCROW_BUSY,
];

/// Why a ledger transaction did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxFailure {
    /// A guard inside the transaction threw one of the markers above.
    Thrown(String),
    /// A unique index rejected a write; holds the index name when known.
    IndexExists(String),
    /// Read/write conflict with a concurrent transaction.
    Conflict,
    Db(String),
}

impl TxFailure {
    pub fn is_thrown(&self, marker: &str) -> bool {
        matches!(self, TxFailure::Thrown(m) if m == marker)
    }

    pub fn is_index(&self, index: &str) -> bool {
        matches!(self, TxFailure::IndexExists(i) if i.contains(index))
    }

    fn priority(&self) -> u8 {
        match self {
            TxFailure::Thrown(_) => 3,
            TxFailure::IndexExists(_) => 2,
            TxFailure::Conflict => 1,
            TxFailure::Db(_) => 0,
        }
    }
}

impl From<TxFailure> for AppError {
    fn from(value: TxFailure) -> Self {
        match value {
            TxFailure::Conflict => AppError::TransactionConflict,
            TxFailure::Thrown(description) => AppError::Generic { description },
            TxFailure::IndexExists(index) => AppError::Generic {
                description: format!("Unique index {index} violated"),
            },
            TxFailure::Db(source) => AppError::SurrealDb { source },
        }
    }
}

/// None for statements that were only skipped because another one failed.
pub fn classify_error(error: &surrealdb::Error) -> Option<TxFailure> {
    if let surrealdb::Error::Db(surrealdb::error::Db::Thrown(msg)) = error {
        return Some(TxFailure::Thrown(msg.clone()));
    }
    classify_message(&error.to_string())
}

pub fn classify_message(message: &str) -> Option<TxFailure> {
    if message.contains("was not executed") {
        return None;
    }
    if let Some(marker) = THROWN_MARKERS.iter().find(|m| message.contains(**m)) {
        return Some(TxFailure::Thrown(marker.to_string()));
    }
    if message.contains("can be retried") || message.contains("read or write conflict") {
        return Some(TxFailure::Conflict);
    }
    if message.contains("already contains") {
        let index = message
            .split('`')
            .nth(1)
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return Some(TxFailure::IndexExists(index));
    }
    Some(TxFailure::Db(message.to_string()))
}

/// Folds every statement error of a transaction response into the most specific failure.
pub fn check_transaction(response: &mut Response) -> Result<(), TxFailure> {
    let failure = response
        .take_errors()
        .values()
        .filter_map(classify_error)
        .fold(None, |ret: Option<TxFailure>, failure| match ret {
            Some(current) if current.priority() >= failure.priority() => Some(current),
            _ => Some(failure),
        });
    match failure {
        None => Ok(()),
        Some(failure) => Err(failure),
    }
}

pub fn new_record_key() -> String {
    Id::ulid().to_raw()
}

pub fn record_key(thing: &Thing) -> String {
    thing.id.to_raw()
}

pub fn thing(table: &str, key: &str) -> Thing {
    Thing::from((table, key))
}

/// `'a','b'` list of an enum's storage names for `ASSERT $value INSIDE [...]`.
pub fn quoted_variants<E: IntoEnumIterator + Display>() -> String {
    E::iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::claim::ClaimStatus;

    #[test]
    fn lists_enum_storage_names() {
        assert_eq!(
            quoted_variants::<ClaimStatus>(),
            "'pending','accepted','rejected','withdrawn'"
        );
    }

    #[test]
    fn cancelled_statements_are_ignored() {
        assert_eq!(
            classify_message("The query was not executed due to a failed transaction"),
            None
        );
    }

    #[test]
    fn markers_are_found_inside_wrapped_messages() {
        assert_eq!(
            classify_message("An error occurred: Task state changed"),
            Some(TxFailure::Thrown(THROW_TASK_STATE_CHANGED.to_string()))
        );
        let busy = classify_message("An error occurred: Task escrow locked").unwrap();
        assert!(busy.is_thrown(THROW_ESCROW_BUSY));
        assert!(!busy.is_thrown(THROW_ESCROW_CHANGED));
    }

    #[test]
    fn unique_index_names_are_extracted() {
        let failure = classify_message(
            "Database index `claim_task_user_idx` already contains [task:a, user:b], with record `claim:c`",
        )
        .unwrap();
        assert!(failure.is_index("claim_task_user_idx"));
    }

    #[test]
    fn conflicts_are_retryable() {
        let failure = classify_message(
            "Failed to commit transaction due to a read or write conflict. This transaction can be retried",
        );
        assert_eq!(failure, Some(TxFailure::Conflict));
        assert_eq!(AppError::from(TxFailure::Conflict), AppError::TransactionConflict);
    }

    #[test]
    fn record_keys_round_trip() {
        let key = new_record_key();
        assert_eq!(record_key(&thing("task", &key)), key);
    }
}
