use std::fmt;

use crate::entities::contribution::VerificationStatus;
use crate::entities::task::TaskStatus;
use crate::interfaces::payment_gateway::GatewayError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    Generic {
        description: String,
    },
    EntityFailIdNotFound {
        ident: String,
    },
    ValidationErrors {
        value: String,
    },
    InvalidAmount {
        amount: i64,
    },
    InvalidCurrency {
        value: String,
    },
    InvalidTransition {
        from: TaskStatus,
        to: TaskStatus,
    },
    TaskNotOpen {
        task_id: String,
        current: TaskStatus,
    },
    TaskNotSubmittable {
        task_id: String,
        current: TaskStatus,
    },
    TaskNotFundable {
        task_id: String,
        current: TaskStatus,
    },
    DuplicateClaim {
        task_id: String,
        user_id: String,
    },
    DuplicateContribution {
        task_id: String,
        user_id: String,
    },
    AlreadyProcessed {
        contribution_id: String,
        status: VerificationStatus,
    },
    VerificationFailed {
        contribution_id: String,
        reason: String,
    },
    NotVerified {
        contribution_id: String,
        status: VerificationStatus,
    },
    AlreadyPaid {
        contribution_id: String,
        payment_id: String,
    },
    ReleaseInProgress {
        contribution_id: String,
    },
    BountyAlreadyFunded {
        task_id: String,
        current: TaskStatus,
    },
    NoEscrow {
        task_id: String,
    },
    EscrowBusy {
        task_id: String,
    },
    Gateway {
        source: GatewayError,
    },
    TransactionConflict,
    Serde {
        source: String,
    },
    SurrealDb {
        source: String,
    },
}

/// Any error produced by the ledger before the outer caller renders it.
pub type AppResult<T> = core::result::Result<T, AppError>;

/// Broad failure category for the outer caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Gateway,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationErrors { .. }
            | AppError::InvalidAmount { .. }
            | AppError::InvalidCurrency { .. }
            | AppError::VerificationFailed { .. } => ErrorKind::Validation,
            AppError::EntityFailIdNotFound { .. } | AppError::NoEscrow { .. } => {
                ErrorKind::NotFound
            }
            AppError::InvalidTransition { .. }
            | AppError::TaskNotOpen { .. }
            | AppError::TaskNotSubmittable { .. }
            | AppError::TaskNotFundable { .. }
            | AppError::DuplicateClaim { .. }
            | AppError::DuplicateContribution { .. }
            | AppError::AlreadyProcessed { .. }
            | AppError::NotVerified { .. }
            | AppError::AlreadyPaid { .. }
            | AppError::ReleaseInProgress { .. }
            | AppError::BountyAlreadyFunded { .. }
            | AppError::EscrowBusy { .. }
            | AppError::TransactionConflict => ErrorKind::Conflict,
            AppError::Gateway { .. } => ErrorKind::Gateway,
            AppError::Generic { .. } | AppError::Serde { .. } | AppError::SurrealDb { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl std::error::Error for AppError {}

const INTERNAL: &str = "Internal error";

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic { description } => write!(f, "{description}"),
            Self::EntityFailIdNotFound { ident } => write!(f, "Record id= {ident} not found"),
            Self::ValidationErrors { value } => write!(f, "Validation failed: {value}"),
            Self::InvalidAmount { amount } => {
                write!(f, "Amount must be greater than zero, got {amount}")
            }
            Self::InvalidCurrency { value } => write!(f, "Invalid currency code '{value}'"),
            Self::InvalidTransition { from, to } => {
                write!(f, "Task can not move from {from} to {to}")
            }
            Self::TaskNotOpen { task_id, current } => {
                write!(f, "Task {task_id} is not open, current status is {current}")
            }
            Self::TaskNotSubmittable { task_id, current } => write!(
                f,
                "Task {task_id} does not accept contributions, current status is {current}"
            ),
            Self::TaskNotFundable { task_id, current } => {
                write!(f, "Task {task_id} can not be funded in status {current}")
            }
            Self::DuplicateClaim { task_id, user_id } => {
                write!(f, "User {user_id} already claimed task {task_id}")
            }
            Self::DuplicateContribution { task_id, user_id } => write!(
                f,
                "User {user_id} already has a contribution for task {task_id}"
            ),
            Self::AlreadyProcessed {
                contribution_id,
                status,
            } => write!(
                f,
                "Contribution {contribution_id} was already processed, status is {status}"
            ),
            Self::VerificationFailed {
                contribution_id,
                reason,
            } => write!(
                f,
                "Contribution {contribution_id} failed verification: {reason}"
            ),
            Self::NotVerified {
                contribution_id,
                status,
            } => write!(
                f,
                "Contribution {contribution_id} is not verified, status is {status}"
            ),
            Self::AlreadyPaid {
                contribution_id,
                payment_id,
            } => write!(
                f,
                "Contribution {contribution_id} was already paid with {payment_id}"
            ),
            Self::ReleaseInProgress { contribution_id } => write!(
                f,
                "Bounty release for contribution {contribution_id} is in progress"
            ),
            Self::BountyAlreadyFunded { task_id, current } => write!(
                f,
                "Task {task_id} already has a bounty and is {current}"
            ),
            Self::NoEscrow { task_id } => write!(f, "Task {task_id} has no active escrow"),
            Self::EscrowBusy { task_id } => write!(
                f,
                "Escrow of task {task_id} is being settled or is owed to a contributor"
            ),
            Self::Gateway { source } => write!(f, "Payment gateway error: {source}"),
            Self::TransactionConflict => write!(f, "Transaction conflict, try again"),
            Self::Serde { source } => write!(f, "Serde error - {source}"),
            Self::SurrealDb { .. } => write!(f, "{INTERNAL}"),
        }
    }
}

// External Errors
impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde {
            source: value.to_string(),
        }
    }
}

impl From<surrealdb::Error> for AppError {
    fn from(value: surrealdb::Error) -> Self {
        Self::SurrealDb {
            source: value.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(value: validator::ValidationErrors) -> Self {
        Self::ValidationErrors {
            value: value.to_string(),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway { source: value }
    }
}
