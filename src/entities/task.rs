use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use surrealdb::sql::Thing;

use crate::entities::money::{Amount, Currency};
use crate::entities::string_set::StringSet;
use crate::middleware::error::{AppError, AppResult};

pub const TABLE_NAME: &str = "task";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    Open,
    Claimed,
    InProgress,
    Submitted,
    Completed,
    Archived,
}

impl TaskStatus {
    pub fn can_transition_to(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Open, Claimed)
                | (Claimed, Submitted)
                | (InProgress, Submitted)
                | (Submitted, Completed)
                | (Submitted, Claimed)
        )
    }

    /// Validates a lifecycle edge. Does not persist anything.
    pub fn transition_to(self, to: TaskStatus) -> AppResult<TaskStatus> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(AppError::InvalidTransition { from: self, to })
        }
    }

    /// Administrative path, outside the lifecycle table.
    pub fn archive(self) -> AppResult<TaskStatus> {
        match self {
            TaskStatus::Archived => Err(AppError::InvalidTransition {
                from: self,
                to: TaskStatus::Archived,
            }),
            _ => Ok(TaskStatus::Archived),
        }
    }

    pub fn accepts_claims(self) -> bool {
        self == TaskStatus::Open
    }

    pub fn accepts_contributions(self) -> bool {
        matches!(self, TaskStatus::Claimed | TaskStatus::InProgress)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Archived)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Thing,
    pub project: Thing,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_hours: i64,
    pub tags: StringSet,
    pub skills_required: StringSet,
    pub bounty_amount: Amount,
    pub bounty_currency: Currency,
    pub bounty_escrow_id: Option<String>,
    /// Held while a release or refund of the escrow is at the gateway.
    pub escrow_lock: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub submission_cycle: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn has_escrow(&self) -> bool {
        self.bounty_escrow_id.is_some()
    }

    pub fn escrow_locked(&self, now: DateTime<Utc>) -> bool {
        self.escrow_lock.is_some_and(|until| until > now)
    }
}
