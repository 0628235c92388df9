use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use surrealdb::sql::Thing;

pub const TABLE_NAME: &str = "claim";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClaimStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ClaimStatus {
    pub fn is_active(self) -> bool {
        matches!(self, ClaimStatus::Pending | ClaimStatus::Accepted)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: Thing,
    pub task: Thing,
    pub user: Thing,
    pub status: ClaimStatus,
    pub mentor: Option<Thing>,
    pub created_at: DateTime<Utc>,
}
