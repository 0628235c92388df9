use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use surrealdb::sql::Thing;

use crate::entities::money::Amount;

pub const TABLE_NAME: &str = "contribution";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    AutoVerified,
    ManualVerified,
    Rejected,
}

impl VerificationStatus {
    pub fn is_verified(self) -> bool {
        matches!(
            self,
            VerificationStatus::AutoVerified | VerificationStatus::ManualVerified
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    pub id: Thing,
    pub task: Thing,
    pub user: Thing,
    pub reference: String,
    pub verification_status: VerificationStatus,
    pub payout_amount: Amount,
    pub payment_id: Option<Thing>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub cycle: i64,
    pub release_lock: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
