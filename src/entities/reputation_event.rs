use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use surrealdb::sql::Thing;

pub const TABLE_NAME: &str = "reputation_event";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReputationEventType {
    ContributionAccepted,
    MentorEndorsement,
    BountyEarned,
    ManualAdjustment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationEvent {
    pub id: Thing,
    pub user: Thing,
    pub event_type: ReputationEventType,
    pub score_change: i64,
    pub related_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
