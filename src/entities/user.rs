use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::entities::string_set::StringSet;

pub const TABLE_NAME: &str = "user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Thing,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub reputation_score: i64,
    pub roles: StringSet,
    pub created_at: DateTime<Utc>,
}
