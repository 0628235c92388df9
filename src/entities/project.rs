use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use surrealdb::sql::Thing;

use crate::entities::string_set::StringSet;

pub const TABLE_NAME: &str = "project";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Thing,
    pub owner: Thing,
    pub title: String,
    pub short_desc: String,
    pub repo_url: Option<String>,
    pub tags: StringSet,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}
