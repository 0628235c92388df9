use async_trait::async_trait;

use crate::entities::project::{Project, Visibility};
use crate::entities::string_set::StringSet;
use crate::middleware::error::AppResult;

#[derive(Debug, Clone)]
pub struct ProjectCreate {
    pub owner_id: String,
    pub title: String,
    pub short_desc: String,
    pub repo_url: Option<String>,
    pub tags: StringSet,
    pub visibility: Visibility,
}

#[async_trait]
pub trait ProjectRepositoryInterface {
    async fn create(&self, data: ProjectCreate) -> AppResult<Project>;
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Project>>;
    async fn list(&self, owner_id: Option<&str>) -> AppResult<Vec<Project>>;
}
