use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::entities::claim::{Claim, ClaimStatus};
use crate::middleware::error::AppResult;

#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub task_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<ClaimStatus>,
}

#[async_trait]
pub trait ClaimRepositoryInterface {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Claim>>;
    async fn find(&self, task_id: &str, user_id: &str) -> AppResult<Option<Claim>>;
    async fn list(&self, filter: &ClaimFilter) -> AppResult<Vec<Claim>>;

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        task_id: &str,
        user_id: &str,
        mentor_id: Option<&str>,
    ) -> Query<'b, any::Any>;

    fn build_accept_pending_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task_id: &str,
        user_id: &str,
    ) -> Query<'b, any::Any>;
}
