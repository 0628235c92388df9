use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::entities::reputation_event::{ReputationEvent, ReputationEventType};
use crate::middleware::error::AppResult;

#[derive(Debug, Clone)]
pub struct ReputationAppend {
    pub user_id: String,
    pub event_type: ReputationEventType,
    pub score_change: i64,
    pub related_id: Option<String>,
    pub notes: Option<String>,
}

#[async_trait]
pub trait ReputationEventRepositoryInterface {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<ReputationEvent>>;
    /// Newest first.
    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<ReputationEvent>>;
    async fn sum_by_user(&self, user_id: &str) -> AppResult<i64>;
    /// Recomputes the cached user score from the event log.
    async fn rebuild_score(&self, user_id: &str) -> AppResult<Option<i64>>;

    /// Increments the cached score and writes the event as `event_id`. With `required` a
    /// missing user aborts the transaction, otherwise the fragment writes nothing for a
    /// missing user.
    fn build_append_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        slot: &str,
        event_id: &str,
        event: &ReputationAppend,
        required: bool,
    ) -> Query<'b, any::Any>;
}
