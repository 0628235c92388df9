use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::entities::money::{Amount, Currency};
use crate::entities::string_set::StringSet;
use crate::entities::task::{Difficulty, Task, TaskStatus};
use crate::middleware::error::AppResult;

#[derive(Debug, Clone)]
pub struct TaskCreate {
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_hours: i64,
    pub tags: StringSet,
    pub skills_required: StringSet,
}

#[derive(Debug, Clone)]
pub struct BountyUpdate {
    pub amount: Amount,
    pub currency: Currency,
    pub escrow_id: String,
}

#[async_trait]
pub trait TaskRepositoryInterface {
    async fn create(&self, data: TaskCreate) -> AppResult<Task>;
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Task>>;
    async fn list(
        &self,
        project_id: Option<&str>,
        status: Option<TaskStatus>,
    ) -> AppResult<Vec<Task>>;
    async fn update_status(
        &self,
        id: &str,
        expected: TaskStatus,
        status: TaskStatus,
    ) -> AppResult<Option<Task>>;

    /// Takes the escrow lock while the task still holds `escrow_id`. With `require_settled`
    /// the lock is refused while a verified contribution of the task is unpaid.
    async fn reserve_escrow(
        &self,
        id: &str,
        escrow_id: &str,
        lock_secs: u64,
        require_settled: bool,
    ) -> AppResult<bool>;
    async fn clear_escrow_lock(&self, id: &str, escrow_id: &str) -> AppResult<()>;

    /// Moves the task from `expected` to `to`, throws when the stored status differs.
    fn build_transition_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        expected: TaskStatus,
        to: TaskStatus,
        next_cycle: bool,
    ) -> Query<'b, any::Any>;

    /// Replaces the bounty while the task still holds `expected_escrow`.
    fn build_set_bounty_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        expected_status: TaskStatus,
        expected_escrow: Option<&str>,
        bounty: &BountyUpdate,
    ) -> Query<'b, any::Any>;

    fn build_clear_escrow_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        escrow_id: &str,
        reset_bounty: bool,
    ) -> Query<'b, any::Any>;

    /// Throws while a release or refund holds the escrow lock.
    fn build_escrow_idle_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
    ) -> Query<'b, any::Any>;
}
