use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::entities::contribution::{Contribution, VerificationStatus};
use crate::entities::money::Amount;
use crate::middleware::error::AppResult;

#[derive(Debug, Clone, Default)]
pub struct ContributionFilter {
    pub task_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<VerificationStatus>,
}

#[async_trait]
pub trait ContributionRepositoryInterface {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Contribution>>;
    async fn find_in_cycle(
        &self,
        task_id: &str,
        user_id: &str,
        cycle: i64,
    ) -> AppResult<Option<Contribution>>;
    async fn list(&self, filter: &ContributionFilter) -> AppResult<Vec<Contribution>>;
    /// Verified, unpaid contributions whose task still holds an escrow.
    async fn list_pending_release(&self, limit: u32) -> AppResult<Vec<Contribution>>;
    /// Returns false when another release holds the lock or a payment is linked.
    async fn reserve_release(&self, id: &str, lock_secs: u64) -> AppResult<bool>;
    async fn clear_release_lock(&self, id: &str) -> AppResult<()>;

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        task_id: &str,
        user_id: &str,
        reference: &str,
        cycle: i64,
    ) -> Query<'b, any::Any>;

    fn build_verify_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        status: VerificationStatus,
    ) -> Query<'b, any::Any>;

    fn build_reject_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        reason: &str,
    ) -> Query<'b, any::Any>;

    /// Links the payout, throws when a payment is already linked.
    fn build_link_payment_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        payment_id: &str,
        amount: Amount,
    ) -> Query<'b, any::Any>;
}
