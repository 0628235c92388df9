use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::entities::money::{Amount, Currency};
use crate::entities::payment::{Payment, PaymentStatus, PaymentType};
use crate::middleware::error::AppResult;

#[derive(Debug, Clone)]
pub struct PaymentCreate {
    pub user_id: String,
    pub task_id: Option<String>,
    pub contribution_id: Option<String>,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub amount: Amount,
    pub currency: Currency,
    pub external_tx_id: String,
    pub gateway: String,
    pub notes: Option<String>,
}

#[async_trait]
pub trait PaymentRepositoryInterface {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Payment>>;
    /// Newest first.
    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Payment>>;
    async fn list_by_task(&self, task_id: &str) -> AppResult<Vec<Payment>>;

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        slot: &str,
        id: &str,
        data: &PaymentCreate,
    ) -> Query<'b, any::Any>;

    fn build_set_status_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        slot: &str,
        external_tx_id: &str,
        payment_type: PaymentType,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Query<'b, any::Any>;
}
