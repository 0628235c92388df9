use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::database::client::Db;
use crate::database::surrdb_utils::{quoted_variants, thing};
use crate::entities::contribution::TABLE_NAME as CONTRIBUTION_TABLE_NAME;
use crate::entities::payment::{Payment, PaymentStatus, PaymentType, TABLE_NAME};
use crate::entities::task::TABLE_NAME as TASK_TABLE_NAME;
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::repositories::payment::{PaymentCreate, PaymentRepositoryInterface};
use crate::middleware::error::{AppError, AppResult};

pub const EXTERNAL_TX_INDEX: &str = "payment_external_tx_idx";

#[derive(Debug)]
pub struct PaymentRepository {
    client: Arc<Db>,
}

impl PaymentRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let types = quoted_variants::<PaymentType>();
        let statuses = quoted_variants::<PaymentStatus>();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS user ON TABLE {TABLE_NAME} TYPE record<{USER_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS task ON TABLE {TABLE_NAME} TYPE option<record<{TASK_TABLE_NAME}>>;
    DEFINE FIELD IF NOT EXISTS contribution ON TABLE {TABLE_NAME} TYPE option<record<{CONTRIBUTION_TABLE_NAME}>>;
    DEFINE FIELD IF NOT EXISTS type ON TABLE {TABLE_NAME} TYPE string READONLY ASSERT $value INSIDE [{types}];
    DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string ASSERT $value INSIDE [{statuses}];
    DEFINE FIELD IF NOT EXISTS amount ON TABLE {TABLE_NAME} TYPE int READONLY ASSERT $value > 0;
    DEFINE FIELD IF NOT EXISTS currency ON TABLE {TABLE_NAME} TYPE string READONLY;
    DEFINE FIELD IF NOT EXISTS external_tx_id ON TABLE {TABLE_NAME} TYPE string READONLY;
    DEFINE FIELD IF NOT EXISTS gateway ON TABLE {TABLE_NAME} TYPE string READONLY;
    DEFINE FIELD IF NOT EXISTS notes ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS {EXTERNAL_TX_INDEX} ON TABLE {TABLE_NAME} COLUMNS external_tx_id UNIQUE;
    DEFINE INDEX IF NOT EXISTS payment_user_idx ON TABLE {TABLE_NAME} COLUMNS user;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl PaymentRepositoryInterface for PaymentRepository {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Payment>> {
        let payment: Option<Payment> = self.client.select((TABLE_NAME, id)).await?;
        Ok(payment)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<Payment>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE user=$user ORDER BY created_at DESC;"
            ))
            .bind(("user", thing(USER_TABLE_NAME, user_id)))
            .await?;
        Ok(res.take::<Vec<Payment>>(0)?)
    }

    async fn list_by_task(&self, task_id: &str) -> AppResult<Vec<Payment>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE task=$task ORDER BY created_at ASC;"
            ))
            .bind(("task", thing(TASK_TABLE_NAME, task_id)))
            .await?;
        Ok(res.take::<Vec<Payment>>(0)?)
    }

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        slot: &str,
        id: &str,
        data: &PaymentCreate,
    ) -> Query<'b, any::Any> {
        let p = format!("_payment_{slot}");
        query
            .query(format!(
                "CREATE ${p}_id SET
                user=${p}_user,
                task=${p}_task,
                contribution=${p}_contribution,
                type=${p}_type,
                status=${p}_status,
                amount=${p}_amount,
                currency=${p}_currency,
                external_tx_id=${p}_external_tx_id,
                gateway=${p}_gateway,
                notes=${p}_notes;"
            ))
            .bind((format!("{p}_id"), thing(TABLE_NAME, id)))
            .bind((format!("{p}_user"), thing(USER_TABLE_NAME, &data.user_id)))
            .bind((
                format!("{p}_task"),
                data.task_id.as_deref().map(|t| thing(TASK_TABLE_NAME, t)),
            ))
            .bind((
                format!("{p}_contribution"),
                data.contribution_id
                    .as_deref()
                    .map(|c| thing(CONTRIBUTION_TABLE_NAME, c)),
            ))
            .bind((format!("{p}_type"), data.payment_type))
            .bind((format!("{p}_status"), data.status))
            .bind((format!("{p}_amount"), data.amount))
            .bind((format!("{p}_currency"), data.currency.clone()))
            .bind((format!("{p}_external_tx_id"), data.external_tx_id.clone()))
            .bind((format!("{p}_gateway"), data.gateway.clone()))
            .bind((format!("{p}_notes"), data.notes.clone()))
    }

    fn build_set_status_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        slot: &str,
        external_tx_id: &str,
        payment_type: PaymentType,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Query<'b, any::Any> {
        let p = format!("_payment_{slot}");
        query
            .query(format!(
                "UPDATE {TABLE_NAME} SET status=${p}_to
                WHERE external_tx_id=${p}_tx AND type=${p}_type AND status=${p}_from;"
            ))
            .bind((format!("{p}_tx"), external_tx_id.to_string()))
            .bind((format!("{p}_type"), payment_type))
            .bind((format!("{p}_from"), from))
            .bind((format!("{p}_to"), to))
    }
}
