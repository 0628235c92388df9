use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::database::client::Db;
use crate::database::surrdb_utils::{quoted_variants, thing};
use crate::entities::claim::{Claim, ClaimStatus, TABLE_NAME};
use crate::entities::task::TABLE_NAME as TASK_TABLE_NAME;
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::repositories::claim::{ClaimFilter, ClaimRepositoryInterface};
use crate::middleware::error::{AppError, AppResult};

pub const TASK_USER_INDEX: &str = "claim_task_user_idx";

#[derive(Debug)]
pub struct ClaimRepository {
    client: Arc<Db>,
}

impl ClaimRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let statuses = quoted_variants::<ClaimStatus>();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS task ON TABLE {TABLE_NAME} TYPE record<{TASK_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS user ON TABLE {TABLE_NAME} TYPE record<{USER_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string ASSERT $value INSIDE [{statuses}];
    DEFINE FIELD IF NOT EXISTS mentor ON TABLE {TABLE_NAME} TYPE option<record<{USER_TABLE_NAME}>>;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS {TASK_USER_INDEX} ON TABLE {TABLE_NAME} COLUMNS task, user UNIQUE;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ClaimRepositoryInterface for ClaimRepository {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Claim>> {
        let claim: Option<Claim> = self.client.select((TABLE_NAME, id)).await?;
        Ok(claim)
    }

    async fn find(&self, task_id: &str, user_id: &str) -> AppResult<Option<Claim>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE task=$task AND user=$user LIMIT 1;"
            ))
            .bind(("task", thing(TASK_TABLE_NAME, task_id)))
            .bind(("user", thing(USER_TABLE_NAME, user_id)))
            .await?;
        let claims = res.take::<Vec<Claim>>(0)?;
        Ok(claims.into_iter().next())
    }

    async fn list(&self, filter: &ClaimFilter) -> AppResult<Vec<Claim>> {
        let mut conditions = vec![];
        if filter.task_id.is_some() {
            conditions.push("task=$task");
        }
        if filter.user_id.is_some() {
            conditions.push("user=$user");
        }
        if filter.status.is_some() {
            conditions.push("status=$status");
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut query = self.client.query(format!(
            "SELECT * FROM {TABLE_NAME} {where_clause} ORDER BY created_at ASC;"
        ));
        if let Some(task_id) = &filter.task_id {
            query = query.bind(("task", thing(TASK_TABLE_NAME, task_id)));
        }
        if let Some(user_id) = &filter.user_id {
            query = query.bind(("user", thing(USER_TABLE_NAME, user_id)));
        }
        if let Some(status) = filter.status {
            query = query.bind(("status", status));
        }
        let mut res = query.await?;
        Ok(res.take::<Vec<Claim>>(0)?)
    }

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        task_id: &str,
        user_id: &str,
        mentor_id: Option<&str>,
    ) -> Query<'b, any::Any> {
        query
            .query(
                "CREATE $_claim_id SET
                task=$_claim_task,
                user=$_claim_user,
                status=$_claim_status,
                mentor=$_claim_mentor;",
            )
            .bind(("_claim_id", thing(TABLE_NAME, id)))
            .bind(("_claim_task", thing(TASK_TABLE_NAME, task_id)))
            .bind(("_claim_user", thing(USER_TABLE_NAME, user_id)))
            .bind(("_claim_status", ClaimStatus::Pending))
            .bind(("_claim_mentor", mentor_id.map(|m| thing(USER_TABLE_NAME, m))))
    }

    fn build_accept_pending_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        task_id: &str,
        user_id: &str,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "UPDATE {TABLE_NAME} SET status=$_claim_accepted
                WHERE task=$_claim_acc_task AND user=$_claim_acc_user AND status=$_claim_pending;"
            ))
            .bind(("_claim_acc_task", thing(TASK_TABLE_NAME, task_id)))
            .bind(("_claim_acc_user", thing(USER_TABLE_NAME, user_id)))
            .bind(("_claim_accepted", ClaimStatus::Accepted))
            .bind(("_claim_pending", ClaimStatus::Pending))
    }
}
