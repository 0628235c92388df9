use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::database::client::Db;
use crate::database::surrdb_utils::{
    classify_error, quoted_variants, thing, TxFailure, THROW_CONTRIBUTION_ALREADY_PAID,
    THROW_CONTRIBUTION_STATE_CHANGED,
};
use crate::entities::contribution::{Contribution, VerificationStatus, TABLE_NAME};
use crate::entities::money::Amount;
use crate::entities::payment::TABLE_NAME as PAYMENT_TABLE_NAME;
use crate::entities::task::TABLE_NAME as TASK_TABLE_NAME;
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::repositories::contribution::{
    ContributionFilter, ContributionRepositoryInterface,
};
use crate::middleware::error::{AppError, AppResult};

pub const TASK_USER_CYCLE_INDEX: &str = "contribution_task_user_cycle_idx";

const VERIFIED: [VerificationStatus; 2] = [
    VerificationStatus::AutoVerified,
    VerificationStatus::ManualVerified,
];

#[derive(Debug)]
pub struct ContributionRepository {
    client: Arc<Db>,
}

impl ContributionRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let statuses = quoted_variants::<VerificationStatus>();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS task ON TABLE {TABLE_NAME} TYPE record<{TASK_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS user ON TABLE {TABLE_NAME} TYPE record<{USER_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS reference ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS verification_status ON TABLE {TABLE_NAME} TYPE string ASSERT $value INSIDE [{statuses}];
    DEFINE FIELD IF NOT EXISTS payout_amount ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS payment_id ON TABLE {TABLE_NAME} TYPE option<record<{PAYMENT_TABLE_NAME}>> ASSERT $before = NONE OR $value = $before;
    DEFINE FIELD IF NOT EXISTS accepted_at ON TABLE {TABLE_NAME} TYPE option<datetime>;
    DEFINE FIELD IF NOT EXISTS rejection_reason ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS cycle ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS release_lock ON TABLE {TABLE_NAME} TYPE option<datetime>;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS {TASK_USER_CYCLE_INDEX} ON TABLE {TABLE_NAME} COLUMNS task, user, cycle UNIQUE;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ContributionRepositoryInterface for ContributionRepository {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Contribution>> {
        let contribution: Option<Contribution> = self.client.select((TABLE_NAME, id)).await?;
        Ok(contribution)
    }

    async fn find_in_cycle(
        &self,
        task_id: &str,
        user_id: &str,
        cycle: i64,
    ) -> AppResult<Option<Contribution>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE task=$task AND user=$user AND cycle=$cycle LIMIT 1;"
            ))
            .bind(("task", thing(TASK_TABLE_NAME, task_id)))
            .bind(("user", thing(USER_TABLE_NAME, user_id)))
            .bind(("cycle", cycle))
            .await?;
        let found = res.take::<Vec<Contribution>>(0)?;
        Ok(found.into_iter().next())
    }

    async fn list(&self, filter: &ContributionFilter) -> AppResult<Vec<Contribution>> {
        let mut conditions = vec![];
        if filter.task_id.is_some() {
            conditions.push("task=$task");
        }
        if filter.user_id.is_some() {
            conditions.push("user=$user");
        }
        if filter.status.is_some() {
            conditions.push("verification_status=$status");
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
        Ok(res.take::<Vec<Contribution>>(0)?)
    }

    async fn list_pending_release(&self, limit: u32) -> AppResult<Vec<Contribution>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME}
                WHERE verification_status IN $verified
                    AND payment_id = NONE
                    AND task.bounty_escrow_id != NONE
                    AND (release_lock = NONE OR release_lock < time::now())
                ORDER BY created_at ASC LIMIT {limit};"
            ))
            .bind(("verified", VERIFIED.to_vec()))
            .await?;
        Ok(res.take::<Vec<Contribution>>(0)?)
    }

    async fn reserve_release(&self, id: &str, lock_secs: u64) -> AppResult<bool> {
        let mut res = self
            .client
            .query(format!(
                "UPDATE $id SET release_lock = time::now() + {lock_secs}s
                WHERE payment_id = NONE
                    AND verification_status IN $verified
                    AND (release_lock = NONE OR release_lock < time::now())
                RETURN AFTER;"
            ))
            .bind(("id", thing(TABLE_NAME, id)))
            .bind(("verified", VERIFIED.to_vec()))
            .await?;
        match res.take::<Vec<Contribution>>(0) {
            Ok(reserved) => Ok(!reserved.is_empty()),
            Err(err) => match classify_error(&err) {
                Some(TxFailure::Conflict) => Ok(false),
                _ => Err(err.into()),
            },
        }
    }

    async fn clear_release_lock(&self, id: &str) -> AppResult<()> {
        self.client
            .query("UPDATE $id SET release_lock = NONE WHERE payment_id = NONE;")
            .bind(("id", thing(TABLE_NAME, id)))
            .await?
            .check()?;
        Ok(())
    }

    fn build_create_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        task_id: &str,
        user_id: &str,
        reference: &str,
        cycle: i64,
    ) -> Query<'b, any::Any> {
        query
            .query(
                "CREATE $_contribution_id SET
                task=$_contribution_task,
                user=$_contribution_user,
                reference=$_contribution_reference,
                verification_status=$_contribution_status,
                cycle=$_contribution_cycle;",
            )
            .bind(("_contribution_id", thing(TABLE_NAME, id)))
            .bind(("_contribution_task", thing(TASK_TABLE_NAME, task_id)))
            .bind(("_contribution_user", thing(USER_TABLE_NAME, user_id)))
            .bind(("_contribution_reference", reference.to_string()))
            .bind(("_contribution_status", VerificationStatus::Unverified))
            .bind(("_contribution_cycle", cycle))
    }

    fn build_verify_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        status: VerificationStatus,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_contribution_verified = UPDATE $_contribution_verify_id SET
                    verification_status=$_contribution_verify_status,
                    accepted_at=time::now(),
                    rejection_reason=NONE
                WHERE verification_status=$_contribution_unverified;
                IF array::len($_contribution_verified) == 0 {{ THROW \"{THROW_CONTRIBUTION_STATE_CHANGED}\" }};"
            ))
            .bind(("_contribution_verify_id", thing(TABLE_NAME, id)))
            .bind(("_contribution_verify_status", status))
            .bind(("_contribution_unverified", VerificationStatus::Unverified))
    }

    fn build_reject_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        reason: &str,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_contribution_rejected = UPDATE $_contribution_reject_id SET
                    verification_status=$_contribution_reject_status,
                    accepted_at=NONE,
                    rejection_reason=$_contribution_reject_reason
                WHERE verification_status=$_contribution_reject_from;
                IF array::len($_contribution_rejected) == 0 {{ THROW \"{THROW_CONTRIBUTION_STATE_CHANGED}\" }};"
            ))
            .bind(("_contribution_reject_id", thing(TABLE_NAME, id)))
            .bind(("_contribution_reject_status", VerificationStatus::Rejected))
            .bind(("_contribution_reject_reason", reason.to_string()))
            .bind(("_contribution_reject_from", VerificationStatus::Unverified))
    }

    fn build_link_payment_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        payment_id: &str,
        amount: Amount,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_contribution_paid = UPDATE $_contribution_pay_id SET
                    payment_id=$_contribution_payment,
                    payout_amount=$_contribution_payout,
                    release_lock=NONE
                WHERE payment_id = NONE;
                IF array::len($_contribution_paid) == 0 {{ THROW \"{THROW_CONTRIBUTION_ALREADY_PAID}\" }};"
            ))
            .bind(("_contribution_pay_id", thing(TABLE_NAME, id)))
            .bind(("_contribution_payment", thing(PAYMENT_TABLE_NAME, payment_id)))
            .bind(("_contribution_payout", amount))
    }
}
