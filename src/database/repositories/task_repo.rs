use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::database::client::Db;
use crate::database::surrdb_utils::{
    classify_error, new_record_key, quoted_variants, thing, TxFailure, THROW_ESCROW_BUSY,
    THROW_ESCROW_CHANGED, THROW_TASK_STATE_CHANGED,
};
use crate::entities::contribution::{VerificationStatus, TABLE_NAME as CONTRIBUTION_TABLE_NAME};
use crate::entities::money::DEFAULT_CURRENCY;
use crate::entities::project::TABLE_NAME as PROJECT_TABLE_NAME;
use crate::entities::task::{Difficulty, Task, TaskStatus, TABLE_NAME};
use crate::interfaces::repositories::task::{BountyUpdate, TaskCreate, TaskRepositoryInterface};
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug)]
pub struct TaskRepository {
    client: Arc<Db>,
}

impl TaskRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let statuses = quoted_variants::<TaskStatus>();
        let difficulties = quoted_variants::<Difficulty>();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS project ON TABLE {TABLE_NAME} TYPE record<{PROJECT_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS title ON TABLE {TABLE_NAME} TYPE string ASSERT string::len(string::trim($value)) > 0;
    DEFINE FIELD IF NOT EXISTS description ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS difficulty ON TABLE {TABLE_NAME} TYPE string ASSERT $value INSIDE [{difficulties}];
    DEFINE FIELD IF NOT EXISTS estimated_hours ON TABLE {TABLE_NAME} TYPE int ASSERT $value >= 0;
    DEFINE FIELD IF NOT EXISTS tags ON TABLE {TABLE_NAME} TYPE array<string> DEFAULT [];
    DEFINE FIELD IF NOT EXISTS skills_required ON TABLE {TABLE_NAME} TYPE array<string> DEFAULT [];
    DEFINE FIELD IF NOT EXISTS bounty_amount ON TABLE {TABLE_NAME} TYPE int DEFAULT 0 ASSERT $value >= 0;
    DEFINE FIELD IF NOT EXISTS bounty_currency ON TABLE {TABLE_NAME} TYPE string DEFAULT '{DEFAULT_CURRENCY}';
    DEFINE FIELD IF NOT EXISTS bounty_escrow_id ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS escrow_lock ON TABLE {TABLE_NAME} TYPE option<datetime>;
    DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string ASSERT $value INSIDE [{statuses}];
    DEFINE FIELD IF NOT EXISTS submission_cycle ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE FIELD IF NOT EXISTS updated_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE time::now();
    DEFINE INDEX IF NOT EXISTS task_project_idx ON TABLE {TABLE_NAME} COLUMNS project;
    DEFINE INDEX IF NOT EXISTS task_status_idx ON TABLE {TABLE_NAME} COLUMNS status;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepositoryInterface for TaskRepository {
    async fn create(&self, data: TaskCreate) -> AppResult<Task> {
        let mut res = self
            .client
            .query(
                "CREATE ONLY $id SET
                project=$project,
                title=$title,
                description=$description,
                difficulty=$difficulty,
                estimated_hours=$estimated_hours,
                tags=$tags,
                skills_required=$skills_required,
                status=$status;",
            )
            .bind(("id", thing(TABLE_NAME, &new_record_key())))
            .bind(("project", thing(PROJECT_TABLE_NAME, &data.project_id)))
            .bind(("title", data.title))
            .bind(("description", data.description))
            .bind(("difficulty", data.difficulty))
            .bind(("estimated_hours", data.estimated_hours))
            .bind(("tags", Vec::<String>::from(data.tags)))
            .bind(("skills_required", Vec::<String>::from(data.skills_required)))
            .bind(("status", TaskStatus::Open))
            .await?;

        res.take::<Option<Task>>(0)?
            .ok_or_else(|| AppError::Generic {
                description: "task was not created".to_string(),
            })
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Task>> {
        let task: Option<Task> = self.client.select((TABLE_NAME, id)).await?;
        Ok(task)
    }

    async fn list(
        &self,
        project_id: Option<&str>,
        status: Option<TaskStatus>,
    ) -> AppResult<Vec<Task>> {
        let mut conditions = vec![];
        if project_id.is_some() {
            conditions.push("project=$project");
        }
        if status.is_some() {
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
        if let Some(project) = project_id {
            query = query.bind(("project", thing(PROJECT_TABLE_NAME, project)));
        }
        if let Some(status) = status {
            query = query.bind(("status", status));
        }
        let mut res = query.await?;
        Ok(res.take::<Vec<Task>>(0)?)
    }

    async fn update_status(
        &self,
        id: &str,
        expected: TaskStatus,
        status: TaskStatus,
    ) -> AppResult<Option<Task>> {
        let mut res = self
            .client
            .query("UPDATE $id SET status=$status WHERE status=$expected RETURN AFTER;")
            .bind(("id", thing(TABLE_NAME, id)))
            .bind(("status", status))
            .bind(("expected", expected))
            .await?;
        let updated = res.take::<Vec<Task>>(0)?;
        Ok(updated.into_iter().next())
    }

    async fn reserve_escrow(
        &self,
        id: &str,
        escrow_id: &str,
        lock_secs: u64,
        require_settled: bool,
    ) -> AppResult<bool> {
        let settled = if require_settled {
            format!(
                "AND array::len((SELECT VALUE id FROM {CONTRIBUTION_TABLE_NAME}
                    WHERE task = $task AND verification_status IN $verified AND payment_id = NONE)) = 0"
            )
        } else {
            String::new()
        };
        let mut res = self
            .client
            .query(format!(
                "UPDATE $task SET escrow_lock = time::now() + {lock_secs}s
                WHERE bounty_escrow_id = $escrow
                    AND (escrow_lock = NONE OR escrow_lock < time::now())
                    {settled}
                RETURN AFTER;"
            ))
            .bind(("task", thing(TABLE_NAME, id)))
            .bind(("escrow", escrow_id.to_string()))
            .bind((
                "verified",
                vec![
                    VerificationStatus::AutoVerified,
                    VerificationStatus::ManualVerified,
                ],
            ))
            .await?;
        match res.take::<Vec<Task>>(0) {
            Ok(reserved) => Ok(!reserved.is_empty()),
            Err(err) => match classify_error(&err) {
                Some(TxFailure::Conflict) => Ok(false),
                _ => Err(err.into()),
            },
        }
    }

    async fn clear_escrow_lock(&self, id: &str, escrow_id: &str) -> AppResult<()> {
        self.client
            .query("UPDATE $task SET escrow_lock = NONE WHERE bounty_escrow_id = $escrow;")
            .bind(("task", thing(TABLE_NAME, id)))
            .bind(("escrow", escrow_id.to_string()))
            .await?
            .check()?;
        Ok(())
    }

    fn build_transition_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        expected: TaskStatus,
        to: TaskStatus,
        next_cycle: bool,
    ) -> Query<'b, any::Any> {
        let cycle = if next_cycle {
            ", submission_cycle += 1"
        } else {
            ""
        };
        query
            .query(format!(
                "LET $_task_moved = UPDATE $_task_id SET status=$_task_to{cycle} WHERE status=$_task_expected;
                IF array::len($_task_moved) == 0 {{ THROW \"{THROW_TASK_STATE_CHANGED}\" }};"
            ))
            .bind(("_task_id", thing(TABLE_NAME, id)))
            .bind(("_task_to", to))
            .bind(("_task_expected", expected))
    }

    fn build_set_bounty_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        expected_status: TaskStatus,
        expected_escrow: Option<&str>,
        bounty: &BountyUpdate,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_task_funded = UPDATE $_task_bounty_id SET
                    bounty_amount=$_task_bounty_amount,
                    bounty_currency=$_task_bounty_currency,
                    bounty_escrow_id=$_task_bounty_escrow,
                    escrow_lock=NONE
                WHERE status=$_task_bounty_status
                    AND bounty_escrow_id=$_task_bounty_prior
                    AND (escrow_lock = NONE OR escrow_lock < time::now());
                IF array::len($_task_funded) == 0 {{ THROW \"{THROW_ESCROW_CHANGED}\" }};"
            ))
            .bind(("_task_bounty_id", thing(TABLE_NAME, id)))
            .bind(("_task_bounty_amount", bounty.amount))
            .bind(("_task_bounty_currency", bounty.currency.clone()))
            .bind(("_task_bounty_escrow", bounty.escrow_id.clone()))
            .bind(("_task_bounty_status", expected_status))
            .bind(("_task_bounty_prior", expected_escrow.map(str::to_string)))
    }

    fn build_clear_escrow_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
        escrow_id: &str,
        reset_bounty: bool,
    ) -> Query<'b, any::Any> {
        let reset = if reset_bounty { ", bounty_amount=0" } else { "" };
        query
            .query(format!(
                "LET $_task_released = UPDATE $_task_escrow_task SET bounty_escrow_id=NONE, escrow_lock=NONE{reset}
                WHERE bounty_escrow_id=$_task_escrow_ref;
                IF array::len($_task_released) == 0 {{ THROW \"{THROW_ESCROW_CHANGED}\" }};"
            ))
            .bind(("_task_escrow_task", thing(TABLE_NAME, id)))
            .bind(("_task_escrow_ref", escrow_id.to_string()))
    }

    fn build_escrow_idle_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        id: &str,
    ) -> Query<'b, any::Any> {
        query
            .query(format!(
                "LET $_task_idle = UPDATE $_task_idle_id SET escrow_lock=NONE
                WHERE escrow_lock = NONE OR escrow_lock < time::now();
                IF array::len($_task_idle) == 0 {{ THROW \"{THROW_ESCROW_BUSY}\" }};"
            ))
            .bind(("_task_idle_id", thing(TABLE_NAME, id)))
    }
}
