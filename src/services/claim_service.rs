use tracing::{debug, info};

use crate::database::client::Database;
use crate::database::repositories::claim_repo::TASK_USER_INDEX;
use crate::database::surrdb_utils::{new_record_key, thing, TxFailure, THROW_TASK_STATE_CHANGED};
use crate::entities::claim::{Claim, TABLE_NAME};
use crate::entities::task::{Task, TaskStatus, TABLE_NAME as TASK_TABLE_NAME};
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::repositories::claim::{ClaimFilter, ClaimRepositoryInterface};
use crate::interfaces::repositories::task::TaskRepositoryInterface;
use crate::interfaces::repositories::user::UserRepositoryInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, AppResult};

/// Keeps at most one active claim per task and one claim per (task, user).
pub struct ClaimService<'a> {
    db: &'a Database,
    ctx: &'a Ctx,
}

impl<'a> ClaimService<'a> {
    pub fn new(db: &'a Database, ctx: &'a Ctx) -> Self {
        Self { db, ctx }
    }

    pub async fn create_claim(&self, task_id: &str, user_id: &str) -> AppResult<Claim> {
        self.create(task_id, user_id, None).await
    }

    pub async fn create_mentored_claim(
        &self,
        task_id: &str,
        user_id: &str,
        mentor_id: &str,
    ) -> AppResult<Claim> {
        self.create(task_id, user_id, Some(mentor_id)).await
    }

    pub async fn get_claim(&self, claim_id: &str) -> AppResult<Claim> {
        self.db
            .claims
            .get_by_id(claim_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(TABLE_NAME, claim_id).to_raw(),
            })
    }

    pub async fn list_claims(&self, filter: ClaimFilter) -> AppResult<Vec<Claim>> {
        self.db.claims.list(&filter).await
    }

    async fn create(
        &self,
        task_id: &str,
        user_id: &str,
        mentor_id: Option<&str>,
    ) -> AppResult<Claim> {
        self.ensure_user(user_id).await?;
        if let Some(mentor_id) = mentor_id {
            self.ensure_user(mentor_id).await?;
        }
        let task = self.get_task(task_id).await?;

        if self.db.claims.find(task_id, user_id).await?.is_some() {
            return Err(AppError::DuplicateClaim {
                task_id: task_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        if !task.status.accepts_claims() {
            return Err(AppError::TaskNotOpen {
                task_id: task_id.to_string(),
                current: task.status,
            });
        }
        let claimed = task.status.transition_to(TaskStatus::Claimed)?;

        let claim_id = new_record_key();
        let committed = self
            .db
            .run_transaction(|q| {
                let q = self.db.tasks.build_transition_query(
                    q,
                    task_id,
                    TaskStatus::Open,
                    claimed,
                    false,
                );
                self.db
                    .claims
                    .build_create_query(q, &claim_id, task_id, user_id, mentor_id)
            })
            .await;

        if let Err(failure) = committed {
            return Err(self.map_failure(failure, task_id, user_id).await);
        }

        info!(
            req_id = %self.ctx.req_id(),
            "user {user_id} claimed task {task_id} with claim {claim_id}"
        );
        self.get_claim(&claim_id).await
    }

    async fn map_failure(&self, failure: TxFailure, task_id: &str, user_id: &str) -> AppError {
        if failure.is_index(TASK_USER_INDEX) {
            return AppError::DuplicateClaim {
                task_id: task_id.to_string(),
                user_id: user_id.to_string(),
            };
        }
        let lost_race =
            failure.is_thrown(THROW_TASK_STATE_CHANGED) || failure == TxFailure::Conflict;
        if lost_race {
            debug!(req_id = %self.ctx.req_id(), "lost claim race on task {task_id}");
            return match self.get_task(task_id).await {
                Ok(task) if failure == TxFailure::Conflict && task.status.accepts_claims() => {
                    failure.into()
                }
                Ok(task) => AppError::TaskNotOpen {
                    task_id: task_id.to_string(),
                    current: task.status,
                },
                Err(err) => err,
            };
        }
        failure.into()
    }

    async fn get_task(&self, task_id: &str) -> AppResult<Task> {
        self.db
            .tasks
            .get_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(TASK_TABLE_NAME, task_id).to_raw(),
            })
    }

    async fn ensure_user(&self, user_id: &str) -> AppResult<()> {
        if self.db.users.exists(user_id).await? {
            Ok(())
        } else {
            Err(AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, user_id).to_raw(),
            })
        }
    }
}
