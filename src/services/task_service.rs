use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::database::client::Database;
use crate::database::surrdb_utils::thing;
use crate::entities::project::TABLE_NAME as PROJECT_TABLE_NAME;
use crate::entities::string_set::StringSet;
use crate::entities::task::{Difficulty, Task, TaskStatus, TABLE_NAME};
use crate::interfaces::repositories::project::ProjectRepositoryInterface;
use crate::interfaces::repositories::task::{TaskCreate, TaskRepositoryInterface};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct TaskInput {
    #[validate(length(min = 3, max = 200, message = "Title must be 3 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: String,
    pub difficulty: Difficulty,
    #[validate(range(min = 0, max = 10000))]
    pub estimated_hours: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub skills_required: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<String>,
    pub status: Option<TaskStatus>,
}

pub struct TaskService<'a> {
    db: &'a Database,
    ctx: &'a Ctx,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a Database, ctx: &'a Ctx) -> Self {
        Self { db, ctx }
    }

    pub async fn create_task(&self, project_id: &str, input: TaskInput) -> AppResult<Task> {
        input.validate()?;
        let tags = StringSet::from_items(&input.tags)?;
        let skills_required = StringSet::from_items(&input.skills_required)?;
        if self.db.projects.get_by_id(project_id).await?.is_none() {
            return Err(AppError::EntityFailIdNotFound {
                ident: thing(PROJECT_TABLE_NAME, project_id).to_raw(),
            });
        }
        let task = self
            .db
            .tasks
            .create(TaskCreate {
                project_id: project_id.to_string(),
                title: input.title.trim().to_string(),
                description: input.description,
                difficulty: input.difficulty,
                estimated_hours: input.estimated_hours,
                tags,
                skills_required,
            })
            .await?;
        info!(req_id = %self.ctx.req_id(), "created task {} in project {project_id}", task.id);
        Ok(task)
    }

    pub async fn get_task(&self, task_id: &str) -> AppResult<Task> {
        self.db
            .tasks
            .get_by_id(task_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(TABLE_NAME, task_id).to_raw(),
            })
    }

    pub async fn list_tasks(&self, filter: TaskFilter) -> AppResult<Vec<Task>> {
        self.db
            .tasks
            .list(filter.project_id.as_deref(), filter.status)
            .await
    }

    /// Administrative path to the terminal `archived` status.
    pub async fn archive_task(&self, task_id: &str) -> AppResult<Task> {
        let task = self.get_task(task_id).await?;
        let archived = task.status.archive()?;
        let updated = self
            .db
            .tasks
            .update_status(task_id, task.status, archived)
            .await?;
        match updated {
            Some(task) => {
                info!(req_id = %self.ctx.req_id(), "archived task {task_id} by {}", self.ctx.actor());
                Ok(task)
            }
            None => {
                let current = self.get_task(task_id).await?;
                Err(AppError::InvalidTransition {
                    from: current.status,
                    to: archived,
                })
            }
        }
    }
}
