use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::database::client::Database;
use crate::database::repositories::user_repo::{EMAIL_INDEX, USERNAME_INDEX};
use crate::database::surrdb_utils::thing;
use crate::entities::project::{Project, Visibility, TABLE_NAME as PROJECT_TABLE_NAME};
use crate::entities::string_set::StringSet;
use crate::entities::user::{User, TABLE_NAME as USER_TABLE_NAME};
use crate::interfaces::repositories::project::{ProjectCreate, ProjectRepositoryInterface};
use crate::interfaces::repositories::user::{UserCreate, UserRepositoryInterface};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 3, max = 32, message = "Username must be 3 to 32 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 3, max = 120, message = "Title must be 3 to 120 characters"))]
    pub title: String,
    #[validate(length(max = 500))]
    pub short_desc: String,
    #[validate(url)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
}

pub struct UserService<'a> {
    db: &'a Database,
    ctx: &'a Ctx,
}

impl<'a> UserService<'a> {
    pub fn new(db: &'a Database, ctx: &'a Ctx) -> Self {
        Self { db, ctx }
    }

    pub async fn create_user(&self, input: UserInput) -> AppResult<User> {
        input.validate()?;
        let roles = StringSet::from_items(&input.roles)?;
        let user = self
            .db
            .users
            .create(UserCreate {
                username: input.username.trim().to_string(),
                email: input.email.trim().to_lowercase(),
                avatar_url: input.avatar_url,
                roles,
            })
            .await
            .map_err(|err| match &err {
                AppError::SurrealDb { source } if source.contains(USERNAME_INDEX) => {
                    AppError::ValidationErrors {
                        value: "username already taken".to_string(),
                    }
                }
                AppError::SurrealDb { source } if source.contains(EMAIL_INDEX) => {
                    AppError::ValidationErrors {
                        value: "email already registered".to_string(),
                    }
                }
                _ => err,
            })?;
        info!(req_id = %self.ctx.req_id(), "created user {}", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<User> {
        self.db
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, user_id).to_raw(),
            })
    }

    pub async fn create_project(&self, owner_id: &str, input: ProjectInput) -> AppResult<Project> {
        input.validate()?;
        let tags = StringSet::from_items(&input.tags)?;
        if !self.db.users.exists(owner_id).await? {
            return Err(AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, owner_id).to_raw(),
            });
        }
        let project = self
            .db
            .projects
            .create(ProjectCreate {
                owner_id: owner_id.to_string(),
                title: input.title.trim().to_string(),
                short_desc: input.short_desc,
                repo_url: input.repo_url,
                tags,
                visibility: input.visibility,
            })
            .await?;
        info!(req_id = %self.ctx.req_id(), "created project {} for {owner_id}", project.id);
        Ok(project)
    }

    pub async fn get_project(&self, project_id: &str) -> AppResult<Project> {
        self.db
            .projects
            .get_by_id(project_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(PROJECT_TABLE_NAME, project_id).to_raw(),
            })
    }

    pub async fn list_projects(&self, owner_id: Option<&str>) -> AppResult<Vec<Project>> {
        self.db.projects.list(owner_id).await
    }
}
