use std::sync::Arc;

use async_trait::async_trait;

use crate::database::client::Db;
use crate::database::surrdb_utils::{new_record_key, thing};
use crate::entities::user::{User, TABLE_NAME};
use crate::interfaces::repositories::user::{UserCreate, UserRepositoryInterface};
use crate::middleware::error::{AppError, AppResult};

pub const USERNAME_INDEX: &str = "user_username_idx";
pub const EMAIL_INDEX: &str = "user_email_idx";

#[derive(Debug)]
pub struct UserRepository {
    client: Arc<Db>,
}

impl UserRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS username ON TABLE {TABLE_NAME} TYPE string ASSERT string::len(string::trim($value)) > 0;
    DEFINE FIELD IF NOT EXISTS email ON TABLE {TABLE_NAME} TYPE string ASSERT string::is::email($value);
    DEFINE FIELD IF NOT EXISTS avatar_url ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS reputation_score ON TABLE {TABLE_NAME} TYPE int DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS roles ON TABLE {TABLE_NAME} TYPE array<string> DEFAULT [];
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS {USERNAME_INDEX} ON TABLE {TABLE_NAME} COLUMNS username UNIQUE;
    DEFINE INDEX IF NOT EXISTS {EMAIL_INDEX} ON TABLE {TABLE_NAME} COLUMNS email UNIQUE;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn create(&self, data: UserCreate) -> AppResult<User> {
        let mut res = self
            .client
            .query(
                "CREATE ONLY $id SET
                username=$username,
                email=$email,
                avatar_url=$avatar_url,
                roles=$roles;",
            )
            .bind(("id", thing(TABLE_NAME, &new_record_key())))
            .bind(("username", data.username))
            .bind(("email", data.email))
            .bind(("avatar_url", data.avatar_url))
            .bind(("roles", Vec::<String>::from(data.roles)))
            .await?;

        res.take::<Option<User>>(0)?
            .ok_or_else(|| AppError::Generic {
                description: "user was not created".to_string(),
            })
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<User>> {
        let user: Option<User> = self.client.select((TABLE_NAME, id)).await?;
        Ok(user)
    }

    async fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }
}
