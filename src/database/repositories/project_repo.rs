use std::sync::Arc;

use async_trait::async_trait;

use crate::database::client::Db;
use crate::database::surrdb_utils::{new_record_key, quoted_variants, thing};
use crate::entities::project::{Project, Visibility, TABLE_NAME};
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::repositories::project::{ProjectCreate, ProjectRepositoryInterface};
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug)]
pub struct ProjectRepository {
    client: Arc<Db>,
}

impl ProjectRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let visibility = quoted_variants::<Visibility>();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS owner ON TABLE {TABLE_NAME} TYPE record<{USER_TABLE_NAME}>;
    DEFINE FIELD IF NOT EXISTS title ON TABLE {TABLE_NAME} TYPE string ASSERT string::len(string::trim($value)) > 0;
    DEFINE FIELD IF NOT EXISTS short_desc ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS repo_url ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS tags ON TABLE {TABLE_NAME} TYPE array<string> DEFAULT [];
    DEFINE FIELD IF NOT EXISTS visibility ON TABLE {TABLE_NAME} TYPE string ASSERT $value INSIDE [{visibility}];
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS project_owner_idx ON TABLE {TABLE_NAME} COLUMNS owner;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ProjectRepositoryInterface for ProjectRepository {
    async fn create(&self, data: ProjectCreate) -> AppResult<Project> {
        let mut res = self
            .client
            .query(
                "CREATE ONLY $id SET
                owner=$owner,
                title=$title,
                short_desc=$short_desc,
                repo_url=$repo_url,
                tags=$tags,
                visibility=$visibility;",
            )
            .bind(("id", thing(TABLE_NAME, &new_record_key())))
            .bind(("owner", thing(USER_TABLE_NAME, &data.owner_id)))
            .bind(("title", data.title))
            .bind(("short_desc", data.short_desc))
            .bind(("repo_url", data.repo_url))
            .bind(("tags", Vec::<String>::from(data.tags)))
            .bind(("visibility", data.visibility))
            .await?;

        res.take::<Option<Project>>(0)?
            .ok_or_else(|| AppError::Generic {
                description: "project was not created".to_string(),
            })
    }

    async fn get_by_id(&self, id: &str) -> AppResult<Option<Project>> {
        let project: Option<Project> = self.client.select((TABLE_NAME, id)).await?;
        Ok(project)
    }

    async fn list(&self, owner_id: Option<&str>) -> AppResult<Vec<Project>> {
        let mut res = match owner_id {
            Some(owner) => {
                self.client
                    .query(format!(
                        "SELECT * FROM {TABLE_NAME} WHERE owner=$owner ORDER BY created_at ASC;"
                    ))
                    .bind(("owner", thing(USER_TABLE_NAME, owner)))
                    .await?
            }
            None => {
                self.client
                    .query(format!("SELECT * FROM {TABLE_NAME} ORDER BY created_at ASC;"))
                    .await?
            }
        };
        Ok(res.take::<Vec<Project>>(0)?)
    }
}
