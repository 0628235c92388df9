use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::engine::any;
use surrealdb::method::Query;

use crate::database::client::Db;
use crate::database::surrdb_utils::{quoted_variants, thing, THROW_USER_NOT_FOUND};
use crate::entities::reputation_event::{ReputationEvent, ReputationEventType, TABLE_NAME};
use crate::entities::user::{User, TABLE_NAME as USER_TABLE_NAME};
use crate::interfaces::repositories::reputation_event::{
    ReputationAppend, ReputationEventRepositoryInterface,
};
use crate::middleware::error::{AppError, AppResult};

#[derive(Debug)]
pub struct ReputationEventRepository {
    client: Arc<Db>,
}

impl ReputationEventRepository {
    pub fn new(client: Arc<Db>) -> Self {
        Self { client }
    }

    pub(in crate::database) async fn mutate_db(&self) -> Result<(), AppError> {
        let types = quoted_variants::<ReputationEventType>();
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS user ON TABLE {TABLE_NAME} TYPE record<{USER_TABLE_NAME}> READONLY;
    DEFINE FIELD IF NOT EXISTS event_type ON TABLE {TABLE_NAME} TYPE string READONLY ASSERT $value INSIDE [{types}];
    DEFINE FIELD IF NOT EXISTS score_change ON TABLE {TABLE_NAME} TYPE int READONLY;
    DEFINE FIELD IF NOT EXISTS related_id ON TABLE {TABLE_NAME} TYPE option<string> READONLY;
    DEFINE FIELD IF NOT EXISTS notes ON TABLE {TABLE_NAME} TYPE option<string> READONLY;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS reputation_event_user_idx ON TABLE {TABLE_NAME} COLUMNS user;
    ");
        let mutation = self.client.query(sql).await?;
        mutation.check()?;
        Ok(())
    }
}

#[async_trait]
impl ReputationEventRepositoryInterface for ReputationEventRepository {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<ReputationEvent>> {
        let event: Option<ReputationEvent> = self.client.select((TABLE_NAME, id)).await?;
        Ok(event)
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<ReputationEvent>> {
        let mut res = self
            .client
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE user=$user ORDER BY created_at DESC;"
            ))
            .bind(("user", thing(USER_TABLE_NAME, user_id)))
            .await?;
        Ok(res.take::<Vec<ReputationEvent>>(0)?)
    }

    async fn sum_by_user(&self, user_id: &str) -> AppResult<i64> {
        let mut res = self
            .client
            .query(format!(
                "RETURN math::sum((SELECT VALUE score_change FROM {TABLE_NAME} WHERE user=$user));"
            ))
            .bind(("user", thing(USER_TABLE_NAME, user_id)))
            .await?;
        Ok(res.take::<Option<i64>>(0)?.unwrap_or(0))
    }

    async fn rebuild_score(&self, user_id: &str) -> AppResult<Option<i64>> {
        let mut res = self
            .client
            .query(format!(
                "UPDATE $user SET reputation_score =
                    math::sum((SELECT VALUE score_change FROM {TABLE_NAME} WHERE user=$user))
                RETURN AFTER;"
            ))
            .bind(("user", thing(USER_TABLE_NAME, user_id)))
            .await?;
        let users = res.take::<Vec<User>>(0)?;
        Ok(users.into_iter().next().map(|u| u.reputation_score))
    }

    fn build_append_query<'b>(
        &self,
        query: Query<'b, any::Any>,
        slot: &str,
        event_id: &str,
        event: &ReputationAppend,
        required: bool,
    ) -> Query<'b, any::Any> {
        let p = format!("_rep_{slot}");
        let create = format!(
            "CREATE ${p}_id SET
                user=${p}_user_id,
                event_type=${p}_type,
                score_change=${p}_delta,
                related_id=${p}_related,
                notes=${p}_notes;"
        );
        let sql = if required {
            format!(
                "LET ${p}_user = UPDATE ${p}_user_id SET reputation_score += ${p}_delta;
                IF array::len(${p}_user) == 0 {{ THROW \"{THROW_USER_NOT_FOUND}\" }};
                {create}"
            )
        } else {
            format!(
                "LET ${p}_user = UPDATE ${p}_user_id SET reputation_score += ${p}_delta;
                IF array::len(${p}_user) > 0 {{ {create} }};"
            )
        };
        query
            .query(sql)
            .bind((format!("{p}_id"), thing(TABLE_NAME, event_id)))
            .bind((format!("{p}_user_id"), thing(USER_TABLE_NAME, &event.user_id)))
            .bind((format!("{p}_type"), event.event_type))
            .bind((format!("{p}_delta"), event.score_change))
            .bind((format!("{p}_related"), event.related_id.clone()))
            .bind((format!("{p}_notes"), event.notes.clone()))
    }
}
