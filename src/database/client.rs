use std::sync::Arc;

use surrealdb::engine::any::{connect, Any};
use surrealdb::method::Query;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::database::repositories::{
    claim_repo::ClaimRepository, contribution_repo::ContributionRepository,
    payment_repo::PaymentRepository, project_repo::ProjectRepository,
    reputation_event_repo::ReputationEventRepository, task_repo::TaskRepository,
    user_repo::UserRepository,
};
use crate::database::surrdb_utils::{check_transaction, classify_error, TxFailure};
use crate::middleware::error::AppResult;

pub type Db = Surreal<Any>;

const MAX_TX_ATTEMPTS: u8 = 3;

#[derive(Debug)]
pub struct DbConfig<'a> {
    pub url: &'a str,
    pub database: &'a str,
    pub namespace: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

#[derive(Debug)]
pub struct Database {
    pub client: Arc<Db>,
    pub users: UserRepository,
    pub projects: ProjectRepository,
    pub tasks: TaskRepository,
    pub claims: ClaimRepository,
    pub contributions: ContributionRepository,
    pub payments: PaymentRepository,
    pub reputation_events: ReputationEventRepository,
}

impl Database {
    pub async fn connect(config: DbConfig<'_>) -> Result<Self, surrealdb::Error> {
        info!("->> connecting DB url={} ns={}", config.url, config.namespace);
        let conn = connect(config.url).await?;

        if let (Some(password), Some(username)) = (config.password, config.username) {
            conn.signin(Root { username, password }).await?;
        }

        conn.use_ns(config.namespace)
            .use_db(config.database)
            .await?;

        let version = conn.version().await?;
        info!("->> connected DB version: {version}");
        Ok(Self::new(conn))
    }

    pub fn new(conn: Db) -> Self {
        let client = Arc::new(conn);
        Self {
            users: UserRepository::new(client.clone()),
            projects: ProjectRepository::new(client.clone()),
            tasks: TaskRepository::new(client.clone()),
            claims: ClaimRepository::new(client.clone()),
            contributions: ContributionRepository::new(client.clone()),
            payments: PaymentRepository::new(client.clone()),
            reputation_events: ReputationEventRepository::new(client.clone()),
            client,
        }
    }

    pub async fn run_migrations(&self) -> AppResult<()> {
        self.users.mutate_db().await?;
        self.projects.mutate_db().await?;
        self.tasks.mutate_db().await?;
        self.claims.mutate_db().await?;
        self.contributions.mutate_db().await?;
        self.payments.mutate_db().await?;
        self.reputation_events.mutate_db().await?;
        Ok(())
    }

    /// Runs the fragments composed by `build` as one transaction. Guards are part of the
    /// statements, so a transaction that lost a write conflict is rebuilt and run again.
    pub async fn run_transaction<F>(&self, build: F) -> Result<(), TxFailure>
    where
        F: for<'q> Fn(Query<'q, Any>) -> Query<'q, Any>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let query = build(self.client.query("BEGIN TRANSACTION;")).query("COMMIT TRANSACTION;");
            let result = match query.await {
                Ok(mut response) => check_transaction(&mut response),
                Err(err) => Err(classify_error(&err).unwrap_or(TxFailure::Db(err.to_string()))),
            };
            match result {
                Err(TxFailure::Conflict) if attempt < MAX_TX_ATTEMPTS => {
                    debug!("->> transaction conflict, attempt {attempt}, retrying");
                }
                other => return other,
            }
        }
    }
}
