pub mod task_helpers;
pub mod test_gateway;
pub mod test_with_state;
pub mod user_helpers;

use std::sync::Arc;
use std::time::Duration;

use bounty_board::database::client::Database;
use bounty_board::entities::money::Currency;
use bounty_board::middleware::mw_ctx::CtxState;
use bounty_board::services::escrow_service::SettlementConfig;
use bounty_board::services::reputation_service::ReputationPolicy;
use bounty_board::utils::reference_verifier::ReferenceVerifier;
use surrealdb::engine::any::connect;

use test_gateway::TestGateway;

pub const GATEWAY_TIMEOUT: Duration = Duration::from_millis(300);

async fn init_test_db() -> Database {
    let conn = connect("mem://").await.unwrap();
    conn.use_ns("namespace").use_db("database").await.unwrap();
    let db = Database::new(conn);
    bounty_board::init::run_migrations(&db)
        .await
        .expect("migrations run");
    db
}

#[allow(dead_code)]
pub fn test_settlement(release_inline: bool) -> SettlementConfig {
    SettlementConfig {
        gateway_timeout: GATEWAY_TIMEOUT,
        release_inline,
        release_lock_secs: 60,
        default_currency: Currency::default(),
    }
}

#[allow(dead_code)]
pub async fn create_test_state_with(
    settlement: SettlementConfig,
) -> (Arc<CtxState>, Arc<TestGateway>) {
    let db = init_test_db().await;
    let gateway = Arc::new(TestGateway::default());
    let state = CtxState {
        db,
        gateway: gateway.clone(),
        verifier: Arc::new(ReferenceVerifier),
        reputation_policy: ReputationPolicy::default(),
        settlement,
    };
    (Arc::new(state), gateway)
}

#[allow(dead_code)]
pub async fn create_test_state() -> (Arc<CtxState>, Arc<TestGateway>) {
    create_test_state_with(test_settlement(true)).await
}
