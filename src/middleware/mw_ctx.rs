use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::client::Database;
use crate::interfaces::contribution_verifier::ContributionVerifierInterface;
use crate::interfaces::payment_gateway::PaymentGatewayInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::AppResult;
use crate::services::claim_service::ClaimService;
use crate::services::contribution_service::ContributionService;
use crate::services::escrow_service::{EscrowService, SettlementConfig};
use crate::services::reputation_service::{ReputationPolicy, ReputationService};
use crate::services::task_service::TaskService;
use crate::services::user_service::UserService;

pub struct CtxState {
    pub db: Database,
    pub gateway: Arc<dyn PaymentGatewayInterface>,
    pub verifier: Arc<dyn ContributionVerifierInterface>,
    pub reputation_policy: ReputationPolicy,
    pub settlement: SettlementConfig,
}

impl Debug for CtxState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtxState")
            .field("gateway", &self.gateway.name())
            .field("reputation_policy", &self.reputation_policy)
            .field("settlement", &self.settlement)
            .finish()
    }
}

impl CtxState {
    pub fn user_service<'a>(&'a self, ctx: &'a Ctx) -> UserService<'a> {
        UserService::new(&self.db, ctx)
    }

    pub fn task_service<'a>(&'a self, ctx: &'a Ctx) -> TaskService<'a> {
        TaskService::new(&self.db, ctx)
    }

    pub fn claim_service<'a>(&'a self, ctx: &'a Ctx) -> ClaimService<'a> {
        ClaimService::new(&self.db, ctx)
    }

    pub fn reputation_service<'a>(&'a self, ctx: &'a Ctx) -> ReputationService<'a> {
        ReputationService::new(&self.db, ctx)
    }

    pub fn escrow_service<'a>(
        &'a self,
        ctx: &'a Ctx,
    ) -> EscrowService<'a, dyn PaymentGatewayInterface> {
        EscrowService::new(&self.db, ctx, self.gateway.as_ref(), &self.settlement)
    }

    pub fn contribution_service<'a>(
        &'a self,
        ctx: &'a Ctx,
    ) -> ContributionService<'a, dyn PaymentGatewayInterface, dyn ContributionVerifierInterface>
    {
        ContributionService::new(
            &self.db,
            ctx,
            self.gateway.as_ref(),
            self.verifier.as_ref(),
            self.reputation_policy,
            &self.settlement,
        )
    }
}

pub fn create_ctx_state(
    db: Database,
    config: &AppConfig,
    gateway: Arc<dyn PaymentGatewayInterface>,
    verifier: Arc<dyn ContributionVerifierInterface>,
) -> AppResult<Arc<CtxState>> {
    let ctx_state = CtxState {
        db,
        gateway,
        verifier,
        reputation_policy: ReputationPolicy::from_config(config),
        settlement: SettlementConfig::from_config(config)?,
    };
    Ok(Arc::new(ctx_state))
}
