use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::database::client::Database;
use crate::database::surrdb_utils::{
    new_record_key, record_key, thing, TxFailure, THROW_CONTRIBUTION_ALREADY_PAID,
    THROW_ESCROW_CHANGED,
};
use crate::entities::contribution::{Contribution, TABLE_NAME as CONTRIBUTION_TABLE_NAME};
use crate::entities::money::{Amount, Currency};
use crate::entities::payment::{Payment, PaymentStatus, PaymentType, TABLE_NAME};
use crate::entities::task::{Task, TaskStatus, TABLE_NAME as TASK_TABLE_NAME};
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::payment_gateway::{GatewayError, PaymentGatewayInterface};
use crate::interfaces::repositories::contribution::ContributionRepositoryInterface;
use crate::interfaces::repositories::payment::{PaymentCreate, PaymentRepositoryInterface};
use crate::interfaces::repositories::task::{BountyUpdate, TaskRepositoryInterface};
use crate::interfaces::repositories::user::UserRepositoryInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, AppResult};

/// Gateway and release settings shared by escrow and settlement.
#[derive(Debug, Clone)]
pub struct SettlementConfig {
    pub gateway_timeout: Duration,
    pub release_inline: bool,
    pub release_lock_secs: u64,
    pub default_currency: Currency,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: Duration::from_secs(5),
            release_inline: true,
            release_lock_secs: 60,
            default_currency: Currency::default(),
        }
    }
}

impl SettlementConfig {
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            gateway_timeout: Duration::from_millis(config.gateway_timeout_ms),
            release_inline: config.release_inline,
            release_lock_secs: config.release_lock_secs,
            default_currency: Currency::parse(&config.default_currency)?,
        })
    }
}

pub struct EscrowService<'a, G>
where
    G: PaymentGatewayInterface + ?Sized,
{
    db: &'a Database,
    ctx: &'a Ctx,
    gateway: &'a G,
    settings: &'a SettlementConfig,
}

impl<'a, G> EscrowService<'a, G>
where
    G: PaymentGatewayInterface + ?Sized,
{
    pub fn new(
        db: &'a Database,
        ctx: &'a Ctx,
        gateway: &'a G,
        settings: &'a SettlementConfig,
    ) -> Self {
        Self {
            db,
            ctx,
            gateway,
            settings,
        }
    }

    /// Escrows the bounty at the gateway, then records the deposit and task bounty in one
    /// transaction. A still-open task that already holds an escrow gets it replaced, and the
    /// replaced escrow is refunded once the swap is committed.
    pub async fn fund_task_bounty(
        &self,
        task_id: &str,
        funder_id: &str,
        amount: Amount,
        currency: Option<&str>,
    ) -> AppResult<Payment> {
        let amount = amount.ensure_positive()?;
        let currency = match currency {
            Some(code) => Currency::parse(code)?,
            None => self.settings.default_currency.clone(),
        };
        if !self.db.users.exists(funder_id).await? {
            return Err(AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, funder_id).to_raw(),
            });
        }
        let task = self.get_task(task_id).await?;
        if task.status != TaskStatus::Open && task.bounty_amount.is_positive() {
            return Err(AppError::BountyAlreadyFunded {
                task_id: task_id.to_string(),
                current: task.status,
            });
        }
        if task.status.is_terminal() {
            return Err(AppError::TaskNotFundable {
                task_id: task_id.to_string(),
                current: task.status,
            });
        }

        let description = format!("Bounty for task: {}", task.title);
        let escrow_id = self
            .call_gateway(
                "escrow",
                self.gateway.escrow(amount, &currency, &description),
            )
            .await?;

        let prior_escrow = task.bounty_escrow_id.clone();
        let payment_id = new_record_key();
        let deposit = PaymentCreate {
            user_id: funder_id.to_string(),
            task_id: Some(task_id.to_string()),
            contribution_id: None,
            payment_type: PaymentType::EscrowDeposit,
            status: PaymentStatus::Escrowed,
            amount,
            currency: currency.clone(),
            external_tx_id: escrow_id.clone(),
            gateway: self.gateway.name().to_string(),
            notes: Some(description.clone()),
        };
        let bounty = BountyUpdate {
            amount,
            currency: currency.clone(),
            escrow_id: escrow_id.clone(),
        };

        let committed = self
            .db
            .run_transaction(|q| {
                let q = self.db.tasks.build_set_bounty_query(
                    q,
                    task_id,
                    task.status,
                    prior_escrow.as_deref(),
                    &bounty,
                );
                let q = self
                    .db
                    .payments
                    .build_create_query(q, "deposit", &payment_id, &deposit);
                match &prior_escrow {
                    Some(prior) => self.db.payments.build_set_status_query(
                        q,
                        "prior",
                        prior,
                        PaymentType::EscrowDeposit,
                        PaymentStatus::Escrowed,
                        PaymentStatus::Refunded,
                    ),
                    None => q,
                }
            })
            .await;

        if let Err(failure) = committed {
            self.compensate_escrow(&escrow_id).await;
            return Err(if failure.is_thrown(THROW_ESCROW_CHANGED) {
                let current = self.get_task(task_id).await?;
                if current.escrow_locked(Utc::now()) {
                    AppError::EscrowBusy {
                        task_id: task_id.to_string(),
                    }
                } else {
                    AppError::BountyAlreadyFunded {
                        task_id: task_id.to_string(),
                        current: current.status,
                    }
                }
            } else {
                failure.into()
            });
        }

        // the ledger already lists the replaced deposit as refunded
        if let Some(prior) = &prior_escrow {
            if let Err(err) = self
                .call_gateway("refund_escrow", self.gateway.refund_escrow(prior))
                .await
            {
                error!(
                    req_id = %self.ctx.req_id(),
                    "replaced escrow {prior} of task {task_id} was not returned to the funder: {err}"
                );
            }
        }

        info!(
            req_id = %self.ctx.req_id(),
            "funded task {task_id} with {amount} {currency}, escrow {escrow_id}"
        );
        self.get_payment(&payment_id).await
    }

    /// Pays the task's escrow out to a verified contributor, at most once.
    pub async fn release_bounty_to_contributor(&self, contribution_id: &str) -> AppResult<Payment> {
        let contribution = self.get_contribution(contribution_id).await?;
        if !contribution.verification_status.is_verified() {
            return Err(AppError::NotVerified {
                contribution_id: contribution_id.to_string(),
                status: contribution.verification_status,
            });
        }
        if let Some(payment) = &contribution.payment_id {
            return Err(AppError::AlreadyPaid {
                contribution_id: contribution_id.to_string(),
                payment_id: record_key(payment),
            });
        }
        let task_id = record_key(&contribution.task);
        let task = self.get_task(&task_id).await?;
        let escrow_id = task
            .bounty_escrow_id
            .clone()
            .ok_or_else(|| AppError::NoEscrow {
                task_id: task_id.clone(),
            })?;

        let reserved = self
            .db
            .contributions
            .reserve_release(contribution_id, self.settings.release_lock_secs)
            .await?;
        if !reserved {
            let current = self.get_contribution(contribution_id).await?;
            return Err(match current.payment_id {
                Some(payment) => AppError::AlreadyPaid {
                    contribution_id: contribution_id.to_string(),
                    payment_id: record_key(&payment),
                },
                None => AppError::ReleaseInProgress {
                    contribution_id: contribution_id.to_string(),
                },
            });
        }
        if !self
            .db
            .tasks
            .reserve_escrow(&task_id, &escrow_id, self.settings.release_lock_secs, false)
            .await?
        {
            self.unlock_release(contribution_id, None).await;
            let current = self.get_task(&task_id).await?;
            return Err(if current.bounty_escrow_id.is_none() {
                AppError::NoEscrow { task_id }
            } else {
                AppError::ReleaseInProgress {
                    contribution_id: contribution_id.to_string(),
                }
            });
        }

        let recipient_id = record_key(&contribution.user);
        let amount = task.bounty_amount;
        let currency = task.bounty_currency.clone();
        let gateway_tx = match self
            .call_gateway(
                "release_escrow",
                self.gateway
                    .release_escrow(&escrow_id, amount, &currency, &recipient_id),
            )
            .await
        {
            Ok(tx) => tx,
            Err(err) => {
                // an unanswered release keeps both locks until they expire
                if !err.is_indeterminate() {
                    self.unlock_release(contribution_id, Some((&task_id, &escrow_id)))
                        .await;
                }
                return Err(err.into());
            }
        };

        let payment_id = new_record_key();
        let payout = PaymentCreate {
            user_id: recipient_id.clone(),
            task_id: Some(task_id.clone()),
            contribution_id: Some(contribution_id.to_string()),
            payment_type: PaymentType::BountyPayout,
            status: PaymentStatus::Released,
            amount,
            currency: currency.clone(),
            external_tx_id: gateway_tx.clone(),
            gateway: self.gateway.name().to_string(),
            notes: None,
        };

        let committed = self
            .db
            .run_transaction(|q| {
                let q = self.db.contributions.build_link_payment_query(
                    q,
                    contribution_id,
                    &payment_id,
                    amount,
                );
                let q = self
                    .db
                    .payments
                    .build_create_query(q, "payout", &payment_id, &payout);
                let q = self.db.payments.build_set_status_query(
                    q,
                    "escrow",
                    &escrow_id,
                    PaymentType::EscrowDeposit,
                    PaymentStatus::Escrowed,
                    PaymentStatus::Released,
                );
                self.db
                    .tasks
                    .build_clear_escrow_query(q, &task_id, &escrow_id, false)
            })
            .await;

        if let Err(failure) = committed {
            error!(
                req_id = %self.ctx.req_id(),
                "gateway released {gateway_tx} for contribution {contribution_id} but the ledger write failed: {failure:?}"
            );
            return Err(self.map_release_failure(failure, contribution_id, &task_id).await);
        }

        info!(
            req_id = %self.ctx.req_id(),
            "released {amount} {currency} to user {recipient_id} for contribution {contribution_id}"
        );
        self.get_payment(&payment_id).await
    }

    /// Returns the escrow to the funder. Refused while a release holds the escrow or a
    /// verified contribution of the task is still unpaid.
    pub async fn refund_task_bounty(&self, task_id: &str, reason: &str) -> AppResult<()> {
        let task = self.get_task(task_id).await?;
        let escrow_id = task
            .bounty_escrow_id
            .clone()
            .ok_or_else(|| AppError::NoEscrow {
                task_id: task_id.to_string(),
            })?;

        let reserved = self
            .db
            .tasks
            .reserve_escrow(task_id, &escrow_id, self.settings.release_lock_secs, true)
            .await?;
        if !reserved {
            let current = self.get_task(task_id).await?;
            return Err(if current.bounty_escrow_id.is_none() {
                AppError::NoEscrow {
                    task_id: task_id.to_string(),
                }
            } else {
                AppError::EscrowBusy {
                    task_id: task_id.to_string(),
                }
            });
        }

        if let Err(err) = self
            .call_gateway("refund_escrow", self.gateway.refund_escrow(&escrow_id))
            .await
        {
            if !err.is_indeterminate() {
                if let Err(unlock_err) =
                    self.db.tasks.clear_escrow_lock(task_id, &escrow_id).await
                {
                    warn!(
                        req_id = %self.ctx.req_id(),
                        "could not clear escrow lock of task {task_id}: {unlock_err}"
                    );
                }
            }
            return Err(err.into());
        }

        let committed = self
            .db
            .run_transaction(|q| {
                let q = self.db.payments.build_set_status_query(
                    q,
                    "escrow",
                    &escrow_id,
                    PaymentType::EscrowDeposit,
                    PaymentStatus::Escrowed,
                    PaymentStatus::Refunded,
                );
                self.db
                    .tasks
                    .build_clear_escrow_query(q, task_id, &escrow_id, true)
            })
            .await;

        if let Err(failure) = committed {
            error!(
                req_id = %self.ctx.req_id(),
                "gateway refunded escrow {escrow_id} of task {task_id} but the ledger write failed: {failure:?}"
            );
            return Err(if failure.is_thrown(THROW_ESCROW_CHANGED) {
                AppError::NoEscrow {
                    task_id: task_id.to_string(),
                }
            } else {
                failure.into()
            });
        }

        info!(
            req_id = %self.ctx.req_id(),
            "refunded {} {} of task {task_id}: {reason}",
            task.bounty_amount,
            task.bounty_currency
        );
        Ok(())
    }

    /// Direct payout to a user through the gateway withdrawal primitive.
    pub async fn admin_transfer(
        &self,
        user_id: &str,
        amount: Amount,
        currency: Option<&str>,
        notes: &str,
    ) -> AppResult<Payment> {
        let amount = amount.ensure_positive()?;
        let currency = match currency {
            Some(code) => Currency::parse(code)?,
            None => self.settings.default_currency.clone(),
        };
        if !self.db.users.exists(user_id).await? {
            return Err(AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, user_id).to_raw(),
            });
        }

        let gateway_tx = self
            .call_gateway(
                "process_withdrawal",
                self.gateway.process_withdrawal(user_id, amount, &currency),
            )
            .await?;

        let payment_id = new_record_key();
        let transfer = PaymentCreate {
            user_id: user_id.to_string(),
            task_id: None,
            contribution_id: None,
            payment_type: PaymentType::AdminTransfer,
            status: PaymentStatus::Released,
            amount,
            currency: currency.clone(),
            external_tx_id: gateway_tx.clone(),
            gateway: self.gateway.name().to_string(),
            notes: Some(notes.to_string()),
        };
        self.db
            .run_transaction(|q| {
                self.db
                    .payments
                    .build_create_query(q, "transfer", &payment_id, &transfer)
            })
            .await
            .map_err(|failure| {
                error!(
                    req_id = %self.ctx.req_id(),
                    "gateway paid {gateway_tx} to {user_id} but the ledger write failed: {failure:?}"
                );
                AppError::from(failure)
            })?;

        info!(
            req_id = %self.ctx.req_id(),
            "admin transfer of {amount} {currency} to {user_id} by {}",
            self.ctx.actor()
        );
        self.get_payment(&payment_id).await
    }

    /// Newest first.
    pub async fn get_user_payments(&self, user_id: &str) -> AppResult<Vec<Payment>> {
        self.db.payments.list_by_user(user_id).await
    }

    pub async fn get_task_payments(&self, task_id: &str) -> AppResult<Vec<Payment>> {
        self.db.payments.list_by_task(task_id).await
    }

    async fn map_release_failure(
        &self,
        failure: TxFailure,
        contribution_id: &str,
        task_id: &str,
    ) -> AppError {
        if failure.is_thrown(THROW_CONTRIBUTION_ALREADY_PAID) {
            return match self.get_contribution(contribution_id).await {
                Ok(Contribution {
                    payment_id: Some(payment),
                    ..
                }) => AppError::AlreadyPaid {
                    contribution_id: contribution_id.to_string(),
                    payment_id: record_key(&payment),
                },
                Ok(_) => AppError::ReleaseInProgress {
                    contribution_id: contribution_id.to_string(),
                },
                Err(err) => err,
            };
        }
        if failure.is_thrown(THROW_ESCROW_CHANGED) {
            return AppError::NoEscrow {
                task_id: task_id.to_string(),
            };
        }
        failure.into()
    }

    async fn call_gateway<T, F>(&self, operation: &str, call: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        let timeout = self.settings.gateway_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                warn!(req_id = %self.ctx.req_id(), "gateway {operation} failed: {err}");
                Err(err)
            }
            Err(_) => {
                warn!(req_id = %self.ctx.req_id(), "gateway {operation} timed out after {timeout:?}");
                Err(GatewayError::Timeout(timeout))
            }
        }
    }

    async fn unlock_release(&self, contribution_id: &str, escrow: Option<(&str, &str)>) {
        if let Err(err) = self.db.contributions.clear_release_lock(contribution_id).await {
            warn!(
                req_id = %self.ctx.req_id(),
                "could not clear release lock of {contribution_id}: {err}"
            );
        }
        if let Some((task_id, escrow_id)) = escrow {
            if let Err(err) = self.db.tasks.clear_escrow_lock(task_id, escrow_id).await {
                warn!(
                    req_id = %self.ctx.req_id(),
                    "could not clear escrow lock of task {task_id}: {err}"
                );
            }
        }
    }

    async fn compensate_escrow(&self, escrow_id: &str) {
        if let Err(err) = self
            .call_gateway("refund_escrow", self.gateway.refund_escrow(escrow_id))
            .await
        {
            error!(
                req_id = %self.ctx.req_id(),
                "could not return escrow {escrow_id} after a failed funding: {err}"
            );
        }
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

    async fn get_contribution(&self, contribution_id: &str) -> AppResult<Contribution> {
        self.db
            .contributions
            .get_by_id(contribution_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(CONTRIBUTION_TABLE_NAME, contribution_id).to_raw(),
            })
    }

    async fn get_payment(&self, payment_id: &str) -> AppResult<Payment> {
        self.db
            .payments
            .get_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(TABLE_NAME, payment_id).to_raw(),
            })
    }
}
