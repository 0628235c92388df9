use tracing::{debug, info, warn};
use validator::Validate;

use crate::database::client::Database;
use crate::database::repositories::contribution_repo::TASK_USER_CYCLE_INDEX;
use crate::database::surrdb_utils::{
    new_record_key, record_key, thing, TxFailure, THROW_CONTRIBUTION_STATE_CHANGED,
    THROW_ESCROW_BUSY, THROW_TASK_STATE_CHANGED, THROW_USER_NOT_FOUND,
};
use crate::entities::contribution::{Contribution, VerificationStatus, TABLE_NAME};
use crate::entities::reputation_event::ReputationEventType;
use crate::entities::task::{Task, TaskStatus, TABLE_NAME as TASK_TABLE_NAME};
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::contribution_verifier::{ContributionVerifierInterface, Verdict};
use crate::interfaces::payment_gateway::PaymentGatewayInterface;
use crate::interfaces::repositories::claim::ClaimRepositoryInterface;
use crate::interfaces::repositories::contribution::{
    ContributionFilter, ContributionRepositoryInterface,
};
use crate::interfaces::repositories::reputation_event::{
    ReputationAppend, ReputationEventRepositoryInterface,
};
use crate::interfaces::repositories::task::TaskRepositoryInterface;
use crate::interfaces::repositories::user::UserRepositoryInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, AppResult};
use crate::services::escrow_service::{EscrowService, SettlementConfig};
use crate::services::outcome::SettlementOutcome;
use crate::services::reputation_service::ReputationPolicy;

#[derive(Debug, Validate)]
pub struct SubmissionInput {
    #[validate(length(min = 1, max = 2048, message = "reference must be 1 to 2048 characters"))]
    pub reference: String,
}

#[derive(Debug, Validate)]
pub struct RejectionInput {
    #[validate(length(min = 1, max = 1000, message = "reason must be 1 to 1000 characters"))]
    pub reason: String,
}

/// Submission and settlement of contributions.
pub struct ContributionService<'a, G, V>
where
    G: PaymentGatewayInterface + ?Sized,
    V: ContributionVerifierInterface + ?Sized,
{
    db: &'a Database,
    ctx: &'a Ctx,
    gateway: &'a G,
    verifier: &'a V,
    policy: ReputationPolicy,
    settings: &'a SettlementConfig,
}

impl<'a, G, V> ContributionService<'a, G, V>
where
    G: PaymentGatewayInterface + ?Sized,
    V: ContributionVerifierInterface + ?Sized,
{
    pub fn new(
        db: &'a Database,
        ctx: &'a Ctx,
        gateway: &'a G,
        verifier: &'a V,
        policy: ReputationPolicy,
        settings: &'a SettlementConfig,
    ) -> Self {
        Self {
            db,
            ctx,
            gateway,
            verifier,
            policy,
            settings,
        }
    }

    pub async fn submit_contribution(
        &self,
        task_id: &str,
        user_id: &str,
        reference: &str,
    ) -> AppResult<Contribution> {
        let input = SubmissionInput {
            reference: reference.trim().to_string(),
        };
        input.validate()?;

        self.ensure_user(user_id).await?;
        let task = self.get_task(task_id).await?;

        if self
            .db
            .contributions
            .find_in_cycle(task_id, user_id, task.submission_cycle)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateContribution {
                task_id: task_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        if !task.status.accepts_contributions() {
            return Err(AppError::TaskNotSubmittable {
                task_id: task_id.to_string(),
                current: task.status,
            });
        }
        let submitted = task.status.transition_to(TaskStatus::Submitted)?;

        let contribution_id = new_record_key();
        let committed = self
            .db
            .run_transaction(|q| {
                let q = self.db.tasks.build_transition_query(
                    q,
                    task_id,
                    task.status,
                    submitted,
                    false,
                );
                self.db.contributions.build_create_query(
                    q,
                    &contribution_id,
                    task_id,
                    user_id,
                    &input.reference,
                    task.submission_cycle,
                )
            })
            .await;

        if let Err(failure) = committed {
            return Err(if failure.is_index(TASK_USER_CYCLE_INDEX) {
                AppError::DuplicateContribution {
                    task_id: task_id.to_string(),
                    user_id: user_id.to_string(),
                }
            } else if failure.is_thrown(THROW_TASK_STATE_CHANGED) {
                let current = self.get_task(task_id).await?;
                AppError::TaskNotSubmittable {
                    task_id: task_id.to_string(),
                    current: current.status,
                }
            } else {
                failure.into()
            });
        }

        info!(
            req_id = %self.ctx.req_id(),
            "user {user_id} submitted contribution {contribution_id} for task {task_id}"
        );
        self.get_contribution(&contribution_id).await
    }

    /// Verifies through the verifier, then settles. The escrow release runs after commit.
    pub async fn accept_contribution(&self, contribution_id: &str) -> AppResult<SettlementOutcome> {
        self.accept(contribution_id, VerificationStatus::AutoVerified)
            .await
    }

    /// Settles a contribution approved by a reviewer.
    pub async fn accept_reviewed_contribution(
        &self,
        contribution_id: &str,
    ) -> AppResult<SettlementOutcome> {
        self.accept(contribution_id, VerificationStatus::ManualVerified)
            .await
    }

    /// Rejecting an already rejected contribution is a no-op.
    pub async fn reject_contribution(&self, contribution_id: &str, reason: &str) -> AppResult<()> {
        let input = RejectionInput {
            reason: reason.trim().to_string(),
        };
        input.validate()?;

        let contribution = self.get_contribution(contribution_id).await?;
        match contribution.verification_status {
            VerificationStatus::Rejected => {
                debug!(req_id = %self.ctx.req_id(), "contribution {contribution_id} already rejected");
                return Ok(());
            }
            status if status.is_verified() => {
                return Err(AppError::AlreadyProcessed {
                    contribution_id: contribution_id.to_string(),
                    status,
                });
            }
            _ => {}
        }
        let task_id = record_key(&contribution.task);
        let task = self.get_task(&task_id).await?;
        let reopened = task.status.transition_to(TaskStatus::Claimed)?;

        let committed = self
            .db
            .run_transaction(|q| {
                let q = self
                    .db
                    .contributions
                    .build_reject_query(q, contribution_id, &input.reason);
                self.db.tasks.build_transition_query(
                    q,
                    &task_id,
                    TaskStatus::Submitted,
                    reopened,
                    true,
                )
            })
            .await;

        if let Err(failure) = committed {
            if failure.is_thrown(THROW_CONTRIBUTION_STATE_CHANGED) {
                let current = self.get_contribution(contribution_id).await?;
                return match current.verification_status {
                    VerificationStatus::Rejected => Ok(()),
                    status => Err(AppError::AlreadyProcessed {
                        contribution_id: contribution_id.to_string(),
                        status,
                    }),
                };
            }
            if failure.is_thrown(THROW_TASK_STATE_CHANGED) {
                let current = self.get_task(&task_id).await?;
                return Err(AppError::InvalidTransition {
                    from: current.status,
                    to: TaskStatus::Claimed,
                });
            }
            return Err(failure.into());
        }

        info!(
            req_id = %self.ctx.req_id(),
            "contribution {contribution_id} rejected, task {task_id} back to claimed: {}",
            input.reason
        );
        Ok(())
    }

    /// The endorsed user's award is required. The mentor's award is skipped when the
    /// mentor row is missing at commit time.
    pub async fn mentor_endorse(
        &self,
        mentor_id: &str,
        user_id: &str,
        related_id: Option<&str>,
        notes: Option<&str>,
    ) -> AppResult<SettlementOutcome> {
        if mentor_id == user_id {
            return Err(AppError::ValidationErrors {
                value: "users cannot endorse themselves".to_string(),
            });
        }
        self.ensure_user(user_id).await?;

        let endorsement = ReputationAppend {
            user_id: user_id.to_string(),
            event_type: ReputationEventType::MentorEndorsement,
            score_change: self.policy.endorsement_score,
            related_id: related_id.map(str::to_string),
            notes: notes.map(str::to_string),
        };
        let mentor_award = ReputationAppend {
            user_id: mentor_id.to_string(),
            event_type: ReputationEventType::ManualAdjustment,
            score_change: self.policy.mentor_score,
            related_id: related_id.map(str::to_string),
            notes: Some(format!(
                "Mentored user {user_id} for related ID {}",
                related_id.unwrap_or("-")
            )),
        };
        let endorsement_id = new_record_key();
        let mentor_award_id = new_record_key();

        self.db
            .run_transaction(|q| {
                let q = self.db.reputation_events.build_append_query(
                    q,
                    "endorsed",
                    &endorsement_id,
                    &endorsement,
                    true,
                );
                self.db.reputation_events.build_append_query(
                    q,
                    "mentor",
                    &mentor_award_id,
                    &mentor_award,
                    false,
                )
            })
            .await
            .map_err(|failure| {
                if failure.is_thrown(THROW_USER_NOT_FOUND) {
                    AppError::EntityFailIdNotFound {
                        ident: thing(USER_TABLE_NAME, user_id).to_raw(),
                    }
                } else {
                    failure.into()
                }
            })?;

        info!(
            req_id = %self.ctx.req_id(),
            "mentor {mentor_id} endorsed user {user_id} ({:+})",
            self.policy.endorsement_score
        );
        let mentor_awarded = self
            .db
            .reputation_events
            .get_by_id(&mentor_award_id)
            .await?
            .is_some();
        if !mentor_awarded {
            warn!(
                req_id = %self.ctx.req_id(),
                "mentor {mentor_id} not found, mentor award skipped"
            );
            return Ok(SettlementOutcome::SecondaryEffectFailed {
                reason: format!("mentor {mentor_id} not found"),
            });
        }
        Ok(SettlementOutcome::Committed)
    }

    pub async fn get_contribution(&self, contribution_id: &str) -> AppResult<Contribution> {
        self.db
            .contributions
            .get_by_id(contribution_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(TABLE_NAME, contribution_id).to_raw(),
            })
    }

    pub async fn list_contributions(
        &self,
        filter: ContributionFilter,
    ) -> AppResult<Vec<Contribution>> {
        self.db.contributions.list(&filter).await
    }

    async fn accept(
        &self,
        contribution_id: &str,
        verified_as: VerificationStatus,
    ) -> AppResult<SettlementOutcome> {
        let contribution = self.get_contribution(contribution_id).await?;
        if contribution.verification_status != VerificationStatus::Unverified {
            return Err(AppError::AlreadyProcessed {
                contribution_id: contribution_id.to_string(),
                status: contribution.verification_status,
            });
        }
        let task_id = record_key(&contribution.task);
        let contributor_id = record_key(&contribution.user);
        let task = self.get_task(&task_id).await?;

        if verified_as == VerificationStatus::AutoVerified {
            if let Verdict::Failed { reason } = self.verifier.verify(&task, &contribution).await {
                info!(
                    req_id = %self.ctx.req_id(),
                    "contribution {contribution_id} failed verification: {reason}"
                );
                return Err(AppError::VerificationFailed {
                    contribution_id: contribution_id.to_string(),
                    reason,
                });
            }
        }
        let completed = task.status.transition_to(TaskStatus::Completed)?;

        let award_id = new_record_key();
        let award = ReputationAppend {
            user_id: contributor_id.clone(),
            event_type: ReputationEventType::ContributionAccepted,
            score_change: self.policy.contribution_award(task.bounty_amount),
            related_id: Some(contribution.id.to_raw()),
            notes: Some(format!("Accepted contribution for task: {}", task.title)),
        };

        let committed = self
            .db
            .run_transaction(|q| {
                let q = self
                    .db
                    .contributions
                    .build_verify_query(q, contribution_id, verified_as);
                let q = self.db.tasks.build_transition_query(
                    q,
                    &task_id,
                    TaskStatus::Submitted,
                    completed,
                    false,
                );
                let q = self.db.tasks.build_escrow_idle_query(q, &task_id);
                let q = self.db.reputation_events.build_append_query(
                    q,
                    "accepted",
                    &award_id,
                    &award,
                    true,
                );
                self.db
                    .claims
                    .build_accept_pending_query(q, &task_id, &contributor_id)
            })
            .await;

        if let Err(failure) = committed {
            return Err(self
                .map_accept_failure(failure, contribution_id, &task_id, &contributor_id)
                .await);
        }

        info!(
            req_id = %self.ctx.req_id(),
            "contribution {contribution_id} accepted as {verified_as}, user {contributor_id} {:+}",
            award.score_change
        );

        if !task.has_escrow() {
            return Ok(SettlementOutcome::Committed);
        }
        if !self.settings.release_inline {
            return Ok(SettlementOutcome::SecondaryEffectPending {
                reason: "bounty release queued".to_string(),
            });
        }

        let escrow = EscrowService::new(self.db, self.ctx, self.gateway, self.settings);
        match escrow.release_bounty_to_contributor(contribution_id).await {
            Ok(_) => Ok(SettlementOutcome::Committed),
            Err(AppError::Gateway { source }) if source.is_indeterminate() => {
                warn!(
                    req_id = %self.ctx.req_id(),
                    "bounty release for {contribution_id} unconfirmed: {source}"
                );
                Ok(SettlementOutcome::SecondaryEffectPending {
                    reason: source.to_string(),
                })
            }
            Err(AppError::ReleaseInProgress { .. }) => Ok(SettlementOutcome::SecondaryEffectPending {
                reason: "bounty release in progress".to_string(),
            }),
            Err(err) => {
                warn!(
                    req_id = %self.ctx.req_id(),
                    "bounty release for {contribution_id} failed after acceptance: {err}"
                );
                Ok(SettlementOutcome::SecondaryEffectFailed {
                    reason: err.to_string(),
                })
            }
        }
    }

    async fn map_accept_failure(
        &self,
        failure: TxFailure,
        contribution_id: &str,
        task_id: &str,
        contributor_id: &str,
    ) -> AppError {
        if failure.is_thrown(THROW_CONTRIBUTION_STATE_CHANGED) {
            return match self.get_contribution(contribution_id).await {
                Ok(current) => AppError::AlreadyProcessed {
                    contribution_id: contribution_id.to_string(),
                    status: current.verification_status,
                },
                Err(err) => err,
            };
        }
        if failure.is_thrown(THROW_TASK_STATE_CHANGED) {
            return match self.get_task(task_id).await {
                Ok(current) => AppError::InvalidTransition {
                    from: current.status,
                    to: TaskStatus::Completed,
                },
                Err(err) => err,
            };
        }
        if failure.is_thrown(THROW_USER_NOT_FOUND) {
            return AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, contributor_id).to_raw(),
            };
        }
        if failure.is_thrown(THROW_ESCROW_BUSY) {
            return AppError::EscrowBusy {
                task_id: task_id.to_string(),
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
