use tracing::info;

use crate::config::AppConfig;
use crate::database::client::Database;
use crate::database::surrdb_utils::{new_record_key, thing, THROW_USER_NOT_FOUND};
use crate::entities::money::Amount;
use crate::entities::reputation_event::{ReputationEvent, ReputationEventType};
use crate::entities::user::TABLE_NAME as USER_TABLE_NAME;
use crate::interfaces::repositories::reputation_event::{
    ReputationAppend, ReputationEventRepositoryInterface,
};
use crate::interfaces::repositories::user::UserRepositoryInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, AppResult};

/// Score constants applied by settlement and endorsement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationPolicy {
    pub contribution_base: i64,
    pub bounty_divisor: i64,
    pub endorsement_score: i64,
    pub mentor_score: i64,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            contribution_base: 100,
            bounty_divisor: 10,
            endorsement_score: 20,
            mentor_score: 5,
        }
    }
}

impl ReputationPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            contribution_base: config.reputation_contribution_base,
            bounty_divisor: config.reputation_bounty_divisor,
            endorsement_score: config.reputation_endorsement_score,
            mentor_score: config.reputation_mentor_score,
        }
    }

    /// base + floor(bounty / divisor), bounty in whole currency units.
    pub fn contribution_award(&self, bounty: Amount) -> i64 {
        let divisor = self.bounty_divisor.max(1);
        self.contribution_base + bounty.major().max(0) / divisor
    }
}

pub struct ReputationService<'a> {
    db: &'a Database,
    ctx: &'a Ctx,
}

impl<'a> ReputationService<'a> {
    pub fn new(db: &'a Database, ctx: &'a Ctx) -> Self {
        Self { db, ctx }
    }

    pub async fn append(&self, event: ReputationAppend) -> AppResult<()> {
        let event_id = new_record_key();
        self.db
            .run_transaction(|q| {
                self.db
                    .reputation_events
                    .build_append_query(q, "single", &event_id, &event, true)
            })
            .await
            .map_err(|failure| {
                if failure.is_thrown(THROW_USER_NOT_FOUND) {
                    AppError::EntityFailIdNotFound {
                        ident: thing(USER_TABLE_NAME, &event.user_id).to_raw(),
                    }
                } else {
                    failure.into()
                }
            })?;
        info!(
            req_id = %self.ctx.req_id(),
            "reputation {} {:+} for user {}",
            event.event_type,
            event.score_change,
            event.user_id
        );
        Ok(())
    }

    pub async fn adjust(&self, user_id: &str, delta: i64, notes: &str) -> AppResult<()> {
        if delta == 0 {
            return Err(AppError::ValidationErrors {
                value: "adjustment must change the score".to_string(),
            });
        }
        self.append(ReputationAppend {
            user_id: user_id.to_string(),
            event_type: ReputationEventType::ManualAdjustment,
            score_change: delta,
            related_id: None,
            notes: Some(notes.to_string()),
        })
        .await
    }

    pub async fn get_score(&self, user_id: &str) -> AppResult<i64> {
        let user = self
            .db
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, user_id).to_raw(),
            })?;
        Ok(user.reputation_score)
    }

    pub async fn get_history(&self, user_id: &str) -> AppResult<Vec<ReputationEvent>> {
        if !self.db.users.exists(user_id).await? {
            return Err(AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, user_id).to_raw(),
            });
        }
        self.db.reputation_events.list_by_user(user_id).await
    }

    /// Sum of the event log, independent of the cached score.
    pub async fn get_ledger_score(&self, user_id: &str) -> AppResult<i64> {
        self.db.reputation_events.sum_by_user(user_id).await
    }

    pub async fn rebuild_score(&self, user_id: &str) -> AppResult<i64> {
        let score = self
            .db
            .reputation_events
            .rebuild_score(user_id)
            .await?
            .ok_or_else(|| AppError::EntityFailIdNotFound {
                ident: thing(USER_TABLE_NAME, user_id).to_raw(),
            })?;
        info!(req_id = %self.ctx.req_id(), "rebuilt score {score} for user {user_id}");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn award_adds_tenth_of_whole_bounty() {
        let policy = ReputationPolicy::default();
        assert_eq!(policy.contribution_award(Amount::ZERO), 100);
        assert_eq!(policy.contribution_award(Amount::from_major(100)), 110);
        assert_eq!(policy.contribution_award("109.99".parse().unwrap()), 110);
        assert_eq!(policy.contribution_award("9.99".parse().unwrap()), 100);
    }

    #[test]
    fn zero_divisor_is_treated_as_one() {
        let policy = ReputationPolicy {
            bounty_divisor: 0,
            ..ReputationPolicy::default()
        };
        assert_eq!(policy.contribution_award(Amount::from_major(7)), 107);
    }
}
