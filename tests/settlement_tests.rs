mod helpers;

use bounty_board::entities::claim::ClaimStatus;
use bounty_board::entities::contribution::VerificationStatus;
use bounty_board::entities::money::Amount;
use bounty_board::entities::payment::{PaymentStatus, PaymentType};
use bounty_board::entities::reputation_event::ReputationEventType;
use bounty_board::entities::task::TaskStatus;
use bounty_board::interfaces::repositories::claim::ClaimFilter;
use bounty_board::interfaces::repositories::reputation_event::ReputationEventRepositoryInterface;
use bounty_board::middleware::ctx::Ctx;
use bounty_board::middleware::error::AppError;
use bounty_board::services::outcome::SettlementOutcome;
use helpers::task_helpers::{create_submitted_task, PR_REFERENCE};
use helpers::user_helpers::key;
use helpers::{create_test_state_with, test_settlement};

test_with_state!(accept_completes_task_credits_and_pays, |state, gateway| {
    let (task, contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);

    let outcome = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(outcome, SettlementOutcome::Committed);

    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Completed);
    assert!(task_after.bounty_escrow_id.is_none());

    let reputation = state.reputation_service(&ctx);
    assert_eq!(reputation.get_score(&key(&contributor.id)).await.unwrap(), 110);
    let history = reputation.get_history(&key(&contributor.id)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].event_type, ReputationEventType::ContributionAccepted);
    assert_eq!(history[0].related_id, Some(contribution.id.to_raw()));

    let payments = state
        .escrow_service(&ctx)
        .get_user_payments(&key(&contributor.id))
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].payment_type, PaymentType::BountyPayout);
    assert_eq!(payments[0].status, PaymentStatus::Released);
    assert_eq!(payments[0].amount, Amount::from_major(100));

    let accepted = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(accepted.verification_status, VerificationStatus::AutoVerified);
    assert_eq!(accepted.payment_id, Some(payments[0].id.clone()));
    assert_eq!(accepted.payout_amount, Amount::from_major(100));
    assert!(accepted.accepted_at.is_some());

    let claims = state
        .claim_service(&ctx)
        .list_claims(ClaimFilter {
            task_id: Some(key(&task.id)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(claims[0].status, ClaimStatus::Accepted);
    assert_eq!(gateway.release_count(), 1);
});

test_with_state!(accept_without_bounty_awards_base_score, |state, gateway| {
    let (task, contributor, contribution) =
        create_submitted_task(&state, None, PR_REFERENCE).await;
    let ctx = Ctx::new(None);

    let outcome = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(outcome, SettlementOutcome::Committed);

    let score = state
        .reputation_service(&ctx)
        .get_score(&key(&contributor.id))
        .await
        .unwrap();
    assert_eq!(score, 100);
    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Completed);
    assert_eq!(gateway.release_count(), 0);
});

test_with_state!(failed_verification_changes_nothing, |state, gateway| {
    let (task, contributor, contribution) =
        create_submitted_task(&state, Some(100), "commit abc123").await;
    let ctx = Ctx::new(None);

    let err = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::VerificationFailed { .. }));

    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Submitted);
    assert!(task_after.bounty_escrow_id.is_some());
    let contribution_after = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(
        contribution_after.verification_status,
        VerificationStatus::Unverified
    );
    let reputation = state.reputation_service(&ctx);
    assert_eq!(reputation.get_score(&key(&contributor.id)).await.unwrap(), 0);
    assert!(reputation
        .get_history(&key(&contributor.id))
        .await
        .unwrap()
        .is_empty());
    assert_eq!(gateway.release_count(), 0);
});

test_with_state!(reviewed_acceptance_skips_verifier, |state, _gateway| {
    let (_task, contributor, contribution) =
        create_submitted_task(&state, Some(50), "commit abc123").await;
    let ctx = Ctx::new(None);

    let outcome = state
        .contribution_service(&ctx)
        .accept_reviewed_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(outcome.is_complete());

    let accepted = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(accepted.verification_status, VerificationStatus::ManualVerified);
    let score = state
        .reputation_service(&ctx)
        .get_score(&key(&contributor.id))
        .await
        .unwrap();
    assert_eq!(score, 105);
});

test_with_state!(accepting_twice_is_already_processed, |state, gateway| {
    let (_task, contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    let contributions = state.contribution_service(&ctx);

    contributions
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap();
    let err = contributions
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AppError::AlreadyProcessed {
            contribution_id: key(&contribution.id),
            status: VerificationStatus::AutoVerified
        }
    );

    let err = contributions
        .reject_contribution(&key(&contribution.id), "too late")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyProcessed { .. }));

    let score = state
        .reputation_service(&ctx)
        .get_score(&key(&contributor.id))
        .await
        .unwrap();
    assert_eq!(score, 110);
    assert_eq!(gateway.release_count(), 1);
});

test_with_state!(rejected_contribution_cannot_be_accepted, |state, _gateway| {
    let (_task, _contributor, contribution) =
        create_submitted_task(&state, None, PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    let contributions = state.contribution_service(&ctx);

    contributions
        .reject_contribution(&key(&contribution.id), "insufficient tests")
        .await
        .unwrap();
    let err = contributions
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::AlreadyProcessed {
            status: VerificationStatus::Rejected,
            ..
        }
    ));
});

test_with_state!(release_failure_keeps_acceptance, |state, gateway| {
    let (task, contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    gateway.set_fail_release(true);

    let outcome = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(matches!(outcome, SettlementOutcome::SecondaryEffectFailed { .. }));

    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Completed);
    assert!(task_after.bounty_escrow_id.is_some());
    let accepted = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(accepted.verification_status.is_verified());
    assert!(accepted.payment_id.is_none());
    assert!(accepted.release_lock.is_none());
    let score = state
        .reputation_service(&ctx)
        .get_score(&key(&contributor.id))
        .await
        .unwrap();
    assert_eq!(score, 110);

    gateway.set_fail_release(false);
    let payment = state
        .escrow_service(&ctx)
        .release_bounty_to_contributor(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(payment.payment_type, PaymentType::BountyPayout);
    assert_eq!(payment.user, contributor.id);
});

test_with_state!(release_timeout_leaves_release_pending, |state, gateway| {
    let (_task, _contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    gateway.set_hang_release(true);

    let outcome = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(matches!(outcome, SettlementOutcome::SecondaryEffectPending { .. }));

    let accepted = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(accepted.payment_id.is_none());
    assert!(accepted.release_lock.is_some());

    gateway.set_hang_release(false);
    let err = state
        .escrow_service(&ctx)
        .release_bounty_to_contributor(&key(&contribution.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ReleaseInProgress { .. }));

    let task_id = key(&accepted.task);
    let task = state.task_service(&ctx).get_task(&task_id).await.unwrap();
    assert!(task.escrow_lock.is_some());
    let err = state
        .escrow_service(&ctx)
        .refund_task_bounty(&task_id, "contributor unreachable")
        .await
        .unwrap_err();
    assert_eq!(err, AppError::EscrowBusy { task_id });
    assert_eq!(gateway.refund_count(), 0);
});

#[tokio::test(flavor = "multi_thread")]
async fn deferred_release_reports_pending() {
    let (state, gateway) = create_test_state_with(test_settlement(false)).await;
    let (_task, _contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);

    let outcome = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(matches!(outcome, SettlementOutcome::SecondaryEffectPending { .. }));
    assert_eq!(gateway.release_count(), 0);
}

test_with_state!(accept_rolls_back_when_contributor_is_gone, |state, gateway| {
    let (task, contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    state
        .db
        .client
        .query("DELETE $user;")
        .bind(("user", contributor.id.clone()))
        .await
        .unwrap()
        .check()
        .unwrap();

    let err = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::EntityFailIdNotFound { .. }));

    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Submitted);
    assert!(task_after.bounty_escrow_id.is_some());
    let unchanged = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(unchanged.verification_status, VerificationStatus::Unverified);
    assert!(unchanged.accepted_at.is_none());
    let ledger = state
        .db
        .reputation_events
        .sum_by_user(&key(&contributor.id))
        .await
        .unwrap();
    assert_eq!(ledger, 0);
    assert_eq!(gateway.release_count(), 0);
});

test_with_state!(accepting_on_archived_task_changes_nothing, |state, gateway| {
    let (task, contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    state
        .task_service(&ctx)
        .archive_task(&key(&task.id))
        .await
        .unwrap();

    let err = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AppError::InvalidTransition {
            from: TaskStatus::Archived,
            to: TaskStatus::Completed
        }
    );

    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Archived);
    let unchanged = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert_eq!(unchanged.verification_status, VerificationStatus::Unverified);
    let reputation = state.reputation_service(&ctx);
    assert_eq!(reputation.get_score(&key(&contributor.id)).await.unwrap(), 0);
    assert_eq!(gateway.release_count(), 0);
});
