mod helpers;

use bounty_board::jobs::bounty_release::retry_pending_releases;
use bounty_board::middleware::ctx::Ctx;
use bounty_board::services::outcome::SettlementOutcome;
use helpers::task_helpers::{create_submitted_task, PR_REFERENCE};
use helpers::user_helpers::key;
use helpers::{create_test_state_with, test_settlement};

#[tokio::test(flavor = "multi_thread")]
async fn sweep_releases_deferred_bounties_once() {
    let (state, gateway) = create_test_state_with(test_settlement(false)).await;
    let (_task_a, contributor_a, contribution_a) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let (_task_b, _contributor_b, contribution_b) =
        create_submitted_task(&state, Some(30), PR_REFERENCE).await;
    let ctx = Ctx::new(None);

    for contribution in [&contribution_a, &contribution_b] {
        let outcome = state
            .contribution_service(&ctx)
            .accept_contribution(&key(&contribution.id))
            .await
            .unwrap();
        assert!(matches!(outcome, SettlementOutcome::SecondaryEffectPending { .. }));
    }

    let released = retry_pending_releases(&state).await.unwrap();
    assert_eq!(released, 2);
    assert_eq!(gateway.release_count(), 2);

    let released = retry_pending_releases(&state).await.unwrap();
    assert_eq!(released, 0);
    assert_eq!(gateway.release_count(), 2);

    let payments = state
        .escrow_service(&ctx)
        .get_user_payments(&key(&contributor_a.id))
        .await
        .unwrap();
    assert_eq!(payments.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn sweep_skips_unverified_and_unfunded() {
    let (state, gateway) = create_test_state_with(test_settlement(false)).await;
    let (_task, _contributor, _pending) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let (_task, _contributor, unfunded) =
        create_submitted_task(&state, None, PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    state
        .contribution_service(&ctx)
        .accept_contribution(&key(&unfunded.id))
        .await
        .unwrap();

    let released = retry_pending_releases(&state).await.unwrap();
    assert_eq!(released, 0);
    assert_eq!(gateway.release_count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn sweep_retries_after_gateway_recovers() {
    let (state, gateway) = create_test_state_with(test_settlement(true)).await;
    let (_task, _contributor, contribution) =
        create_submitted_task(&state, Some(100), PR_REFERENCE).await;
    let ctx = Ctx::new(None);
    gateway.set_fail_release(true);

    let outcome = state
        .contribution_service(&ctx)
        .accept_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(matches!(outcome, SettlementOutcome::SecondaryEffectFailed { .. }));
    assert_eq!(retry_pending_releases(&state).await.unwrap(), 0);

    gateway.set_fail_release(false);
    assert_eq!(retry_pending_releases(&state).await.unwrap(), 1);
    let paid = state
        .contribution_service(&ctx)
        .get_contribution(&key(&contribution.id))
        .await
        .unwrap();
    assert!(paid.payment_id.is_some());
}
