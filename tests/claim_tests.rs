mod helpers;

use bounty_board::entities::claim::ClaimStatus;
use bounty_board::entities::task::TaskStatus;
use bounty_board::interfaces::repositories::claim::ClaimFilter;
use bounty_board::middleware::ctx::Ctx;
use bounty_board::middleware::error::{AppError, ErrorKind};
use helpers::task_helpers::create_open_task;
use helpers::user_helpers::{create_fake_user, key};

test_with_state!(claim_open_task_then_second_user_gets_not_open, |state, _gateway| {
    let (task, _owner) = create_open_task(&state).await;
    let user_x = create_fake_user(&state).await;
    let user_y = create_fake_user(&state).await;
    let ctx = Ctx::new(None);
    let claims = state.claim_service(&ctx);

    let claim = claims
        .create_claim(&key(&task.id), &key(&user_x.id))
        .await
        .expect("first claim");
    assert_eq!(claim.status, ClaimStatus::Pending);
    assert_eq!(claim.user, user_x.id);
    assert!(claim.mentor.is_none());

    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Claimed);

    let err = claims
        .create_claim(&key(&task.id), &key(&user_y.id))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AppError::TaskNotOpen {
            task_id: key(&task.id),
            current: TaskStatus::Claimed
        }
    );
    assert_eq!(err.kind(), ErrorKind::Conflict);
});

test_with_state!(same_user_claiming_twice_is_duplicate, |state, _gateway| {
    let (task, _owner) = create_open_task(&state).await;
    let user = create_fake_user(&state).await;
    let ctx = Ctx::new(None);
    let claims = state.claim_service(&ctx);

    claims
        .create_claim(&key(&task.id), &key(&user.id))
        .await
        .unwrap();
    let err = claims
        .create_claim(&key(&task.id), &key(&user.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateClaim { .. }));
});

test_with_state!(concurrent_claims_have_one_winner, |state, _gateway| {
    let (task, _owner) = create_open_task(&state).await;
    let user_x = create_fake_user(&state).await;
    let user_y = create_fake_user(&state).await;
    let ctx = Ctx::new(None);
    let claims = state.claim_service(&ctx);
    let task_id = key(&task.id);
    let (x_id, y_id) = (key(&user_x.id), key(&user_y.id));

    let (first, second) = tokio::join!(
        claims.create_claim(&task_id, &x_id),
        claims.create_claim(&task_id, &y_id)
    );
    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(
        loser,
        &AppError::TaskNotOpen {
            task_id: task_id.clone(),
            current: TaskStatus::Claimed
        }
    );

    let active = claims
        .list_claims(ClaimFilter {
            task_id: Some(task_id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
});

test_with_state!(claim_requires_existing_task_and_user, |state, _gateway| {
    let (task, _owner) = create_open_task(&state).await;
    let user = create_fake_user(&state).await;
    let ctx = Ctx::new(None);
    let claims = state.claim_service(&ctx);

    let err = claims
        .create_claim("missing", &key(&user.id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = claims
        .create_claim(&key(&task.id), "ghost")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let task_after = state.task_service(&ctx).get_task(&key(&task.id)).await.unwrap();
    assert_eq!(task_after.status, TaskStatus::Open);
});

test_with_state!(mentored_claim_records_mentor, |state, _gateway| {
    let (task, _owner) = create_open_task(&state).await;
    let user = create_fake_user(&state).await;
    let mentor = create_fake_user(&state).await;
    let ctx = Ctx::new(None);

    let claim = state
        .claim_service(&ctx)
        .create_mentored_claim(&key(&task.id), &key(&user.id), &key(&mentor.id))
        .await
        .unwrap();
    assert_eq!(claim.mentor, Some(mentor.id));
});

test_with_state!(archived_task_cannot_be_claimed, |state, _gateway| {
    let (task, owner) = create_open_task(&state).await;
    let user = create_fake_user(&state).await;
    let ctx = Ctx::new(Some(key(&owner.id)));

    let archived = state
        .task_service(&ctx)
        .archive_task(&key(&task.id))
        .await
        .unwrap();
    assert_eq!(archived.status, TaskStatus::Archived);

    let err = state
        .claim_service(&ctx)
        .create_claim(&key(&task.id), &key(&user.id))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::TaskNotOpen {
            current: TaskStatus::Archived,
            ..
        }
    ));

    let err = state
        .task_service(&ctx)
        .archive_task(&key(&task.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition { .. }));
});
