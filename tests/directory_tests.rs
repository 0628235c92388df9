mod helpers;

use bounty_board::entities::task::TaskStatus;
use bounty_board::middleware::ctx::Ctx;
use bounty_board::middleware::error::ErrorKind;
use bounty_board::services::task_service::TaskFilter;
use helpers::task_helpers::fake_task_input;
use helpers::user_helpers::{create_fake_project, create_fake_user, key};

test_with_state!(projects_are_listed_per_owner, |state, _gateway| {
    let owner = create_fake_user(&state).await;
    let other = create_fake_user(&state).await;
    let first = create_fake_project(&state, &owner).await;
    let second = create_fake_project(&state, &owner).await;
    let foreign = create_fake_project(&state, &other).await;
    let ctx = Ctx::new(Some(key(&owner.id)));
    let users = state.user_service(&ctx);

    let owned = users.list_projects(Some(&key(&owner.id))).await.unwrap();
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().any(|p| p.id == first.id));
    assert!(owned.iter().any(|p| p.id == second.id));

    let all = users.list_projects(None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().any(|p| p.id == foreign.id));

    let fetched = users.get_project(&key(&first.id)).await.unwrap();
    assert_eq!(fetched.owner, owner.id);
    let err = users.get_project("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
});

test_with_state!(tasks_are_filtered_by_project_and_status, |state, _gateway| {
    let owner = create_fake_user(&state).await;
    let project = create_fake_project(&state, &owner).await;
    let other_project = create_fake_project(&state, &owner).await;
    let ctx = Ctx::new(Some(key(&owner.id)));
    let tasks = state.task_service(&ctx);

    let open = tasks
        .create_task(&key(&project.id), fake_task_input())
        .await
        .unwrap();
    let archived = tasks
        .create_task(&key(&project.id), fake_task_input())
        .await
        .unwrap();
    tasks.archive_task(&key(&archived.id)).await.unwrap();
    tasks
        .create_task(&key(&other_project.id), fake_task_input())
        .await
        .unwrap();

    let in_project = tasks
        .list_tasks(TaskFilter {
            project_id: Some(key(&project.id)),
            status: None,
        })
        .await
        .unwrap();
    assert_eq!(in_project.len(), 2);

    let open_in_project = tasks
        .list_tasks(TaskFilter {
            project_id: Some(key(&project.id)),
            status: Some(TaskStatus::Open),
        })
        .await
        .unwrap();
    assert_eq!(open_in_project.len(), 1);
    assert_eq!(open_in_project[0].id, open.id);

    let err = tasks
        .create_task("missing", fake_task_input())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
});
