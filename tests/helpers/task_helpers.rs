use bounty_board::entities::contribution::Contribution;
use bounty_board::entities::money::Amount;
use bounty_board::entities::task::{Difficulty, Task};
use bounty_board::entities::user::User;
use bounty_board::middleware::ctx::Ctx;
use bounty_board::middleware::mw_ctx::CtxState;
use bounty_board::services::task_service::TaskInput;
use fake::{faker, Fake};

use super::user_helpers::{create_fake_project, create_fake_user, key};

pub const PR_REFERENCE: &str = "https://github.com/example/bounty/pull/7";

#[allow(dead_code)]
pub fn fake_task_input() -> TaskInput {
    TaskInput {
        title: faker::lorem::en::Sentence(3..6).fake(),
        description: faker::lorem::en::Paragraph(1..2).fake(),
        difficulty: Difficulty::Medium,
        estimated_hours: 8,
        tags: vec!["backend".to_string()],
        skills_required: vec!["rust".to_string()],
    }
}

/// Open task in a fresh project, returns the task and the project owner.
#[allow(dead_code)]
pub async fn create_open_task(state: &CtxState) -> (Task, User) {
    let owner = create_fake_user(state).await;
    let project = create_fake_project(state, &owner).await;
    let ctx = Ctx::new(Some(key(&owner.id)));
    let task = state
        .task_service(&ctx)
        .create_task(&key(&project.id), fake_task_input())
        .await
        .expect("create task");
    (task, owner)
}

#[allow(dead_code)]
pub async fn fund_task(state: &CtxState, task: &Task, funder: &User, major: i64) {
    let ctx = Ctx::new(Some(key(&funder.id)));
    state
        .escrow_service(&ctx)
        .fund_task_bounty(&key(&task.id), &key(&funder.id), Amount::from_major(major), None)
        .await
        .expect("fund task");
}

/// Task claimed and submitted by a new contributor.
#[allow(dead_code)]
pub async fn create_submitted_task(
    state: &CtxState,
    bounty_major: Option<i64>,
    reference: &str,
) -> (Task, User, Contribution) {
    let (task, owner) = create_open_task(state).await;
    if let Some(major) = bounty_major {
        fund_task(state, &task, &owner, major).await;
    }
    let contributor = create_fake_user(state).await;
    let ctx = Ctx::new(Some(key(&contributor.id)));
    state
        .claim_service(&ctx)
        .create_claim(&key(&task.id), &key(&contributor.id))
        .await
        .expect("claim task");
    let contribution = state
        .contribution_service(&ctx)
        .submit_contribution(&key(&task.id), &key(&contributor.id), reference)
        .await
        .expect("submit contribution");
    let task = state
        .task_service(&ctx)
        .get_task(&key(&task.id))
        .await
        .expect("task");
    (task, contributor, contribution)
}
