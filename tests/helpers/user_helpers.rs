use bounty_board::database::surrdb_utils::record_key;
use bounty_board::entities::project::{Project, Visibility};
use bounty_board::entities::user::User;
use bounty_board::middleware::ctx::Ctx;
use bounty_board::middleware::mw_ctx::CtxState;
use bounty_board::services::user_service::{ProjectInput, UserInput};
use fake::{faker, Fake};
use surrealdb::sql::Thing;
use uuid::Uuid;

#[allow(dead_code)]
pub fn key(id: &Thing) -> String {
    record_key(id)
}

#[allow(dead_code)]
pub fn fake_user_input() -> UserInput {
    let base: String = faker::internet::en::Username().fake();
    let suffix = Uuid::new_v4().simple().to_string();
    let username: String = format!("{base}_{}", &suffix[..8]).chars().take(32).collect();
    UserInput {
        email: format!("user_{suffix}@example.com"),
        username,
        avatar_url: None,
        roles: vec![],
    }
}

#[allow(dead_code)]
pub async fn create_fake_user(state: &CtxState) -> User {
    let ctx = Ctx::new(None);
    state
        .user_service(&ctx)
        .create_user(fake_user_input())
        .await
        .expect("create user")
}

#[allow(dead_code)]
pub async fn create_fake_project(state: &CtxState, owner: &User) -> Project {
    let ctx = Ctx::new(Some(key(&owner.id)));
    let title: String = faker::lorem::en::Sentence(2..4).fake();
    state
        .user_service(&ctx)
        .create_project(
            &key(&owner.id),
            ProjectInput {
                title,
                short_desc: faker::lorem::en::Sentence(4..8).fake(),
                repo_url: Some("https://github.com/example/bounty".to_string()),
                tags: vec!["rust".to_string()],
                visibility: Visibility::Public,
            },
        )
        .await
        .expect("create project")
}
