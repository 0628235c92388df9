use async_trait::async_trait;

use crate::entities::string_set::StringSet;
use crate::entities::user::User;
use crate::middleware::error::AppResult;

#[derive(Debug, Clone)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub roles: StringSet,
}

#[async_trait]
pub trait UserRepositoryInterface {
    async fn create(&self, data: UserCreate) -> AppResult<User>;
    async fn get_by_id(&self, id: &str) -> AppResult<Option<User>>;
    async fn exists(&self, id: &str) -> AppResult<bool>;
}
