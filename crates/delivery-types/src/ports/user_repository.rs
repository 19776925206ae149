use async_trait::async_trait;

use super::RepoError;
use crate::domain::user::User;

#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user. A taken username yields `RepoError::Conflict`.
    async fn create(&self, user: User) -> Result<(), RepoError>;

    async fn password_hash(&self, username: &str) -> Result<Option<String>, RepoError>;
}
