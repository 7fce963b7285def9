use async_trait::async_trait;
use uuid::Uuid;

use super::User;
use crate::domain::DomainResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `Conflict` if the email is already registered
    async fn save(&self, user: User) -> DomainResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>>;
}
