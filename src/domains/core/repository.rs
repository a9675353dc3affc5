use crate::auth::AuthContext;
use crate::errors::DomainResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Lookup by primary key, shared by all repositories
#[async_trait]
pub trait FindById<T> {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<T>;
}

/// Soft deletion: the row is kept, flagged with `deleted_at`
#[async_trait]
pub trait SoftDeletable {
    async fn soft_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()>;
}

/// Hard deletion: the row is removed. Admin-only, enforced at the service layer.
#[async_trait]
pub trait HardDeletable {
    fn entity_name(&self) -> &'static str;

    async fn hard_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()>;
}
