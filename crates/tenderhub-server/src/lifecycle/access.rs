use tenderhub_core::{AuthorType, Bid, User};
use uuid::Uuid;

use crate::db::{AuthorScope, Store};
use crate::error::AppError;

/// Resolve the acting user from the username the request names
pub async fn identify(store: &dyn Store, username: Option<&str>) -> Result<User, AppError> {
    let username = username
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Unauthorized("username is required".to_string()))?;

    store
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(format!("user {} does not exist", username)))
}

pub async fn is_responsible(
    store: &dyn Store,
    user_id: Uuid,
    organization_id: Uuid,
) -> Result<bool, AppError> {
    store.is_responsible(user_id, organization_id).await
}

/// Fail with `Forbidden` unless `user` is responsible for `organization_id`
pub async fn require_responsible(
    store: &dyn Store,
    user: &User,
    organization_id: Uuid,
) -> Result<(), AppError> {
    if is_responsible(store, user.id, organization_id).await? {
        return Ok(());
    }
    tracing::warn!(
        username = %user.username,
        organization_id = %organization_id,
        "user is not responsible for organization"
    );
    Err(forbidden())
}

/// Fail with `Forbidden` unless `user` may act as the bid's author
pub async fn require_bid_author(store: &dyn Store, user: &User, bid: &Bid) -> Result<(), AppError> {
    match bid.author_type {
        AuthorType::Organization => require_responsible(store, user, bid.author_id).await,
        AuthorType::User if bid.author_id == user.id => Ok(()),
        AuthorType::User => {
            tracing::warn!(username = %user.username, bid_id = %bid.id, "user is not the bid author");
            Err(forbidden())
        }
    }
}

/// Everyone `user` can author bids as
pub async fn author_scope(store: &dyn Store, user: &User) -> Result<AuthorScope, AppError> {
    Ok(AuthorScope {
        user_id: user.id,
        organization_ids: store.organizations_of(user.id).await?,
    })
}

/// Parse a record id from a path segment; a malformed id names no record
pub fn parse_id(raw: &str, kind: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("{} {} not found", kind, raw)))
}

fn forbidden() -> AppError {
    AppError::Forbidden("insufficient rights to perform this action".to_string())
}
