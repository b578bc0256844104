use chrono::Utc;
use tenderhub_core::{NewTender, Page, ServiceType, Tender, TenderPatch, TenderStatus};
use tenderhub_history::{parse_target_version, TenderSnapshot};

use super::access::{identify, parse_id, require_responsible};
use crate::db::{tender_not_found, Store};
use crate::error::AppError;

/// Publish a new tender on behalf of one of the creator's organizations
pub async fn create(store: &dyn Store, input: NewTender) -> Result<Tender, AppError> {
    let user = identify(store, Some(input.creator_username.as_str())).await?;
    require_responsible(store, &user, input.organization_id).await?;
    input.check()?;

    let tender = Tender::new(&input, Utc::now());
    store.create_tender(&tender).await?;

    tracing::info!(tender_id = %tender.id, username = %user.username, "tender created");
    Ok(tender)
}

/// Published tenders visible to everyone, optionally narrowed to some service types
pub async fn list_published(
    store: &dyn Store,
    service_types: &[String],
    page: Page,
) -> Result<Vec<Tender>, AppError> {
    let filter = service_types
        .iter()
        .map(|raw| raw.parse::<ServiceType>())
        .collect::<Result<Vec<_>, _>>()?;

    store.list_published_tenders(&filter, page).await
}

/// Tenders of every organization the user is responsible for
pub async fn list_mine(
    store: &dyn Store,
    username: Option<&str>,
    page: Page,
) -> Result<Vec<Tender>, AppError> {
    let user = identify(store, username).await?;
    let organizations = store.organizations_of(user.id).await?;
    store.list_tenders_of_organizations(&organizations, page).await
}

pub async fn status(
    store: &dyn Store,
    tender_id: &str,
    username: Option<&str>,
) -> Result<TenderStatus, AppError> {
    identify(store, username).await?;
    let tender = load(store, tender_id).await?;
    Ok(tender.status)
}

/// Set a tender's status to any of its defined values
pub async fn set_status(
    store: &dyn Store,
    tender_id: &str,
    username: Option<&str>,
    status: Option<&str>,
) -> Result<Tender, AppError> {
    let user = identify(store, username).await?;
    let tender = load(store, tender_id).await?;
    require_responsible(store, &user, tender.organization_id).await?;

    let status: TenderStatus = status
        .ok_or_else(|| AppError::BadRequest("status is required".to_string()))?
        .parse()?;

    let updated = store
        .set_tender_status(tender.id, status)
        .await?
        .ok_or_else(|| tender_not_found(tender.id))?;

    tracing::info!(tender_id = %updated.id, status = %updated.status, "tender status changed");
    Ok(updated)
}

/// Apply a patch to the versioned fields.
///
/// `patch` is the request body as decoded; a body that failed to decode is
/// only reported once the caller is known to be allowed to edit the tender.
pub async fn edit(
    store: &dyn Store,
    tender_id: &str,
    username: Option<&str>,
    patch: Result<TenderPatch, AppError>,
) -> Result<Tender, AppError> {
    let user = identify(store, username).await?;
    let tender = load(store, tender_id).await?;
    require_responsible(store, &user, tender.organization_id).await?;
    let patch = patch?;
    patch.check()?;

    let updated = store.edit_tender(tender.id, &patch).await?;

    tracing::info!(tender_id = %updated.id, version = updated.version, "tender edited");
    Ok(updated)
}

/// Restore the fields of an earlier version as a new version
pub async fn rollback(
    store: &dyn Store,
    tender_id: &str,
    username: Option<&str>,
    version: &str,
) -> Result<Tender, AppError> {
    let user = identify(store, username).await?;
    let tender = load(store, tender_id).await?;
    require_responsible(store, &user, tender.organization_id).await?;
    let target = parse_target_version(version)?;

    let updated = store.rollback_tender(tender.id, target).await?;

    tracing::info!(
        tender_id = %updated.id,
        restored = target,
        version = updated.version,
        "tender rolled back"
    );
    Ok(updated)
}

pub async fn versions(
    store: &dyn Store,
    tender_id: &str,
    username: Option<&str>,
) -> Result<Vec<TenderSnapshot>, AppError> {
    let user = identify(store, username).await?;
    let tender = load(store, tender_id).await?;
    require_responsible(store, &user, tender.organization_id).await?;
    store.tender_versions(tender.id).await
}

pub(crate) async fn load(store: &dyn Store, raw_id: &str) -> Result<Tender, AppError> {
    let id = parse_id(raw_id, "Tender")?;
    store
        .get_tender(id)
        .await?
        .ok_or_else(|| tender_not_found(id))
}
