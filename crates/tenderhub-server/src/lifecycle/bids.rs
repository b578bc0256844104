use chrono::Utc;
use tenderhub_core::{
    check_feedback, AuthorType, Bid, BidDecision, BidFeedback, BidPatch, BidStatus, NewBid, Page,
};
use tenderhub_history::{parse_target_version, BidSnapshot};

use super::access::{author_scope, identify, parse_id, require_bid_author, require_responsible};
use super::tenders;
use crate::db::{bid_not_found, tender_not_found, Store};
use crate::error::AppError;

/// Submit a bid against a tender, either personally or for an organization
pub async fn create(store: &dyn Store, input: NewBid) -> Result<Bid, AppError> {
    let user = identify(store, Some(input.creator_username.as_str())).await?;
    if store.get_tender(input.tender_id).await?.is_none() {
        return Err(tender_not_found(input.tender_id));
    }

    let author_id = match input.author_type {
        AuthorType::Organization => {
            let organization_id = input.organization_id.ok_or_else(|| {
                AppError::BadRequest("organizationId is required for organization bids".to_string())
            })?;
            require_responsible(store, &user, organization_id).await?;
            organization_id
        }
        AuthorType::User => user.id,
    };
    input.check()?;

    let bid = Bid::new(&input, author_id, Utc::now());
    store.create_bid(&bid).await?;

    tracing::info!(
        bid_id = %bid.id,
        tender_id = %bid.tender_id,
        author_type = %bid.author_type,
        "bid created"
    );
    Ok(bid)
}

/// Bids the user wrote personally or through any organization they are responsible for
pub async fn list_mine(
    store: &dyn Store,
    username: Option<&str>,
    page: Page,
) -> Result<Vec<Bid>, AppError> {
    let user = identify(store, username).await?;
    let scope = author_scope(store, &user).await?;
    store.list_bids_by_authors(&scope, page).await
}

pub async fn list_for_tender(
    store: &dyn Store,
    tender_id: &str,
    username: Option<&str>,
    page: Page,
) -> Result<Vec<Bid>, AppError> {
    let user = identify(store, username).await?;
    let tender = tenders::load(store, tender_id).await?;
    require_responsible(store, &user, tender.organization_id).await?;
    store.list_bids_for_tender(tender.id, page).await
}

pub async fn status(
    store: &dyn Store,
    bid_id: &str,
    username: Option<&str>,
) -> Result<BidStatus, AppError> {
    identify(store, username).await?;
    let bid = load(store, bid_id).await?;
    Ok(bid.status)
}

pub async fn set_status(
    store: &dyn Store,
    bid_id: &str,
    username: Option<&str>,
    status: Option<&str>,
) -> Result<Bid, AppError> {
    let user = identify(store, username).await?;
    let bid = load(store, bid_id).await?;
    require_bid_author(store, &user, &bid).await?;

    let status: BidStatus = status
        .ok_or_else(|| AppError::BadRequest("status is required".to_string()))?
        .parse()?;

    let updated = store
        .set_bid_status(bid.id, status)
        .await?
        .ok_or_else(|| bid_not_found(bid.id))?;

    tracing::info!(bid_id = %updated.id, status = %updated.status, "bid status changed");
    Ok(updated)
}

/// Apply a patch to the bid's versioned fields; a body that failed to decode
/// is reported after the authorship check
pub async fn edit(
    store: &dyn Store,
    bid_id: &str,
    username: Option<&str>,
    patch: Result<BidPatch, AppError>,
) -> Result<Bid, AppError> {
    let user = identify(store, username).await?;
    let bid = load(store, bid_id).await?;
    require_bid_author(store, &user, &bid).await?;
    let patch = patch?;
    patch.check()?;

    let updated = store.edit_bid(bid.id, &patch).await?;

    tracing::info!(bid_id = %updated.id, version = updated.version, "bid edited");
    Ok(updated)
}

pub async fn rollback(
    store: &dyn Store,
    bid_id: &str,
    username: Option<&str>,
    version: &str,
) -> Result<Bid, AppError> {
    let user = identify(store, username).await?;
    let bid = load(store, bid_id).await?;
    require_bid_author(store, &user, &bid).await?;
    let target = parse_target_version(version)?;

    let updated = store.rollback_bid(bid.id, target).await?;

    tracing::info!(
        bid_id = %updated.id,
        restored = target,
        version = updated.version,
        "bid rolled back"
    );
    Ok(updated)
}

pub async fn versions(
    store: &dyn Store,
    bid_id: &str,
    username: Option<&str>,
) -> Result<Vec<BidSnapshot>, AppError> {
    let user = identify(store, username).await?;
    let bid = load(store, bid_id).await?;
    require_bid_author(store, &user, &bid).await?;
    store.bid_versions(bid.id).await
}

/// Approve or reject a bid on behalf of the tender's organization.
///
/// A single approval closes the tender; there is no quorum among the
/// organization's responsible users.
pub async fn submit_decision(
    store: &dyn Store,
    bid_id: &str,
    username: Option<&str>,
    decision: Option<&str>,
) -> Result<Bid, AppError> {
    let user = identify(store, username).await?;
    let bid = load(store, bid_id).await?;
    let tender = store
        .get_tender(bid.tender_id)
        .await?
        .ok_or_else(|| tender_not_found(bid.tender_id))?;
    require_responsible(store, &user, tender.organization_id).await?;

    let decision: BidDecision = decision
        .ok_or_else(|| AppError::BadRequest("decision is required".to_string()))?
        .parse()?;

    let (bid, tender) = store.apply_decision(bid.id, decision).await?;

    tracing::info!(
        bid_id = %bid.id,
        decision = %decision,
        tender_status = %tender.status,
        "bid decision recorded"
    );
    Ok(bid)
}

/// Attach a reviewer note to a bid; the bid itself is left untouched
pub async fn submit_feedback(
    store: &dyn Store,
    bid_id: &str,
    username: Option<&str>,
    feedback: Option<&str>,
) -> Result<Bid, AppError> {
    let user = identify(store, username).await?;
    let bid = load(store, bid_id).await?;
    let tender = store
        .get_tender(bid.tender_id)
        .await?
        .ok_or_else(|| tender_not_found(bid.tender_id))?;
    require_responsible(store, &user, tender.organization_id).await?;

    let text = feedback
        .ok_or_else(|| AppError::BadRequest("bidFeedback is required".to_string()))?;
    check_feedback(text)?;

    let feedback = BidFeedback::new(bid.id, text, Utc::now());
    store.add_feedback(&feedback).await?;

    tracing::info!(bid_id = %bid.id, feedback_id = %feedback.id, "bid feedback added");
    Ok(bid)
}

/// Feedback left on any bid the author wrote, as seen by the tender's organization
pub async fn reviews(
    store: &dyn Store,
    tender_id: &str,
    author_username: Option<&str>,
    requester_username: Option<&str>,
    page: Page,
) -> Result<Vec<BidFeedback>, AppError> {
    let requester = identify(store, requester_username).await?;
    let author = identify(store, author_username).await?;
    let tender = tenders::load(store, tender_id).await?;
    require_responsible(store, &requester, tender.organization_id).await?;

    let scope = author_scope(store, &author).await?;
    store.feedback_for_authors(&scope, page).await
}

async fn load(store: &dyn Store, raw_id: &str) -> Result<Bid, AppError> {
    let id = parse_id(raw_id, "Bid")?;
    store.get_bid(id).await?.ok_or_else(|| bid_not_found(id))
}
