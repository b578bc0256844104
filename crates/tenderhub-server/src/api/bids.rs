use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tenderhub_core::{Bid, BidFeedback, BidPatch, NewBid};
use tenderhub_history::BidSnapshot;

use super::Params;
use crate::error::AppError;
use crate::lifecycle::bids;
use crate::AppState;

/// Submit a bid
async fn create_bid(
    State(state): State<AppState>,
    body: Result<Json<NewBid>, JsonRejection>,
) -> Result<Json<Bid>, AppError> {
    let Json(input) = body?;
    let bid = bids::create(state.store.as_ref(), input).await?;
    Ok(Json(bid))
}

async fn my_bids(
    State(state): State<AppState>,
    params: Params,
) -> Result<Json<Vec<Bid>>, AppError> {
    let found = bids::list_mine(state.store.as_ref(), params.username(), params.page()).await?;
    Ok(Json(found))
}

/// Bids placed on a tender, for the tender's organization
async fn tender_bids(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
    params: Params,
) -> Result<Json<Vec<Bid>>, AppError> {
    let found = bids::list_for_tender(
        state.store.as_ref(),
        &tender_id,
        params.username(),
        params.page(),
    )
    .await?;
    Ok(Json(found))
}

async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Value>, AppError> {
    let status = bids::status(state.store.as_ref(), &id, params.username()).await?;
    Ok(Json(json!({ "status": status })))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Bid>, AppError> {
    let bid = bids::set_status(
        state.store.as_ref(),
        &id,
        params.username(),
        params.status.as_deref(),
    )
    .await?;
    Ok(Json(bid))
}

async fn edit_bid(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
    body: Result<Json<BidPatch>, JsonRejection>,
) -> Result<Json<Bid>, AppError> {
    let patch = body.map(|Json(patch)| patch).map_err(AppError::from);
    let bid = bids::edit(state.store.as_ref(), &id, params.username(), patch).await?;
    Ok(Json(bid))
}

async fn rollback_bid(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
    params: Params,
) -> Result<Json<Bid>, AppError> {
    let bid = bids::rollback(state.store.as_ref(), &id, params.username(), &version).await?;
    Ok(Json(bid))
}

async fn bid_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Vec<BidSnapshot>>, AppError> {
    let history = bids::versions(state.store.as_ref(), &id, params.username()).await?;
    Ok(Json(history))
}

async fn submit_decision(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Bid>, AppError> {
    let bid = bids::submit_decision(
        state.store.as_ref(),
        &id,
        params.username(),
        params.decision.as_deref(),
    )
    .await?;
    Ok(Json(bid))
}

async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Bid>, AppError> {
    let bid = bids::submit_feedback(
        state.store.as_ref(),
        &id,
        params.username(),
        params.bid_feedback.as_deref(),
    )
    .await?;
    Ok(Json(bid))
}

/// Feedback an author has received, as seen by the tender's organization
async fn reviews(
    State(state): State<AppState>,
    Path(tender_id): Path<String>,
    params: Params,
) -> Result<Json<Vec<BidFeedback>>, AppError> {
    let found = bids::reviews(
        state.store.as_ref(),
        &tender_id,
        params.author_username.as_deref(),
        params.requester_username.as_deref(),
        params.page(),
    )
    .await?;
    Ok(Json(found))
}

// Every bid route names its first segment `{id}`; for `list` and `reviews`
// it is the tender's id.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bids/new", post(create_bid))
        .route("/api/bids/my", get(my_bids))
        .route("/api/bids/{id}/list", get(tender_bids))
        .route("/api/bids/{id}/status", get(get_status).put(update_status))
        .route("/api/bids/{id}/edit", patch(edit_bid))
        .route("/api/bids/{id}/rollback/{version}", put(rollback_bid))
        .route("/api/bids/{id}/versions", get(bid_versions))
        .route("/api/bids/{id}/submit_decision", put(submit_decision))
        .route("/api/bids/{id}/feedback", put(submit_feedback))
        .route("/api/bids/{id}/reviews", get(reviews))
}
