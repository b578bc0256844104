use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tenderhub_core::{NewTender, Page, Tender, TenderPatch};
use tenderhub_history::TenderSnapshot;

use super::Params;
use crate::error::AppError;
use crate::lifecycle::tenders;
use crate::AppState;

/// Create a tender
async fn create_tender(
    State(state): State<AppState>,
    body: Result<Json<NewTender>, JsonRejection>,
) -> Result<Json<Tender>, AppError> {
    let Json(input) = body?;
    let tender = tenders::create(state.store.as_ref(), input).await?;
    Ok(Json(tender))
}

/// List published tenders; `service_type` may repeat
async fn list_tenders(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<Tender>>, AppError> {
    let Query(pairs) = query?;
    let mut service_types = Vec::new();
    let (mut limit, mut offset) = (None, None);
    for (key, value) in &pairs {
        match key.as_str() {
            "service_type" => service_types.push(value.clone()),
            "limit" => limit = Some(value.as_str()),
            "offset" => offset = Some(value.as_str()),
            _ => {}
        }
    }

    let page = Page::from_query(limit, offset);
    let tenders = tenders::list_published(state.store.as_ref(), &service_types, page).await?;
    Ok(Json(tenders))
}

/// List the tenders of the caller's organizations
async fn my_tenders(
    State(state): State<AppState>,
    params: Params,
) -> Result<Json<Vec<Tender>>, AppError> {
    let tenders = tenders::list_mine(state.store.as_ref(), params.username(), params.page()).await?;
    Ok(Json(tenders))
}

async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Value>, AppError> {
    let status = tenders::status(state.store.as_ref(), &id, params.username()).await?;
    Ok(Json(json!({ "status": status })))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Tender>, AppError> {
    let tender = tenders::set_status(
        state.store.as_ref(),
        &id,
        params.username(),
        params.status.as_deref(),
    )
    .await?;
    Ok(Json(tender))
}

/// Edit versioned fields
async fn edit_tender(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
    body: Result<Json<TenderPatch>, JsonRejection>,
) -> Result<Json<Tender>, AppError> {
    let patch = body.map(|Json(patch)| patch).map_err(AppError::from);
    let tender = tenders::edit(state.store.as_ref(), &id, params.username(), patch).await?;
    Ok(Json(tender))
}

async fn rollback_tender(
    State(state): State<AppState>,
    Path((id, version)): Path<(String, String)>,
    params: Params,
) -> Result<Json<Tender>, AppError> {
    let tender = tenders::rollback(state.store.as_ref(), &id, params.username(), &version).await?;
    Ok(Json(tender))
}

async fn tender_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: Params,
) -> Result<Json<Vec<TenderSnapshot>>, AppError> {
    let history = tenders::versions(state.store.as_ref(), &id, params.username()).await?;
    Ok(Json(history))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tenders", get(list_tenders))
        .route("/api/tenders/new", post(create_tender))
        .route("/api/tenders/my", get(my_tenders))
        .route("/api/tenders/{id}/status", get(get_status).put(update_status))
        .route("/api/tenders/{id}/edit", patch(edit_tender))
        .route("/api/tenders/{id}/rollback/{version}", put(rollback_tender))
        .route("/api/tenders/{id}/versions", get(tender_versions))
}
