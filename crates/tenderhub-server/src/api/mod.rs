mod bids;
mod health;
mod tenders;

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
    Router,
};
use serde::Deserialize;
use tenderhub_core::Page;

use crate::error::AppError;
use crate::AppState;

/// Routes that require a bearer token
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(tenders::router())
        .merge(bids::router())
}

/// Routes reachable without a token
pub fn public_router() -> Router<AppState> {
    health::router()
}

/// Query parameters shared by the tender and bid endpoints.
///
/// Everything is kept as raw text so that a missing or malformed value is
/// judged by the operation, in its own order of checks, rather than rejected
/// up front by the extractor. A query string that does not decode at all is
/// answered as a bad request with the usual error body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Params {
    pub username: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub status: Option<String>,
    pub decision: Option<String>,
    pub bid_feedback: Option<String>,
    pub author_username: Option<String>,
    pub requester_username: Option<String>,
}

impl<S: Send + Sync> FromRequestParts<S> for Params {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<Params>::from_request_parts(parts, state).await?;
        Ok(params)
    }
}

impl Params {
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn page(&self) -> Page {
        Page::from_query(self.limit.as_deref(), self.offset.as_deref())
    }
}
