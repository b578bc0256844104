use axum::{routing::get, Router};

use crate::AppState;

async fn ping() -> &'static str {
    "ok"
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ping", get(ping))
}
