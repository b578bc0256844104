//! Test helpers: an in-memory server with two organizations.
//!
//! `alice` is responsible for Acme, which publishes tenders. `bob` is
//! responsible for Bolt, which bids on them. `carol` belongs to nobody.
//!
//! Run with: `cargo test -p tenderhub-server`

#![allow(dead_code)]

use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tenderhub_server::db::{MemoryStore, Store};
use tenderhub_server::{build_router, AppState};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-for-integration-tests";

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub acme: Uuid,
    pub bolt: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn auth(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Sign a token with the test secret, expiring `exp_offset` seconds from now
pub fn mint_token(secret: &str, exp_offset: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + exp_offset;
    encode(
        &Header::default(),
        &json!({ "sub": "tests", "exp": exp }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub async fn setup_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let alice = store.add_user("alice").await;
    let bob = store.add_user("bob").await;
    store.add_user("carol").await;
    let acme = store.add_organization("Acme").await;
    let bolt = store.add_organization("Bolt").await;
    store.add_responsible(acme.id, alice.id).await;
    store.add_responsible(bolt.id, bob.id).await;

    let shared: Arc<dyn Store> = store.clone();
    let app = build_router(AppState::new(shared, TEST_JWT_SECRET));
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        store,
        acme: acme.id,
        bolt: bolt.id,
        token: mint_token(TEST_JWT_SECRET, 3600),
    }
}

/// Create a tender for Acme as alice and return its JSON
pub async fn create_tender(app: &TestApp, name: &str, status: &str) -> Value {
    let response = app
        .client()
        .post("/api/tenders/new")
        .add_header("Authorization", app.auth())
        .json(&json!({
            "name": name,
            "description": format!("{} description", name),
            "serviceType": "Construction",
            "status": status,
            "organizationId": app.acme,
            "creatorUsername": "alice",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

/// Submit a bid for Bolt as bob and return its JSON
pub async fn create_bid(app: &TestApp, tender_id: &str, name: &str) -> Value {
    let response = app
        .client()
        .post("/api/bids/new")
        .add_header("Authorization", app.auth())
        .json(&json!({
            "name": name,
            "description": "We deliver on time",
            "tenderId": tender_id,
            "authorType": "Organization",
            "organizationId": app.bolt,
            "creatorUsername": "bob",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    response.json()
}

pub fn id_of(entity: &Value) -> String {
    entity["id"].as_str().expect("entity has an id").to_string()
}
