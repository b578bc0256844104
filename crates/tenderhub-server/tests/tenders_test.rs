//! Tender API integration tests against the in-memory store.

mod helpers;

use helpers::{create_tender, id_of, mint_token, setup_test_app, TEST_JWT_SECRET};
use serde_json::{json, Value};

#[tokio::test]
async fn test_ping_needs_no_token() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/ping").await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client.get("/api/tenders").await;
    assert_eq!(response.status_code(), 401);
    let data: Value = response.json();
    assert!(data["reason"].is_string());

    let response = client
        .get("/api/tenders")
        .add_header("Authorization", "Basic abc")
        .await;
    assert_eq!(response.status_code(), 401);

    let expired = mint_token(TEST_JWT_SECRET, -3600);
    let response = client
        .get("/api/tenders")
        .add_header("Authorization", format!("Bearer {}", expired))
        .await;
    assert_eq!(response.status_code(), 401);

    let forged = mint_token("someone-elses-secret", 3600);
    let response = client
        .get("/api/tenders")
        .add_header("Authorization", format!("Bearer {}", forged))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_edit_edit_rollback_scenario() {
    let app = setup_test_app().await;
    let client = app.client();
    let tender = create_tender(&app, "A", "Created").await;
    let id = id_of(&tender);
    assert_eq!(tender["version"], 1);

    for (name, version) in [("B", 2), ("C", 3)] {
        let response = client
            .patch(&format!("/api/tenders/{}/edit", id))
            .add_query_param("username", "alice")
            .add_header("Authorization", app.auth())
            .json(&json!({ "name": name }))
            .await;
        assert_eq!(response.status_code(), 200);
        let data: Value = response.json();
        assert_eq!(data["name"], name);
        assert_eq!(data["version"], version);
    }

    let response = client
        .put(&format!("/api/tenders/{}/rollback/1", id))
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 200);
    let data: Value = response.json();
    assert_eq!(data["name"], "A");
    assert_eq!(data["version"], 4);

    let response = client
        .get(&format!("/api/tenders/{}/versions", id))
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 200);
    let history: Vec<Value> = response.json();
    let versions: Vec<i64> = history.iter().filter_map(|s| s["version"].as_i64()).collect();
    assert_eq!(versions, vec![1, 2, 3, 4]);
    assert_eq!(history[3]["name"], "A");
}

#[tokio::test]
async fn test_rollback_version_bounds() {
    let app = setup_test_app().await;
    let client = app.client();
    let id = id_of(&create_tender(&app, "A", "Created").await);

    for name in ["B", "C"] {
        let response = client
            .patch(&format!("/api/tenders/{}/edit", id))
            .add_query_param("username", "alice")
            .add_header("Authorization", app.auth())
            .json(&json!({ "name": name }))
            .await;
        assert_eq!(response.status_code(), 200);
    }

    for (version, expected) in [("0", 400u16), ("-1", 400), ("9999", 404)] {
        let response = client
            .put(&format!("/api/tenders/{}/rollback/{}", id, version))
            .add_query_param("username", "alice")
            .add_header("Authorization", app.auth())
            .await;
        assert_eq!(response.status_code(), expected, "rollback to {}", version);
    }

    let response = client
        .get(&format!("/api/tenders/{}/versions", id))
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .await;
    let history: Vec<Value> = response.json();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn test_outsider_cannot_mutate_but_can_list() {
    let app = setup_test_app().await;
    let client = app.client();
    let id = id_of(&create_tender(&app, "Bridge", "Published").await);

    let response = client
        .patch(&format!("/api/tenders/{}/edit", id))
        .add_query_param("username", "bob")
        .add_header("Authorization", app.auth())
        .json(&json!({ "name": "Hijacked" }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = client
        .put(&format!("/api/tenders/{}/rollback/1", id))
        .add_query_param("username", "bob")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 403);

    let response = client
        .put(&format!("/api/tenders/{}/status", id))
        .add_query_param("username", "bob")
        .add_query_param("status", "Closed")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 403);

    let response = client
        .get("/api/tenders")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 200);
    let listed: Vec<Value> = response.json();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["name"], "Bridge");
}

#[tokio::test]
async fn test_status_get_and_set() {
    let app = setup_test_app().await;
    let client = app.client();
    let id = id_of(&create_tender(&app, "A", "Created").await);

    let response = client
        .put(&format!("/api/tenders/{}/status", id))
        .add_query_param("username", "alice")
        .add_query_param("status", "Published")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 200);

    let response = client
        .get(&format!("/api/tenders/{}/status", id))
        .add_query_param("username", "carol")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 200);
    let data: Value = response.json();
    assert_eq!(data, json!({ "status": "Published" }));

    let response = client
        .put(&format!("/api/tenders/{}/status", id))
        .add_query_param("username", "alice")
        .add_query_param("status", "Archived")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_pagination_falls_back_to_defaults() {
    let app = setup_test_app().await;
    let client = app.client();
    for i in 0..7 {
        create_tender(&app, &format!("Tender {}", i), "Published").await;
    }

    let fetch = |limit: &'static str, offset: &'static str| {
        client
            .get("/api/tenders")
            .add_query_param("limit", limit)
            .add_query_param("offset", offset)
            .add_header("Authorization", app.auth())
    };

    let rows: Vec<Value> = fetch("100", "0").await.json();
    assert_eq!(rows.len(), 5);

    let rows: Vec<Value> = fetch("-5", "0").await.json();
    assert_eq!(rows.len(), 5);

    let rows: Vec<Value> = fetch("50", "-1").await.json();
    assert_eq!(rows.len(), 7);
    assert_eq!(rows[0]["name"], "Tender 0");

    let rows: Vec<Value> = fetch("2", "6").await.json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Tender 6");
}

#[tokio::test]
async fn test_list_filters_by_service_type() {
    let app = setup_test_app().await;
    let client = app.client();
    create_tender(&app, "Build", "Published").await;

    let response = client
        .post("/api/tenders/new")
        .add_header("Authorization", app.auth())
        .json(&json!({
            "name": "Ship",
            "description": "Move crates",
            "serviceType": "Delivery",
            "status": "Published",
            "organizationId": app.acme,
            "creatorUsername": "alice",
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let rows: Vec<Value> = client
        .get("/api/tenders")
        .add_query_param("service_type", "Delivery")
        .add_header("Authorization", app.auth())
        .await
        .json();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "Ship");

    let rows: Vec<Value> = client
        .get("/api/tenders")
        .add_query_param("service_type", "Delivery")
        .add_query_param("service_type", "Construction")
        .add_header("Authorization", app.auth())
        .await
        .json();
    assert_eq!(rows.len(), 2);

    let response = client
        .get("/api/tenders")
        .add_query_param("service_type", "Catering")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_identity_and_input_errors() {
    let app = setup_test_app().await;
    let client = app.client();
    let id = id_of(&create_tender(&app, "A", "Created").await);

    let response = client
        .get("/api/tenders/my")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 401);

    let response = client
        .get("/api/tenders/my")
        .add_query_param("username", "mallory")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 401);

    let response = client
        .get("/api/tenders/not-a-uuid/status")
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 404);

    let response = client
        .patch(&format!("/api/tenders/{}/edit", id))
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .json(&json!({ "status": "Closed" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .patch(&format!("/api/tenders/{}/edit", id))
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = client
        .post("/api/tenders/new")
        .add_header("Authorization", app.auth())
        .json(&json!({
            "name": "",
            "description": "",
            "serviceType": "Construction",
            "organizationId": app.acme,
            "creatorUsername": "alice",
        }))
        .await;
    assert_eq!(response.status_code(), 400);

    let mine: Vec<Value> = client
        .get("/api/tenders/my")
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .await
        .json();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["version"], 1);
}

#[tokio::test]
async fn test_edit_checks_caller_before_body() {
    let app = setup_test_app().await;
    let client = app.client();
    let id = id_of(&create_tender(&app, "A", "Created").await);
    let missing = uuid::Uuid::nil();

    let response = client
        .patch(&format!("/api/tenders/{}/edit", id))
        .add_query_param("username", "bob")
        .add_header("Authorization", app.auth())
        .json(&json!({ "status": "Closed" }))
        .await;
    assert_eq!(response.status_code(), 403);

    let response = client
        .patch(&format!("/api/tenders/{}/edit", missing))
        .add_query_param("username", "ghost")
        .add_header("Authorization", app.auth())
        .json(&json!({ "name": 5 }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = client
        .patch(&format!("/api/tenders/{}/edit", missing))
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .json(&json!({ "foo": 1 }))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = client
        .patch(&format!("/api/tenders/{}/edit", id))
        .add_query_param("username", "alice")
        .add_header("Authorization", app.auth())
        .json(&json!({ "name": 5 }))
        .await;
    assert_eq!(response.status_code(), 400);
    let data: Value = response.json();
    assert!(data["reason"].is_string());
}

#[tokio::test]
async fn test_bad_query_string_answers_with_reason() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/tenders/my")
        .add_query_param("username", "alice")
        .add_query_param("username", "bob")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 400);
    let data: Value = response.json();
    assert!(data["reason"].is_string());
}

#[tokio::test]
async fn test_username_is_matched_exactly() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/tenders/my")
        .add_query_param("username", " alice ")
        .add_header("Authorization", app.auth())
        .await;
    assert_eq!(response.status_code(), 401);
}
