//! PgStore against a live PostgreSQL. Skipped unless DATABASE_URL is set; every test works in its
//! own throwaway schema.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{app, send};
use entity_gateway::{build_catalog, CollectionDecl, PgStore, PropertyDecl, StoreDecl, StoreRegistry, StoreTechnology};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

struct Fixture {
    pool: PgPool,
    schema: String,
    app: Router,
}

impl Fixture {
    async fn teardown(self) {
        sqlx::raw_sql(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

async fn fixture() -> Option<Fixture> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPool::connect(&url).await.unwrap();
    let schema = format!("eg_{}", uuid::Uuid::new_v4().simple());
    let ddl = format!(
        r#"
        CREATE SCHEMA {s};
        CREATE TABLE {s}.audit_events (
            event_key uuid PRIMARY KEY,
            kind text NOT NULL,
            at timestamptz NOT NULL,
            payload jsonb
        );
        CREATE TABLE {s}.tickets (id serial PRIMARY KEY, status text NOT NULL, note text);
        CREATE TABLE {s}.customers (id serial PRIMARY KEY, email text NOT NULL UNIQUE);
        "#,
        s = schema
    );
    sqlx::raw_sql(&ddl).execute(&pool).await.unwrap();

    let catalog = build_catalog(&[StoreDecl::new("main")
        .collection(
            CollectionDecl::new("AuditEvents", "AuditEvent")
                .table("audit_events")
                .property(PropertyDecl::new("EventKey", "Guid").column("event_key").key())
                .property(PropertyDecl::new("Kind", "string").column("kind"))
                .property(PropertyDecl::new("At", "DateTime").column("at"))
                .property(PropertyDecl::new("Payload", "JsonDocument?").column("payload")),
        )
        .collection(
            CollectionDecl::new("Tickets", "Ticket")
                .table("tickets")
                .property(PropertyDecl::new("Id", "int").column("id"))
                .property(PropertyDecl::new("Status", "TicketStatus").column("status"))
                .property(PropertyDecl::new("Note", "string?").column("note")),
        )
        .collection(
            CollectionDecl::new("Customers", "Customer")
                .table("customers")
                .property(PropertyDecl::new("Id", "int").column("id"))
                .property(PropertyDecl::new("Email", "string").column("email")),
        )])
    .unwrap();
    let stores = StoreRegistry::new()
        .with("main", Arc::new(PgStore::new("main", pool.clone(), schema.clone())))
        .unwrap();
    let app = app(catalog, stores, StoreTechnology::PostgreSql);
    Some(Fixture { pool, schema, app })
}

#[tokio::test]
async fn omitted_json_column_is_stored_as_null() {
    let Some(fx) = fixture().await else { return };

    let (status, created) = send(
        &fx.app,
        Method::POST,
        "/AuditEvent/api",
        Some(json!({"kind": "login", "at": "2024-01-01T10:00:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", created);
    assert_eq!(created["payload"], json!(null));
    assert_eq!(created["at"], "2024-01-01T10:00:00Z");
    let key = created["eventKey"].as_str().unwrap().to_string();

    let (status, fetched) = send(&fx.app, Method::GET, &format!("/AuditEvent/api/{}", key), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, with_payload) = send(
        &fx.app,
        Method::POST,
        "/AuditEvent/api",
        Some(json!({"kind": "login", "at": "2024-01-01T10:00:00Z", "payload": {"a": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(with_payload["payload"], json!({"a": 1}));

    let uri = format!("/AuditEvent/api/{}", with_payload["eventKey"].as_str().unwrap());
    let (status, replaced) = send(&fx.app, Method::PUT, &uri, Some(json!({"kind": "logout", "at": "2024-01-02T00:00:00Z"}))).await;
    assert_eq!(status, StatusCode::OK, "{}", replaced);
    assert_eq!(replaced["payload"], json!(null));

    fx.teardown().await;
}

#[tokio::test]
async fn unmapped_type_on_text_column_round_trips() {
    let Some(fx) = fixture().await else { return };

    let (status, created) = send(&fx.app, Method::POST, "/Ticket/api", Some(json!({"status": "Open"}))).await;
    assert_eq!(status, StatusCode::OK, "{}", created);
    assert_eq!(created, json!({"id": 1, "status": "Open", "note": null}));

    let (_, fetched) = send(&fx.app, Method::GET, "/Ticket/api/1", None).await;
    assert_eq!(fetched["status"], "Open");

    let sql = format!("SELECT status FROM {}.tickets", fx.schema);
    let (_, raw) = send(&fx.app, Method::POST, "/api/sql/execute", Some(json!({"sql": sql}))).await;
    assert_eq!(raw["rows"], json!([["Open"]]));

    fx.teardown().await;
}

#[tokio::test]
async fn unique_violation_is_conflict() {
    let Some(fx) = fixture().await else { return };

    let body = json!({"email": "ada@example.com"});
    let (status, _) = send(&fx.app, Method::POST, "/Customer/api", Some(body.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, err) = send(&fx.app, Method::POST, "/Customer/api", Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"]["code"], "conflict");

    fx.teardown().await;
}

#[tokio::test]
async fn sql_console_reports_driver_diagnostics() {
    let Some(fx) = fixture().await else { return };

    let sql = format!("SELECT * FROM {}.nope", fx.schema);
    let (status, err) = send(&fx.app, Method::POST, "/api/sql/execute", Some(json!({"sql": sql}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(err["error"]["code"], "execution_failure");
    assert_eq!(err["error"]["details"]["sqlState"], "42P01");
    assert!(err["error"]["details"]["position"].is_number());

    send(&fx.app, Method::POST, "/Ticket/api", Some(json!({"status": "Open"}))).await;
    send(&fx.app, Method::POST, "/Ticket/api", Some(json!({"status": "Closed"}))).await;
    let sql = format!("UPDATE {}.tickets SET note = 'seen'", fx.schema);
    let (status, result) = send(&fx.app, Method::POST, "/api/sql/execute", Some(json!({"sql": sql}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["rowsAffected"], 2);

    let sql = format!("SELECT id, note FROM {}.tickets WHERE false", fx.schema);
    let (_, empty) = send(&fx.app, Method::POST, "/api/sql/execute", Some(json!({"sql": sql}))).await;
    assert_eq!(empty["columns"], json!(["id", "note"]));
    assert_eq!(empty["rowCount"], 0);

    fx.teardown().await;
}
