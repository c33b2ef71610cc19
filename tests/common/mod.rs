#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use entity_gateway::{build_catalog, AppState, Catalog, CollectionDecl, PropertyDecl, StoreDecl, StoreRegistry, StoreTechnology};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

pub const BODY_LIMIT: usize = 64 * 1024;

pub fn shop_catalog() -> Catalog {
    build_catalog(&[StoreDecl::new("shop")
        .collection(
            CollectionDecl::new("Products", "Product")
                .table("products")
                .property(PropertyDecl::new("Id", "int"))
                .property(PropertyDecl::new("SKU", "string"))
                .property(PropertyDecl::new("Price", "decimal"))
                .property(PropertyDecl::new("CreatedAt", "DateTime"))
                .property(PropertyDecl::new("Discontinued", "DateTime?"))
                .property(PropertyDecl::new("Reviews", "ICollection<Review>")),
        )
        .collection(
            CollectionDecl::new("Reviews", "Review")
                .table("reviews")
                .property(PropertyDecl::new("ReviewId", "long"))
                .property(PropertyDecl::new("ProductId", "int"))
                .property(PropertyDecl::new("Stars", "short")),
        )])
    .unwrap()
}

pub fn app(catalog: Catalog, stores: StoreRegistry, default_technology: StoreTechnology) -> Router {
    entity_gateway::gateway_routes(AppState::new(catalog, stores, default_technology), BODY_LIMIT)
}

/// Send one request through the router and decode the JSON body (Null when empty).
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
