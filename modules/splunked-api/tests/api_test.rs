//! Router-level tests: requests go through the full middleware stack against
//! an in-memory database.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use splunked_api::{build_router, AppState};
use splunked_common::{MappingDraft, MappingObject, MappingSet, MappingType};
use splunked_store::{db, CatalogSource, MappingStore, TrainingStore};

async fn test_state() -> (Arc<AppState>, MappingStore) {
    let pool = db::connect_in_memory().await.unwrap();
    db::migrate(&pool).await.unwrap();
    let mappings = MappingStore::new(pool.clone());
    let state = AppState::new(mappings.clone(), TrainingStore::new(pool));
    (Arc::new(state), mappings)
}

async fn seed(store: &MappingStore, kind: MappingType, id: &str, name: &str, spl: &str) {
    store
        .create(
            kind,
            MappingDraft {
                id: Some(id.into()),
                name: Some(name.into()),
                spl: Some(spl.into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
}

async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// =========================================================================
// Health
// =========================================================================

#[tokio::test]
async fn health_returns_ok_with_no_store_header() {
    let (state, _) = test_state().await;
    let response = build_router(state)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}

// =========================================================================
// SPL generation
// =========================================================================

#[tokio::test]
async fn generate_spl_composes_from_stored_catalog() {
    let (state, store) = test_state().await;
    seed(&store, MappingType::DataSources, "ds_fw", "Firewall", "index=firewall").await;
    seed(&store, MappingType::FieldValues, "fv_fail", "Failed", "status=fail").await;

    let body = json!({ "dataSources": ["ds_fw"], "includes": ["fv_fail"] }).to_string();
    let (status, value) = send(
        build_router(state),
        Method::POST,
        "/api/generate-spl",
        Some(&body),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["spl"], "index=firewall status=fail");
    assert_eq!(value["components"]["baseSearch"], "index=firewall status=fail");
    assert_eq!(value["components"]["outputShape"], "");
    assert!(value["explanation"].as_str().unwrap().contains("Firewall"));
}

#[tokio::test]
async fn generate_spl_with_empty_object_searches_everything() {
    let (state, _) = test_state().await;
    let (status, value) =
        send(build_router(state), Method::POST, "/api/generate-spl", Some("{}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["spl"], "*");
}

#[tokio::test]
async fn generate_spl_accepts_nulls_and_unknown_ids() {
    let (state, _) = test_state().await;
    let body = r#"{"dataSources": null, "includes": ["nope"], "outputShape": null}"#;
    let (status, value) =
        send(build_router(state), Method::POST, "/api/generate-spl", Some(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["spl"], "*");
}

#[tokio::test]
async fn generate_spl_rejects_missing_body() {
    let (state, _) = test_state().await;
    let (status, value) = send(build_router(state), Method::POST, "/api/generate-spl", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].is_string());
}

#[tokio::test]
async fn generate_spl_rejects_malformed_json() {
    let (state, _) = test_state().await;
    let (status, value) = send(
        build_router(state),
        Method::POST,
        "/api/generate-spl",
        Some("{not json"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(value["error"].as_str().unwrap().contains("Invalid JSON body"));
}

struct FixedCatalog(MappingSet);

#[async_trait]
impl CatalogSource for FixedCatalog {
    async fn get_all_mappings(&self) -> anyhow::Result<MappingSet> {
        Ok(self.0.clone())
    }
}

#[tokio::test]
async fn generate_spl_reads_the_configured_catalog_source() {
    let pool = db::connect_in_memory().await.unwrap();
    db::migrate(&pool).await.unwrap();

    let mut set = MappingSet::default();
    set.time_range_presets.push(MappingObject {
        id: "tr_1h".into(),
        kind: "timeRangePreset".into(),
        name: "Last hour".into(),
        friendly_name: "LAST HOUR".into(),
        spl: "earliest=-1h".into(),
        tags: vec![],
        description: String::new(),
        requires_field: None,
        field_placeholder: None,
    });

    let state = Arc::new(AppState {
        catalog: Arc::new(FixedCatalog(set)),
        mappings: MappingStore::new(pool.clone()),
        training: TrainingStore::new(pool),
    });

    let body = json!({ "timeRange": "tr_1h" }).to_string();
    let (status, value) =
        send(build_router(state), Method::POST, "/api/generate-spl", Some(&body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["spl"], "* earliest=-1h");
}

// =========================================================================
// Mappings CRUD
// =========================================================================

#[tokio::test]
async fn create_then_list_mapping() {
    let (state, _) = test_state().await;
    let app = build_router(state);

    let body = json!({ "name": "Proxy", "spl": "index=proxy" }).to_string();
    let (status, created) = send(
        app.clone(),
        Method::POST,
        "/api/mappings/dataSources",
        Some(&body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].as_str().unwrap().starts_with("ds_"));
    assert_eq!(created["friendlyName"], "PROXY");

    let (status, listed) = send(app.clone(), Method::GET, "/api/mappings/dataSource", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, all) = send(app, Method::GET, "/api/mappings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["dataSources"][0]["spl"], "index=proxy");
    assert!(all["patterns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_id_is_a_bad_request() {
    let (state, store) = test_state().await;
    seed(&store, MappingType::Patterns, "pf_x", "X", "x=1").await;

    let body = json!({ "id": "pf_x", "name": "Again" }).to_string();
    let (status, _) = send(
        build_router(state),
        Method::POST,
        "/api/mappings/patterns",
        Some(&body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_mapping_type_is_not_found() {
    let (state, _) = test_state().await;
    let (status, value) = send(build_router(state), Method::GET, "/api/mappings/widgets", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(value["error"].as_str().unwrap().contains("widgets"));
}

#[tokio::test]
async fn update_and_delete_mapping() {
    let (state, store) = test_state().await;
    seed(&store, MappingType::FieldValues, "fv_fail", "Failed", "status=fail").await;
    let app = build_router(state);

    let body = json!({ "spl": "status=failure" }).to_string();
    let (status, updated) = send(
        app.clone(),
        Method::PUT,
        "/api/mappings/fieldValues/fv_fail",
        Some(&body),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["spl"], "status=failure");
    assert_eq!(updated["name"], "Failed");

    let (status, deleted) = send(
        app.clone(),
        Method::DELETE,
        "/api/mappings/fieldValues/fv_fail",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deleted"]["id"], "fv_fail");

    let (status, _) = send(app, Method::DELETE, "/api/mappings/fieldValues/fv_fail", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_missing_mapping_is_not_found() {
    let (state, _) = test_state().await;
    let (status, _) = send(
        build_router(state),
        Method::PUT,
        "/api/mappings/patterns/pf_missing",
        Some(r#"{"name": "x"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =========================================================================
// Training
// =========================================================================

#[tokio::test]
async fn training_endpoints_on_empty_database() {
    let (state, _) = test_state().await;
    let app = build_router(state);

    let (status, index) = send(app.clone(), Method::GET, "/api/training/index", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(index["lessons"], json!({}));
    assert_eq!(index["training"], json!({}));
    assert_eq!(index["pipelines"], json!([]));

    let (status, pipelines) = send(app.clone(), Method::GET, "/api/training/pipelines", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pipelines, json!([]));

    let (status, value) = send(app, Method::GET, "/api/training/item/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(value["error"].is_string());
}
