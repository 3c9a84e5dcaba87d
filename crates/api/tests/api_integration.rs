//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use event_store::InMemoryEventStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let store = InMemoryEventStore::new();
    let (state, _processor) = api::create_default_state(store);
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn seed_berlin_network(app: &Router) {
    let (status, _) = send(
        app,
        post(
            "/admin/warehouses",
            serde_json::json!({
                "id": "WH-BER",
                "location": {"lat": 52.52, "lon": 13.405},
                "city_codename": "BER",
                "range_km": 50.0
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    for (id, kind) in [("V-P1", "PICKUP"), ("V-D1", "DELIVERY")] {
        let (status, _) = send(
            app,
            post(
                "/admin/vehicles",
                serde_json::json!({
                    "id": id,
                    "warehouse_id": "WH-BER",
                    "kind": kind
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

#[tokio::test]
async fn health_check() {
    let app = setup();

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn register_parcel_within_range() {
    let app = setup();
    seed_berlin_network(&app).await;

    let (status, json) = send(
        &app,
        post(
            "/parcels",
            serde_json::json!({
                "pickup_date": "2024-03-11",
                "pickup_location": {"lat": 52.50, "lon": 13.39},
                "delivery_date": "2024-03-13",
                "delivery_location": {"lat": 52.56, "lon": 13.45}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["transit_warehouses"], serde_json::json!(["WH-BER"]));

    let parcel_id = json["parcel_id"].as_str().unwrap().to_string();
    let (status, json) = send(&app, get(&format!("/parcels/{parcel_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "TO_PICKUP");
}

#[tokio::test]
async fn register_parcel_out_of_range_is_not_found() {
    let app = setup();
    seed_berlin_network(&app).await;

    // Hamburg pickup: no warehouse covers it.
    let (status, _) = send(
        &app,
        post(
            "/parcels",
            serde_json::json!({
                "pickup_date": "2024-03-11",
                "pickup_location": {"lat": 53.55, "lon": 9.99},
                "delivery_date": "2024-03-13",
                "delivery_location": {"lat": 52.56, "lon": 13.45}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_parcel_is_not_found() {
    let app = setup();

    let (status, _) = send(
        &app,
        get(&format!("/parcels/{}", uuid::Uuid::new_v4())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accept_offer_creates_a_parcel() {
    let app = setup();
    seed_berlin_network(&app).await;

    let (status, json) = send(
        &app,
        post(
            "/offers",
            serde_json::json!({
                "price_cents": 1499,
                "pickup_date": "2024-03-11",
                "delivery_date": "2024-03-13",
                "pickup_city": "BER",
                "delivery_city": "BER"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let offer_id = json["offer_id"].as_str().unwrap().to_string();

    let (status, json) = send(
        &app,
        post(
            &format!("/offers/{offer_id}/accept"),
            serde_json::json!({
                "pickup_location": {"lat": 52.50, "lon": 13.39},
                "delivery_location": {"lat": 52.56, "lon": 13.45}
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let parcel_id = json["parcel_id"].as_str().unwrap().to_string();
    let (status, json) = send(&app, get(&format!("/parcels/{parcel_id}/events"))).await;
    assert_eq!(status, StatusCode::OK);
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event_type"], "ParcelRegistered");
}

#[tokio::test]
async fn accept_unknown_offer_is_not_found() {
    let app = setup();
    seed_berlin_network(&app).await;

    let (status, _) = send(
        &app,
        post(
            &format!("/offers/{}/accept", uuid::Uuid::new_v4()),
            serde_json::json!({
                "pickup_location": {"lat": 52.50, "lon": 13.39},
                "delivery_location": {"lat": 52.56, "lon": 13.45}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_flow_drives_a_parcel_into_the_warehouse() {
    let app = setup();
    seed_berlin_network(&app).await;

    let (_, json) = send(
        &app,
        post(
            "/parcels",
            serde_json::json!({
                "pickup_date": "2024-03-11",
                "pickup_location": {"lat": 52.53, "lon": 13.41},
                "delivery_date": "2024-03-13",
                "delivery_location": {"lat": 52.56, "lon": 13.45}
            }),
        ),
    )
    .await;
    let parcel_id = json["parcel_id"].as_str().unwrap().to_string();

    // Batch the pickup route.
    let (status, json) = send(
        &app,
        post(
            "/admin/jobs/prepare",
            serde_json::json!({
                "warehouse_id": "WH-BER",
                "date": "2024-03-11"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["pickup_jobs"], 1);

    // Drive it with three widely spaced sweeps: start, pick up, return.
    for at in [
        "2024-03-11T08:00:00Z",
        "2024-03-11T09:00:00Z",
        "2024-03-11T10:00:00Z",
    ] {
        let (status, _) = send(
            &app,
            post("/admin/jobs/advance", serde_json::json!({ "at": at })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, json) = send(&app, get(&format!("/parcels/{parcel_id}"))).await;
    assert_eq!(json["status"], "IN_WAREHOUSE");
    assert_eq!(json["current_warehouse"], "WH-BER");

    // The pickup vehicle's position was tracked along the way.
    let (status, json) = send(&app, get("/vehicles/V-P1/location")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["lat"].as_f64().is_some());
}

#[tokio::test]
async fn vehicle_without_track_is_not_found() {
    let app = setup();

    let (status, _) = send(&app, get("/vehicles/V-GHOST/location")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_endpoint_renders() {
    let app = setup();

    let response = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_vehicles_restores_capacity() {
    let app = setup();
    seed_berlin_network(&app).await;

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/admin/vehicles/reset")
            .header("content-type", "application/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}
