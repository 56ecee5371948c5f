use std::{collections::HashMap, time::Duration};

use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
use pizza_order_api::geo::{
    DistanceEstimator, OpenRouteConfig, OpenRouteService, RouteEstimate,
    openroute::Coordinates,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn config(base_url: String) -> OpenRouteConfig {
    OpenRouteConfig {
        base_url,
        api_key: "test-key".into(),
        directions_path: "/v2/directions/driving-car".into(),
        geocode_path: "/geocode/search".into(),
        timeout: Duration::from_secs(5),
    }
}

async fn geocode(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("api_key").map(String::as_str), Some("test-key"));
    let coordinates = match params.get("text").map(String::as_str) {
        Some("Via Garibaldi 12") => json!([7.6805, 45.0731]),
        Some("Corso Francia 50") => json!([7.6470, 45.0770]),
        _ => return Json(json!({ "features": [] })),
    };
    Json(json!({
        "features": [{ "geometry": { "type": "Point", "coordinates": coordinates } }]
    }))
}

async fn directions(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(
        params.get("start").map(String::as_str),
        Some("7.6805000,45.0731000")
    );
    assert_eq!(
        params.get("end").map(String::as_str),
        Some("7.6470000,45.0770000")
    );
    Json(json!({
        "features": [{
            "properties": { "summary": { "distance": 4250.0, "duration": 630.0 } }
        }]
    }))
}

fn provider() -> Router {
    Router::new()
        .route("/geocode/search", get(geocode))
        .route("/v2/directions/driving-car", get(directions))
}

#[tokio::test]
async fn geocodes_both_addresses_then_reads_the_route_summary() {
    let base = spawn(provider()).await;
    let service = OpenRouteService::new(config(base)).unwrap();

    let estimate = service
        .estimate("Via Garibaldi 12", "Corso Francia 50")
        .await
        .unwrap();

    assert!((estimate.distance_km - 4.25).abs() < 1e-9);
    assert!((estimate.eta_minutes - 10.5).abs() < 1e-9);
}

#[tokio::test]
async fn unknown_address_degrades_to_zero() {
    let base = spawn(provider()).await;
    let service = OpenRouteService::new(config(base)).unwrap();

    let estimate = service
        .estimate("Via Garibaldi 12", "Nowhere 0")
        .await
        .unwrap();
    assert_eq!(estimate, RouteEstimate::zero());
}

#[tokio::test]
async fn provider_errors_degrade_to_zero() {
    let failing = Router::new().route(
        "/geocode/search",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "quota exceeded") }),
    );
    let base = spawn(failing).await;
    let service = OpenRouteService::new(config(base)).unwrap();

    assert_eq!(service.coordinates("Via Garibaldi 12").await.unwrap(), None);
    let estimate = service
        .estimate("Via Garibaldi 12", "Corso Francia 50")
        .await
        .unwrap();
    assert_eq!(estimate, RouteEstimate::zero());
}

#[tokio::test]
async fn empty_directions_degrade_to_zero() {
    let router = Router::new().route(
        "/v2/directions/driving-car",
        get(|| async { Json(json!({ "features": [] })) }),
    );
    let base = spawn(router).await;
    let service = OpenRouteService::new(config(base)).unwrap();

    let estimate = service
        .route(
            Coordinates { lon: 7.0, lat: 45.0 },
            Coordinates { lon: 7.1, lat: 45.1 },
        )
        .await
        .unwrap();
    assert_eq!(estimate, RouteEstimate::zero());
}

#[tokio::test]
async fn blank_addresses_skip_the_provider() {
    // No provider is running; blank input must short-circuit before any request.
    let service = OpenRouteService::new(config("http://127.0.0.1:9".into())).unwrap();
    let estimate = service.estimate("", "Corso Francia 50").await.unwrap();
    assert_eq!(estimate, RouteEstimate::zero());
}

#[tokio::test]
async fn unparseable_base_url_is_an_error() {
    let service = OpenRouteService::new(config("not a url".into())).unwrap();
    assert!(
        service
            .estimate("Via Garibaldi 12", "Corso Francia 50")
            .await
            .is_err()
    );
}
