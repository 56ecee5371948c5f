use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use pizza_order_api::{
    app::build_router,
    entity::sea_orm_active_enums::UserRole,
    geo::FixedEstimator,
    middleware::auth::issue_token,
    state::{AppState, AuthSettings},
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

// These requests fail before any query runs, so no database is needed.
fn state() -> AppState {
    AppState {
        orm: DatabaseConnection::Disconnected,
        estimator: Arc::new(FixedEstimator::default()),
        auth: AuthSettings {
            jwt_secret: "error-body-secret".into(),
            token_ttl_hours: 1,
        },
    }
}

fn bearer(state: &AppState, user_id: Uuid, role: UserRole) -> String {
    format!("Bearer {}", issue_token(&state.auth, user_id, role).unwrap())
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let app = build_router(state(), 1024 * 1024);
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn missing_token_is_unauthorized_with_path() {
    let (status, body) = send(
        Request::get("/api/v1/orders")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["path"], "/api/v1/orders");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn invalid_order_lists_every_violation() {
    let state = state();
    let user_id = Uuid::new_v4();
    let payload = serde_json::json!({ "address": "", "user_id": user_id, "items": [] });

    let (status, body) = send(
        Request::post("/api/v1/orders")
            .header(header::AUTHORIZATION, bearer(&state, user_id, UserRole::Customer))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["path"], "/api/v1/orders");
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(body.get("message").is_none());
}

#[tokio::test]
async fn non_positive_quantity_is_rejected_before_lookup() {
    let state = state();
    let order_id = Uuid::new_v4();
    let product_id = Uuid::new_v4();
    let path = format!("/api/v1/orders/{order_id}/products/{product_id}");

    let (status, body) = send(
        Request::patch(format!("{path}?newCount=0"))
            .header(
                header::AUTHORIZATION,
                bearer(&state, Uuid::new_v4(), UserRole::Employee),
            )
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["path"], path);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("must be positive")
    );
}

#[tokio::test]
async fn customers_cannot_process_orders() {
    let state = state();
    let payload = serde_json::json!({ "employeeId": Uuid::new_v4() });

    let (status, body) = send(
        Request::patch(format!("/api/v1/orders/{}", Uuid::new_v4()))
            .header(
                header::AUTHORIZATION,
                bearer(&state, Uuid::new_v4(), UserRole::Customer),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn unknown_routes_use_the_error_body() {
    let (status, body) = send(Request::get("/nope").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["path"], "/nope");
}

#[tokio::test]
async fn missing_json_field_is_a_bad_request_with_error_body() {
    let state = state();
    let path = format!("/api/v1/orders/{}/products", Uuid::new_v4());
    let payload = serde_json::json!({ "product_id": Uuid::new_v4() });

    let (status, body) = send(
        Request::post(&path)
            .header(
                header::AUTHORIZATION,
                bearer(&state, Uuid::new_v4(), UserRole::Employee),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["path"], path);
    assert!(body["message"].as_str().unwrap().contains("quantity"));
}

#[tokio::test]
async fn malformed_query_value_is_a_bad_request_with_error_body() {
    let state = state();
    let path = format!(
        "/api/v1/orders/{}/products/{}",
        Uuid::new_v4(),
        Uuid::new_v4()
    );

    let (status, body) = send(
        Request::patch(format!("{path}?newCount=abc"))
            .header(
                header::AUTHORIZATION,
                bearer(&state, Uuid::new_v4(), UserRole::Employee),
            )
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["path"], path);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn malformed_path_id_is_a_bad_request_with_error_body() {
    let state = state();

    let (status, body) = send(
        Request::get("/api/v1/orders/not-a-uuid")
            .header(
                header::AUTHORIZATION,
                bearer(&state, Uuid::new_v4(), UserRole::Employee),
            )
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["path"], "/api/v1/orders/not-a-uuid");
}

#[tokio::test]
async fn anonymous_sign_up_cannot_claim_the_employee_role() {
    let payload = serde_json::json!({
        "username": "sneaky",
        "email": "sneaky@pizza.example",
        "password": "letmein123",
        "role": "EMPLOYEE"
    });

    let (status, body) = send(
        Request::post("/api/v1/users/sign-up")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["path"], "/api/v1/users/sign-up");
}
