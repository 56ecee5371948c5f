use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        AddProductRequest, CreateOrderRequest, NewCountQuery, OrderItemList, OrderList,
        OrderWithItems, ProcessOrderRequest, ProcessOrderResponse, UpdateOrderRequest,
    },
    error::{AppResult, ErrorBody},
    extract::{ApiJson, ApiPath, ApiQuery},
    middleware::auth::AuthUser,
    models::OrderItem,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route(
            "/{id}",
            get(get_order)
                .put(update_order)
                .patch(process_order)
                .delete(delete_order),
        )
        .route("/{id}/products", get(list_items).post(add_product))
        .route(
            "/{id}/products/{product_id}",
            patch(set_quantity).delete(remove_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "List orders", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status filter", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid order", body = ErrorBody),
        (status = 404, description = "User or product not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithItems>>)> {
    let resp = order_service::create_order(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid status or address", body = ErrorBody),
        (status = 403, description = "Employees only", body = ErrorBody),
        (status = 404, description = "Order not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::update_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = ProcessOrderRequest,
    responses(
        (status = 200, description = "Order is processing", body = ApiResponse<ProcessOrderResponse>),
        (status = 400, description = "Order is not NEW", body = ErrorBody),
        (status = 404, description = "Order or employee not found", body = ErrorBody),
        (status = 500, description = "Route could not be estimated", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn process_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ProcessOrderRequest>,
) -> AppResult<Json<ApiResponse<ProcessOrderResponse>>> {
    let resp = order_service::process_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    order_service::delete_order(&state, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/products",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Line items", body = ApiResponse<OrderItemList>),
        (status = 404, description = "Order not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<OrderItemList>>> {
    let resp = order_service::list_items(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/products",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AddProductRequest,
    responses(
        (status = 200, description = "Product added or merged", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Invalid quantity", body = ErrorBody),
        (status = 404, description = "Order or product not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn add_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddProductRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::add_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}/products/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
    ),
    responses(
        (status = 204, description = "Line item removed"),
        (status = 404, description = "Order, product or line item not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn remove_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, product_id)): ApiPath<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    order_service::remove_product(&state, &user, id, product_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/products/{product_id}",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("product_id" = Uuid, Path, description = "Product ID"),
        NewCountQuery,
    ),
    responses(
        (status = 200, description = "Quantity replaced", body = ApiResponse<OrderItem>),
        (status = 400, description = "Quantity must be positive", body = ErrorBody),
        (status = 404, description = "Line item not found", body = ErrorBody),
    ),
    tag = "Orders"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((id, product_id)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(query): ApiQuery<NewCountQuery>,
) -> AppResult<Json<ApiResponse<OrderItem>>> {
    let resp = order_service::set_quantity(&state, &user, id, product_id, query.new_count).await?;
    Ok(Json(resp))
}
