use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        users::UpdateUserRequest,
    },
    error::{AppResult, ErrorBody},
    extract::{ApiJson, ApiPath},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::{auth_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(register))
        .route("/login", post(login))
        .route(
            "/{id}",
            get(get_user).put(update_user).patch(deactivate_user),
        )
        .route("/{id}/photo", get(get_photo).patch(set_photo))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/sign-up",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<User>),
        (status = 400, description = "Invalid registration", body = ErrorBody),
        (status = 403, description = "Only employees may register employees", body = ErrorBody),
        (status = 409, description = "Username or email taken", body = ErrorBody),
    ),
    security(()),
    tag = "Users"
)]
pub async fn register(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let resp = auth_service::register_user(&state, caller.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials", body = ErrorBody),
        (status = 403, description = "Account deactivated", body = ErrorBody),
    ),
    security(()),
    tag = "Users"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = ApiResponse<User>),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    tag = "Users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_user(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<User>),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 409, description = "Username or email taken", body = ErrorBody),
    ),
    tag = "Users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_user(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated", body = ApiResponse<User>),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    tag = "Users"
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::deactivate_user(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}/photo",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Photo stored", body = ApiResponse<User>),
        (status = 400, description = "Empty photo", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    ),
    tag = "Users"
)]
pub async fn set_photo(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::set_photo(&state, &user, id, body.to_vec()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/photo",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Raw image bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "User or photo not found", body = ErrorBody),
    ),
    tag = "Users"
)]
pub async fn get_photo(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let bytes = user_service::get_photo(&state, &user, id).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}
