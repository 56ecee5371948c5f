use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::users::UpdateUserRequest,
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_self_or_employee},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("User with ID {id} not found"))
}

async fn find(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| not_found(id))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    ensure_self_or_employee(user, id)?;
    let found = find(state, id).await?;
    Ok(ApiResponse::success("User", found.into(), None))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_self_or_employee(user, id)?;
    payload.validate()?;
    let existing = find(state, id).await?;

    let username = payload
        .username
        .map(|u| u.trim().to_string())
        .filter(|u| *u != existing.username);
    let email = payload
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| *e != existing.email);

    if let Some(username) = &username {
        let taken = Users::find()
            .filter(Column::Username.eq(username.as_str()))
            .one(&state.orm)
            .await?
            .is_some();
        if taken {
            return Err(AppError::AlreadyExists(format!(
                "Username {username} is already taken"
            )));
        }
    }
    if let Some(email) = &email {
        let taken = Users::find()
            .filter(Column::Email.eq(email.as_str()))
            .one(&state.orm)
            .await?
            .is_some();
        if taken {
            return Err(AppError::AlreadyExists(format!(
                "Email {email} is already taken"
            )));
        }
    }

    let mut active: ActiveModel = existing.into();
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(user_id = %updated.id, "user updated");
    Ok(ApiResponse::success("Updated", updated.into(), Some(Meta::empty())))
}

/// Deactivated accounts keep their orders but can no longer log in.
pub async fn deactivate_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    ensure_self_or_employee(user, id)?;
    let existing = find(state, id).await?;

    let mut active: ActiveModel = existing.into();
    active.active = Set(false);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    tracing::info!(user_id = %id, by = %user.user_id, "user deactivated");
    Ok(ApiResponse::success("Deactivated", updated.into(), Some(Meta::empty())))
}

pub async fn set_photo(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    bytes: Vec<u8>,
) -> AppResult<ApiResponse<User>> {
    ensure_self_or_employee(user, id)?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Photo must not be empty".into()));
    }
    let existing = find(state, id).await?;

    let mut active: ActiveModel = existing.into();
    active.image_data = Set(Some(bytes));
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Photo updated", updated.into(), Some(Meta::empty())))
}

pub async fn get_photo(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<Vec<u8>> {
    ensure_self_or_employee(user, id)?;
    find(state, id)
        .await?
        .image_data
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::NotFound(format!("User with ID {id} has no photo")))
}
