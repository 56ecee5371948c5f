use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest},
    entity::{
        sea_orm_active_enums::UserRole,
        users::{ActiveModel, Column, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, issue_token},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn password_matches(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Public sign-up always creates customers; only an employee may register
/// another employee.
pub fn resolve_role(caller: Option<&AuthUser>, requested: Option<UserRole>) -> AppResult<UserRole> {
    match requested.unwrap_or(UserRole::Customer) {
        UserRole::Customer => Ok(UserRole::Customer),
        UserRole::Employee if caller.is_some_and(AuthUser::is_employee) => Ok(UserRole::Employee),
        UserRole::Employee => Err(AppError::Forbidden),
    }
}

pub async fn register_user(
    state: &AppState,
    caller: Option<&AuthUser>,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let role = resolve_role(caller, payload.role)?;
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    if Users::find()
        .filter(Column::Username.eq(username.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(format!(
            "Username {username} is already taken"
        )));
    }
    if Users::find()
        .filter(Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(format!(
            "Email {email} is already taken"
        )));
    }

    let now = Utc::now();
    let user = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(role),
        active: Set(true),
        address: Set(payload.address),
        image_data: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, role = %user.role.as_str(), "user registered");
    Ok(ApiResponse::success("User created", user.into(), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let invalid = || AppError::BadRequest("Invalid username or password".into());

    let user = Users::find()
        .filter(Column::Username.eq(payload.username.trim()))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    if !password_matches(&payload.password, &user.password_hash)? {
        return Err(invalid());
    }
    if !user.active {
        tracing::warn!(user_id = %user.id, "login attempt on deactivated account");
        return Err(AppError::Forbidden);
    }

    let token = issue_token(&state.auth, user.id, user.role)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            role: user.role,
            user_id: user.id,
        },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_passwords_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(password_matches("correct horse", &hash).unwrap());
        assert!(!password_matches("wrong horse", &hash).unwrap());
    }

    #[test]
    fn only_employees_register_employees() {
        let customer = AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Customer,
        };
        let employee = AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Employee,
        };

        assert_eq!(resolve_role(None, None).unwrap(), UserRole::Customer);
        assert_eq!(
            resolve_role(None, Some(UserRole::Customer)).unwrap(),
            UserRole::Customer
        );
        assert!(matches!(
            resolve_role(None, Some(UserRole::Employee)),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            resolve_role(Some(&customer), Some(UserRole::Employee)),
            Err(AppError::Forbidden)
        ));
        assert_eq!(
            resolve_role(Some(&employee), Some(UserRole::Employee)).unwrap(),
            UserRole::Employee
        );
    }

    #[test]
    fn malformed_hashes_are_internal_errors() {
        assert!(matches!(
            password_matches("x", "not-a-hash"),
            Err(AppError::Internal(_))
        ));
    }
}
