use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::sea_orm_active_enums::UserRole,
    error::AppError,
    state::{AppState, AuthSettings},
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_employee(&self) -> bool {
        self.role == UserRole::Employee
    }
}

pub fn ensure_role(user: &AuthUser, role: UserRole) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_employee(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, UserRole::Employee)
}

/// Users may act on their own account; employees on any account.
pub fn ensure_self_or_employee(user: &AuthUser, target: Uuid) -> Result<(), AppError> {
    if user.user_id == target || user.is_employee() {
        return Ok(());
    }
    Err(AppError::Forbidden)
}

pub fn issue_token(
    settings: &AuthSettings,
    user_id: Uuid,
    role: UserRole,
) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    let role = match decoded.claims.role.as_str() {
        "CUSTOMER" => UserRole::Customer,
        "EMPLOYEE" => UserRole::Employee,
        _ => return Err(AppError::Unauthorized("Invalid role in token".into())),
    };

    Ok(AuthUser { user_id, role })
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
        .trim();
    Ok(Some(token))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;
        verify_token(&state.auth, token)
    }
}

/// Anonymous callers yield `None`; a present but invalid token is still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        bearer_token(parts)?
            .map(|token| verify_token(&state.auth, token))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
        }
    }

    #[test]
    fn issued_tokens_verify_to_the_same_user() {
        let user_id = Uuid::new_v4();
        let token = issue_token(&settings(), user_id, UserRole::Employee).unwrap();
        let user = verify_token(&settings(), &token).unwrap();
        assert_eq!(user.user_id, user_id);
        assert!(user.is_employee());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = issue_token(&settings(), Uuid::new_v4(), UserRole::Customer).unwrap();
        let other = AuthSettings {
            jwt_secret: "other".into(),
            token_ttl_hours: 1,
        };
        assert!(matches!(
            verify_token(&other, &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn customers_only_reach_their_own_account() {
        let me = AuthUser {
            user_id: Uuid::new_v4(),
            role: UserRole::Customer,
        };
        assert!(ensure_self_or_employee(&me, me.user_id).is_ok());
        assert!(matches!(
            ensure_self_or_employee(&me, Uuid::new_v4()),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(ensure_employee(&me), Err(AppError::Forbidden)));
    }
}
