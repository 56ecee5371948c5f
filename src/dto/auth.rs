use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::validation::{Violations, char_len, is_blank, looks_like_email},
    entity::sea_orm_active_enums::UserRole,
    error::AppResult,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<UserRole>,
    pub address: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        v.check(!is_blank(&self.username), "username", "Username is required");
        v.check(
            (3..=100).contains(&char_len(self.username.trim())),
            "username",
            "Username must be between 3 and 100 characters",
        );
        v.check(
            looks_like_email(&self.email) && char_len(&self.email) <= 100,
            "email",
            "Please provide a valid email address",
        );
        v.check(
            (8..=64).contains(&char_len(&self.password)),
            "password",
            "Password must be between 8 and 64 characters long",
        );
        v.into_result()
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub role: UserRole,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}
