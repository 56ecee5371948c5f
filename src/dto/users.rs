use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    dto::validation::{Violations, char_len, is_blank, looks_like_email},
    error::AppResult,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        if let Some(username) = &self.username {
            v.check(
                !is_blank(username) && (3..=100).contains(&char_len(username.trim())),
                "username",
                "Username must be between 3 and 100 characters",
            );
        }
        if let Some(email) = &self.email {
            v.check(
                looks_like_email(email) && char_len(email) <= 100,
                "email",
                "Please provide a valid email address",
            );
        }
        if let Some(address) = &self.address {
            v.check(char_len(address) <= 255, "address", "Address is too long");
        }
        v.into_result()
    }
}
