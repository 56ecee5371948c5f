use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{
    domain::{catalog::CatalogError, line_items::QuantityError},
    geo::EstimateError,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error(transparent)]
    InvalidQuantity(#[from] QuantityError),

    #[error("{0}")]
    OrderNotProcessable(String),

    #[error(transparent)]
    InvalidProductUpdate(#[from] CatalogError),

    #[error("{0}")]
    Integrity(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("An error occurred while calculating the distance")]
    FailedCalculation(#[source] EstimateError),

    #[error("ORM error")]
    OrmError(DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::AlreadyExists("A record with this unique identifier already exists.".into())
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Integrity(
                "The requested action references data that does not exist or cannot be modified."
                    .into(),
            ),
            _ => AppError::OrmError(err),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::InvalidQuantity(_)
            | AppError::OrderNotProcessable(_)
            | AppError::InvalidProductUpdate(_)
            | AppError::Integrity(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::FailedCalculation(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation Error",
            AppError::InvalidProductUpdate(_) => "Invalid Product Update",
            AppError::Integrity(_) => "Data Integrity Violation",
            AppError::AlreadyExists(_) => "Conflict",
            _ => self
                .status()
                .canonical_reason()
                .unwrap_or("Internal Server Error"),
        }
    }
}

/// Uniform error payload. `path` is filled in by [`crate::middleware::error_path`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,
    pub path: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let error = self.label().to_string();
        let (message, messages) = match self {
            AppError::Validation(messages) => (None, Some(messages)),
            other => (Some(other.to_string()), None),
        };

        let body = ErrorBody {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error,
            message,
            messages,
            path: String::new(),
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

pub type AppResult<T> = Result<T, AppError>;
