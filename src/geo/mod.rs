//! Delivery distance estimation.
//!
//! The order service only sees [`DistanceEstimator`]; the concrete provider
//! lives in [`openroute`].

pub mod openroute;

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

pub use openroute::{OpenRouteConfig, OpenRouteService};

/// Driving distance and travel time between two addresses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub eta_minutes: f64,
}

impl RouteEstimate {
    pub fn zero() -> Self {
        Self {
            distance_km: 0.0,
            eta_minutes: 0.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("invalid provider request: {0}")]
    InvalidRequest(String),
    #[error("provider client error: {0}")]
    Client(#[from] reqwest::Error),
}

#[async_trait]
pub trait DistanceEstimator: Send + Sync {
    /// Estimate the route between two free-form addresses.
    ///
    /// Implementations degrade to [`RouteEstimate::zero`] when the provider
    /// has no answer; an `Err` means the request could not be made at all.
    async fn estimate(&self, from: &str, to: &str) -> Result<RouteEstimate, EstimateError>;
}

/// Estimator that never leaves the process. Used when no provider key is
/// configured and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedEstimator(pub Option<RouteEstimate>);

#[async_trait]
impl DistanceEstimator for FixedEstimator {
    async fn estimate(&self, _from: &str, _to: &str) -> Result<RouteEstimate, EstimateError> {
        Ok(self.0.unwrap_or_else(RouteEstimate::zero))
    }
}
