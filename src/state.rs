use std::sync::Arc;

use crate::{config::AppConfig, db::OrmConn, geo::DistanceEstimator};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub estimator: Arc<dyn DistanceEstimator>,
    pub auth: AuthSettings,
}

#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AppState {
    pub fn new(orm: OrmConn, estimator: Arc<dyn DistanceEstimator>, config: &AppConfig) -> Self {
        Self {
            orm,
            estimator,
            auth: AuthSettings {
                jwt_secret: config.jwt_secret.clone(),
                token_ttl_hours: config.jwt_ttl_hours,
            },
        }
    }
}
