use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pizza_order_api::{
    app::build_router,
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    geo::{DistanceEstimator, FixedEstimator, OpenRouteService},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pizza_order_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let estimator: Arc<dyn DistanceEstimator> = if config.openroute.api_key.is_empty() {
        tracing::warn!("ORS_API_KEY is not set, route estimates will be zero");
        Arc::new(FixedEstimator::default())
    } else {
        Arc::new(OpenRouteService::new(config.openroute.clone())?)
    };

    let state = AppState::new(orm, estimator, &config);
    let app = build_router(state, config.body_limit_bytes);

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    tracing::info!("listening on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
