use std::net::SocketAddr;
use std::sync::Arc;

use staynest_api::{app, state::{AppState, AuthConfig}};
use staynest_store::{DbClient, PgBookingRepository, PgPropertyRepository, PgUserRepository, RedisClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staynest_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = staynest_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Staynest API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let redis_client = RedisClient::new(&config.redis.url)
        .await
        .expect("Failed to create Redis client");

    let app_state = AppState {
        properties: Arc::new(PgPropertyRepository::new(db.pool.clone())),
        bookings: Arc::new(PgBookingRepository::new(db.pool.clone())),
        users: Arc::new(PgUserRepository::new(db.pool.clone())),
        redis: Arc::new(redis_client),
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
        },
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
