use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod properties;
pub mod state;
pub mod users;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(properties::routes(state.clone()))
        .merge(bookings::routes(state.clone()))
        .merge(users::routes(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    // Peer address is only present when served with connect-info; without
    // one there is nothing to key on and the request passes through.
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string());

    if let Some(ip) = ip {
        let key = format!("ratelimit:{}", ip);
        match state
            .redis
            .check_rate_limit(&key, state.business_rules.rate_limit_per_minute, 60)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response()
            }
            Err(_) => {} // Fail open
        }
    }

    next.run(req).await
}
