pub mod health;
pub mod payments;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use tracing::warn;

use crate::config::ServerConfig;
use crate::health::HealthChecker;
use crate::middleware::auth::{require_api_key, AuthState, API_KEY_HEADER};
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::payments::repository::MerchantRepository;
use crate::services::PaymentService;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub payment_service: Arc<PaymentService>,
    pub merchants: Arc<dyn MerchantRepository>,
    pub health_checker: HealthChecker,
}

/// Routes plus request-id and logging layers.
///
/// Everything under `/api/v1` requires a merchant API key; the health
/// probes are public.
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/payments", post(payments::create_payment))
        .route("/payments/{id}", get(payments::get_payment))
        .route("/payments/{id}/process", post(payments::process_payment))
        .route("/payments/{id}/cancel", post(payments::cancel_payment))
        .route(
            "/payments/reference/{reference}",
            get(payments::get_payment_by_reference),
        )
        .route(
            "/merchants/{merchant_id}/payments",
            get(payments::get_merchant_payments),
        )
        .route(
            "/customers/{customer_id}/payments",
            get(payments::get_customer_payments),
        )
        .route_layer(middleware::from_fn_with_state(
            AuthState {
                merchants: state.merchants.clone(),
                storage_timeout: state.payment_service.storage_timeout(),
            },
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

/// CORS and whole-request timeout from the server configuration
pub fn apply_server_layers(router: Router, config: &ServerConfig) -> Router {
    router
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout)))
        .layer(cors_layer(&config.cors_allowed_origins))
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static("x-request-id")]);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
