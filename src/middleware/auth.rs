//! API-key authentication for merchant routes

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::database::bounded;
use crate::error::{AppError, AuthError};
use crate::middleware::error::with_request_id;
use crate::payments::repository::MerchantRepository;
use crate::payments::types::Merchant;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Merchant lookup used by [`require_api_key`]; the lookup shares the
/// service's storage timeout
#[derive(Clone)]
pub struct AuthState {
    pub merchants: Arc<dyn MerchantRepository>,
    pub storage_timeout: Duration,
}

/// Merchant resolved from the request's API key, stored in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedMerchant(pub Merchant);

/// `X-API-Key` wins; otherwise `Authorization: Bearer <key>`
pub fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty());

    let key = from_header.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|key| !key.is_empty())
    })?;

    Some(key.to_string())
}

pub async fn require_api_key(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let headers = request.headers().clone();

    let api_key = extract_api_key(&headers)
        .ok_or_else(|| with_request_id(AppError::auth(AuthError::MissingApiKey), &headers))?;

    let merchant = bounded(auth.storage_timeout, auth.merchants.get_by_api_key(&api_key))
        .await
        .map_err(|e| with_request_id(AppError::storage("authenticate merchant", e), &headers))?
        .ok_or_else(|| {
            warn!("Rejected request with unknown API key");
            with_request_id(AppError::auth(AuthError::InvalidApiKey), &headers)
        })?;

    if !merchant.is_active {
        warn!(merchant_id = %merchant.id, "Rejected request from inactive merchant");
        return Err(with_request_id(
            AppError::auth(AuthError::MerchantInactive),
            &headers,
        ));
    }

    debug!(merchant_id = %merchant.id, "Merchant authenticated");
    request
        .extensions_mut()
        .insert(AuthenticatedMerchant(merchant));

    Ok(next.run(request).await)
}
