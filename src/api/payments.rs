//! Payment endpoints
//!
//! Request bodies and path identifiers are validated here; the lifecycle
//! service only ever receives well-formed input.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::HeaderMap,
    response::Response,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{AppError, AppResult, ValidationError};
use crate::middleware::auth::AuthenticatedMerchant;
use crate::middleware::error::{
    created_response, success_response, success_response_with_message, with_request_id,
};
use crate::payments::types::{CreatePaymentRequest, Pagination, PaymentMethod};

/// Wire shape of `POST /api/v1/payments`.
///
/// Every field is optional here so a missing one is reported by name
/// instead of as a generic decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePaymentBody {
    pub merchant_id: Option<String>,
    pub customer_id: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub method: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
}

impl CreatePaymentBody {
    pub fn validate(self) -> Result<CreatePaymentRequest, ValidationError> {
        let merchant_id = parse_uuid(required("merchant_id", self.merchant_id)?, "merchant ID")?;
        let customer_id = parse_uuid(required("customer_id", self.customer_id)?, "customer ID")?;

        let amount = self.amount.ok_or_else(|| missing("amount"))?;
        if amount <= 0 {
            return Err(ValidationError::InvalidAmount {
                amount,
                reason: "must be greater than zero".to_string(),
            });
        }

        let currency = required("currency", self.currency)?;
        let currency = currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ValidationError::InvalidCurrency {
                currency: currency.to_string(),
                reason: "must be a 3-letter currency code".to_string(),
            });
        }

        let method = required("method", self.method)?;
        let method: PaymentMethod = method
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidMethod { method })?;

        let reference = self
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        Ok(CreatePaymentRequest {
            merchant_id,
            customer_id,
            amount,
            currency: currency.to_ascii_uppercase(),
            method,
            description: self.description.unwrap_or_default(),
            reference,
        })
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| missing(field))
}

pub fn parse_uuid(value: String, field: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value.trim()).map_err(|_| ValidationError::InvalidIdentifier {
        field: field.to_string(),
        value,
    })
}

/// Raw `limit`/`offset` query values; anything unparseable falls back to the defaults
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::sanitize(
            self.limit.as_deref().and_then(|v| v.trim().parse().ok()),
            self.offset.as_deref().and_then(|v| v.trim().parse().ok()),
        )
    }
}

fn path_id(raw: String, field: &str, headers: &HeaderMap) -> AppResult<Uuid> {
    parse_uuid(raw, field).map_err(|e| with_request_id(AppError::validation(e), headers))
}

pub async fn create_payment(
    State(state): State<AppState>,
    Extension(AuthenticatedMerchant(merchant)): Extension<AuthenticatedMerchant>,
    headers: HeaderMap,
    payload: Result<Json<CreatePaymentBody>, JsonRejection>,
) -> AppResult<Response> {
    let Json(body) = payload.map_err(|rejection| {
        with_request_id(
            AppError::validation(ValidationError::InvalidBody {
                message: rejection.body_text(),
            }),
            &headers,
        )
    })?;

    let request = body
        .validate()
        .map_err(|e| with_request_id(AppError::validation(e), &headers))?;

    info!(
        authenticated_merchant = %merchant.id,
        merchant_id = %request.merchant_id,
        "Create payment requested"
    );

    let payment = state
        .payment_service
        .create_payment(request)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(created_response(payment, "Payment created successfully"))
}

pub async fn get_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = path_id(id, "payment ID", &headers)?;
    let payment = state
        .payment_service
        .get_payment(id)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(success_response(payment))
}

pub async fn get_payment_by_reference(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(reference): Path<String>,
) -> AppResult<Response> {
    let payment = state
        .payment_service
        .get_payment_by_reference(&reference)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(success_response(payment))
}

pub async fn process_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = path_id(id, "payment ID", &headers)?;
    let payment = state
        .payment_service
        .process_payment(id)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(success_response_with_message(
        payment,
        "Payment processed successfully",
    ))
}

pub async fn cancel_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = path_id(id, "payment ID", &headers)?;
    let payment = state
        .payment_service
        .cancel_payment(id)
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(success_response_with_message(
        payment,
        "Payment cancelled successfully",
    ))
}

pub async fn get_merchant_payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(merchant_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let merchant_id = path_id(merchant_id, "merchant ID", &headers)?;
    let payments = state
        .payment_service
        .get_merchant_payments(merchant_id, query.pagination())
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(success_response(payments))
}

pub async fn get_customer_payments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(customer_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let customer_id = path_id(customer_id, "customer ID", &headers)?;
    let payments = state
        .payment_service
        .get_customer_payments(customer_id, query.pagination())
        .await
        .map_err(|e| with_request_id(e, &headers))?;

    Ok(success_response(payments))
}
