//! Unified error handling for the payment service
//!
//! Business-rule failures, storage faults, boundary validation and
//! authentication problems all travel as [`AppError`], which knows its HTTP
//! status, its machine-readable code and the message safe to show clients.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::error::{DatabaseError, DatabaseErrorKind};
use crate::payments::types::PaymentStatus;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Domain errors (4xx)
    MerchantNotFound,
    MerchantInactive,
    CustomerNotFound,
    PaymentNotFound,
    InvalidStatusTransition,
    DuplicateReference,

    // Infrastructure errors (5xx)
    DatabaseError,
    StorageTimeout,

    // Boundary
    ValidationError,
    Unauthorized,
    Forbidden,
}

/// The lifecycle operation a transition error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionAction {
    Process,
    Cancel,
}

impl TransitionAction {
    pub fn verb(&self) -> &'static str {
        match self {
            TransitionAction::Process => "process",
            TransitionAction::Cancel => "cancel",
        }
    }

    /// Status the action drives a pending payment to
    pub fn target(&self) -> PaymentStatus {
        match self {
            TransitionAction::Process => PaymentStatus::Completed,
            TransitionAction::Cancel => PaymentStatus::Cancelled,
        }
    }
}

/// Business-rule failures raised by the lifecycle service
#[derive(Debug, Clone)]
pub enum DomainError {
    MerchantNotFound { merchant_id: Uuid },
    MerchantInactive { merchant_id: Uuid },
    CustomerNotFound { customer_id: Uuid },
    PaymentNotFound { payment_id: String },
    InvalidStatusTransition {
        payment_id: Uuid,
        current: PaymentStatus,
        action: TransitionAction,
    },
    DuplicateReference { reference: String },
}

/// Storage faults
#[derive(Debug, Clone)]
pub enum InfrastructureError {
    Database {
        operation: String,
        message: String,
        is_retryable: bool,
    },
    StorageTimeout { operation: String, timeout_ms: u64 },
}

/// Malformed input caught before the service is called
#[derive(Debug, Clone)]
pub enum ValidationError {
    MissingField { field: String },
    InvalidAmount { amount: i64, reason: String },
    InvalidCurrency { currency: String, reason: String },
    InvalidMethod { method: String },
    InvalidIdentifier { field: String, value: String },
    InvalidBody { message: String },
}

/// Credential problems raised by the API-key middleware
#[derive(Debug, Clone)]
pub enum AuthError {
    MissingApiKey,
    InvalidApiKey,
    MerchantInactive,
}

#[derive(Debug, Clone)]
pub enum AppErrorKind {
    Domain(DomainError),
    Infrastructure(InfrastructureError),
    Validation(ValidationError),
    Auth(AuthError),
}

/// Unified application error type
#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub request_id: Option<String>,
    pub context: Option<String>,
    pub cause: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    pub fn new(kind: AppErrorKind) -> Self {
        Self {
            kind,
            request_id: None,
            context: None,
            cause: None,
        }
    }

    pub fn domain(err: DomainError) -> Self {
        Self::new(AppErrorKind::Domain(err))
    }

    pub fn validation(err: ValidationError) -> Self {
        Self::new(AppErrorKind::Validation(err))
    }

    pub fn auth(err: AuthError) -> Self {
        Self::new(AppErrorKind::Auth(err))
    }

    /// Wrap a storage failure with the name of the operation that hit it
    pub fn storage(operation: &str, err: DatabaseError) -> Self {
        let infra = match err.kind {
            DatabaseErrorKind::Timeout { timeout_ms } => InfrastructureError::StorageTimeout {
                operation: operation.to_string(),
                timeout_ms,
            },
            _ => InfrastructureError::Database {
                operation: operation.to_string(),
                message: err.to_string(),
                is_retryable: err.is_retryable(),
            },
        };

        Self::new(AppErrorKind::Infrastructure(infra))
            .with_context(format!("failed to {}", operation))
            .with_cause(err)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Map error to HTTP status code
    pub fn status_code(&self) -> u16 {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::MerchantNotFound { .. } => 404,
                DomainError::MerchantInactive { .. } => 422,
                DomainError::CustomerNotFound { .. } => 404,
                DomainError::PaymentNotFound { .. } => 404,
                DomainError::InvalidStatusTransition { .. } => 409,
                DomainError::DuplicateReference { .. } => 409,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => 500,
                InfrastructureError::StorageTimeout { .. } => 504,
            },
            AppErrorKind::Validation(_) => 400,
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingApiKey | AuthError::InvalidApiKey => 401,
                AuthError::MerchantInactive => 403,
            },
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::MerchantNotFound { .. } => ErrorCode::MerchantNotFound,
                DomainError::MerchantInactive { .. } => ErrorCode::MerchantInactive,
                DomainError::CustomerNotFound { .. } => ErrorCode::CustomerNotFound,
                DomainError::PaymentNotFound { .. } => ErrorCode::PaymentNotFound,
                DomainError::InvalidStatusTransition { .. } => ErrorCode::InvalidStatusTransition,
                DomainError::DuplicateReference { .. } => ErrorCode::DuplicateReference,
            },
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => ErrorCode::DatabaseError,
                InfrastructureError::StorageTimeout { .. } => ErrorCode::StorageTimeout,
            },
            AppErrorKind::Validation(_) => ErrorCode::ValidationError,
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingApiKey | AuthError::InvalidApiKey => ErrorCode::Unauthorized,
                AuthError::MerchantInactive => ErrorCode::Forbidden,
            },
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match &self.kind {
            AppErrorKind::Domain(err) => match err {
                DomainError::MerchantNotFound { merchant_id } => {
                    format!("merchant not found: {}", merchant_id)
                }
                DomainError::MerchantInactive { .. } => "merchant is not active".to_string(),
                DomainError::CustomerNotFound { customer_id } => {
                    format!("customer not found: {}", customer_id)
                }
                DomainError::PaymentNotFound { payment_id } => {
                    format!("payment not found: {}", payment_id)
                }
                DomainError::InvalidStatusTransition { current, action, .. } => {
                    format!("payment status is {}, cannot {}", current, action.verb())
                }
                DomainError::DuplicateReference { reference } => {
                    format!("a payment with reference '{}' already exists", reference)
                }
            },
            // Storage internals stay in the logs
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { .. } => {
                    "Service temporarily unavailable. Please try again later".to_string()
                }
                InfrastructureError::StorageTimeout { .. } => {
                    "The request timed out. Please try again".to_string()
                }
            },
            AppErrorKind::Validation(err) => match err {
                ValidationError::MissingField { field } => {
                    format!("Required field '{}' is missing", field)
                }
                ValidationError::InvalidAmount { amount, reason } => {
                    format!("Invalid amount '{}': {}", amount, reason)
                }
                ValidationError::InvalidCurrency { currency, reason } => {
                    format!("Invalid currency '{}': {}", currency, reason)
                }
                ValidationError::InvalidMethod { method } => {
                    format!(
                        "Invalid payment method '{}': expected one of credit_card, bank_transfer, digital_wallet",
                        method
                    )
                }
                ValidationError::InvalidIdentifier { field, .. } => {
                    format!("Invalid {} format", field)
                }
                ValidationError::InvalidBody { message } => {
                    format!("Invalid request body: {}", message)
                }
            },
            AppErrorKind::Auth(err) => match err {
                AuthError::MissingApiKey => "API key is required".to_string(),
                AuthError::InvalidApiKey => "Invalid API key".to_string(),
                AuthError::MerchantInactive => "Merchant account is inactive".to_string(),
            },
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            AppErrorKind::Infrastructure(err) => match err {
                InfrastructureError::Database { is_retryable, .. } => *is_retryable,
                InfrastructureError::StorageTimeout { .. } => true,
            },
            AppErrorKind::Domain(_) | AppErrorKind::Validation(_) | AppErrorKind::Auth(_) => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            AppErrorKind::Domain(
                DomainError::MerchantNotFound { .. }
                    | DomainError::CustomerNotFound { .. }
                    | DomainError::PaymentNotFound { .. }
            )
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{}: {}", context, self.user_message()),
            None => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::storage("access storage", err)
    }
}

/// Result type for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
