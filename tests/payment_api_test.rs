//! Integration tests for the /api/v1 payment endpoints against in-memory storage

use axum::{body::Body, Router};
use chrono::Utc;
use http::{header, HeaderMap, Request, StatusCode};
use payment_service::api::{create_router, AppState};
use payment_service::database::memory::{
    InMemoryCustomerRepository, InMemoryMerchantRepository, InMemoryPaymentRepository,
};
use payment_service::health::HealthChecker;
use payment_service::payments::repository::{CustomerRepository, MerchantRepository};
use payment_service::payments::types::{Customer, Merchant};
use payment_service::services::PaymentService;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

const API_KEY: &str = "sk_test_active";
const INACTIVE_API_KEY: &str = "sk_test_inactive";

struct TestApp {
    router: Router,
    merchant_id: Uuid,
    inactive_merchant_id: Uuid,
    customer_id: Uuid,
    payments: Arc<InMemoryPaymentRepository>,
}

fn merchant(api_key: &str, is_active: bool) -> Merchant {
    let now = Utc::now();
    Merchant {
        id: Uuid::new_v4(),
        name: "Acme Store".to_string(),
        email: format!("{}@acme.test", api_key),
        api_key: api_key.to_string(),
        is_active,
        created_at: now,
        updated_at: now,
    }
}

async fn setup() -> TestApp {
    let payments = Arc::new(InMemoryPaymentRepository::new());
    let merchants = Arc::new(InMemoryMerchantRepository::new());
    let customers = Arc::new(InMemoryCustomerRepository::new());

    let active = merchant(API_KEY, true);
    let inactive = merchant(INACTIVE_API_KEY, false);
    merchants.create(&active).await.unwrap();
    merchants.create(&inactive).await.unwrap();

    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4(),
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        phone: "+15550123".to_string(),
        created_at: now,
        updated_at: now,
    };
    customers.create(&customer).await.unwrap();

    let payment_service = Arc::new(PaymentService::new(
        payments.clone(),
        merchants.clone(),
        customers,
    ));

    let state = AppState {
        payment_service,
        merchants,
        health_checker: HealthChecker::new(None),
    };

    TestApp {
        router: create_router(state),
        merchant_id: active.id,
        inactive_merchant_id: inactive.id,
        customer_id: customer.id,
        payments,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, body)
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY);

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn payment_body(app: &TestApp, reference: Option<&str>) -> Value {
    json!({
        "merchant_id": app.merchant_id,
        "customer_id": app.customer_id,
        "amount": 10000,
        "currency": "USD",
        "method": "credit_card",
        "description": "Order #1001",
        "reference": reference,
    })
}

async fn create(app: &TestApp, reference: Option<&str>) -> Value {
    let (status, _, body) = send(
        app,
        authed("POST", "/api/v1/payments", Some(payment_body(app, reference))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

#[tokio::test]
async fn test_liveness_is_public() {
    let app = setup().await;
    let request = Request::builder()
        .uri("/health/live")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_with_in_memory_storage() {
    let app = setup().await;
    let request = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Healthy");
}

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let app = setup().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/payments")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payment_body(&app, None).to_string()))
        .unwrap();

    let (status, headers, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "API key is required");

    let request_id = body["request_id"].as_str().unwrap();
    assert!(request_id.starts_with("req_"));
    assert_eq!(headers.get("x-request-id").unwrap(), request_id);
    assert!(app.payments.is_empty().await);
}

#[tokio::test]
async fn test_unknown_and_inactive_keys_are_rejected() {
    let app = setup().await;
    let uri = format!("/api/v1/payments/{}", Uuid::new_v4());

    let request = Request::builder()
        .uri(&uri)
        .header("x-api-key", "sk_unknown")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid API key");

    let request = Request::builder()
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", INACTIVE_API_KEY))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Merchant account is inactive");
}

#[tokio::test]
async fn test_bearer_token_authenticates() {
    let app = setup().await;
    let request = Request::builder()
        .uri(format!("/api/v1/payments/{}", Uuid::new_v4()))
        .header(header::AUTHORIZATION, format!("Bearer {}", API_KEY))
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "PAYMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_create_process_process_again() {
    let app = setup().await;

    let payment = create(&app, Some("ORDER-1001")).await;
    assert_eq!(payment["status"], "pending");
    assert_eq!(payment["amount"], 10000);
    assert_eq!(payment["currency"], "USD");
    assert_eq!(payment["method"], "credit_card");
    assert!(payment.get("completed_at").is_none());
    let id = payment["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(
        &app,
        authed("POST", &format!("/api/v1/payments/{}/process", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Payment processed successfully");
    assert_eq!(body["data"]["status"], "completed");
    assert!(body["data"]["completed_at"].is_string());

    let (status, _, body) = send(
        &app,
        authed("POST", &format!("/api/v1/payments/{}/process", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_STATUS_TRANSITION");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("completed"));
    assert!(message.contains("cannot process"));
}

#[tokio::test]
async fn test_cancel_then_process() {
    let app = setup().await;
    let payment = create(&app, None).await;
    let id = payment["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(
        &app,
        authed("POST", &format!("/api/v1/payments/{}/cancel", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert!(body["data"].get("completed_at").is_none());

    let (status, _, body) = send(
        &app,
        authed("POST", &format!("/api/v1/payments/{}/process", id), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("cancelled"));

    let (status, _, body) = send(&app, authed("GET", &format!("/api/v1/payments/{}", id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
}

#[tokio::test]
async fn test_inactive_merchant_payment_is_rejected() {
    let app = setup().await;
    let mut body = payment_body(&app, None);
    body["merchant_id"] = json!(app.inactive_merchant_id);
    // Unknown customer as well; the merchant check comes first
    body["customer_id"] = json!(Uuid::new_v4());

    let (status, _, body) = send(&app, authed("POST", "/api/v1/payments", Some(body))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "merchant is not active");
    assert!(app.payments.is_empty().await);
}

#[tokio::test]
async fn test_unknown_customer_is_not_found() {
    let app = setup().await;
    let mut body = payment_body(&app, None);
    body["customer_id"] = json!(Uuid::new_v4());

    let (status, _, body) = send(&app, authed("POST", "/api/v1/payments", Some(body))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "CUSTOMER_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_input_never_reaches_the_service() {
    let app = setup().await;

    let mut bad_currency = payment_body(&app, None);
    bad_currency["currency"] = json!("US");
    let (status, _, body) = send(&app, authed("POST", "/api/v1/payments", Some(bad_currency))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["field"], "currency");

    let mut negative = payment_body(&app, None);
    negative["amount"] = json!(-5);
    let (status, _, _) = send(&app, authed("POST", "/api/v1/payments", Some(negative))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut missing = payment_body(&app, None);
    missing.as_object_mut().unwrap().remove("method");
    let (status, _, body) = send(&app, authed("POST", "/api/v1/payments", Some(missing))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "method");

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/payments")
        .header("x-api-key", API_KEY)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));

    assert!(app.payments.is_empty().await);
}

#[tokio::test]
async fn test_invalid_payment_id_format() {
    let app = setup().await;

    let (status, _, body) = send(&app, authed("GET", "/api/v1/payments/not-a-uuid", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payment ID format");
}

#[tokio::test]
async fn test_reference_lookup_and_duplicates() {
    let app = setup().await;
    let payment = create(&app, Some("INV-42")).await;

    let (status, _, body) = send(
        &app,
        authed("GET", "/api/v1/payments/reference/INV-42", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], payment["id"]);

    let (status, _, body) = send(
        &app,
        authed("POST", "/api/v1/payments", Some(payment_body(&app, Some("INV-42")))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DUPLICATE_REFERENCE");
    assert_eq!(app.payments.len().await, 1);

    let (status, _, _) = send(
        &app,
        authed("GET", "/api/v1/payments/reference/INV-404", None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_merchant_listing_pagination() {
    let app = setup().await;
    for i in 0..3 {
        create(&app, Some(&format!("PAGE-{}", i))).await;
    }
    let base = format!("/api/v1/merchants/{}/payments", app.merchant_id);

    let (status, _, body) = send(&app, authed("GET", &format!("{}?limit=abc&offset=-1", base), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (_, _, body) = send(&app, authed("GET", &format!("{}?limit=2", base), None)).await;
    let page = body["data"].as_array().unwrap();
    assert_eq!(page.len(), 2);
    let created_at = |v: &Value| {
        v["created_at"]
            .as_str()
            .unwrap()
            .parse::<chrono::DateTime<Utc>>()
            .unwrap()
    };
    assert!(created_at(&page[0]) >= created_at(&page[1]));

    let (_, _, body) = send(&app, authed("GET", &format!("{}?limit=2&offset=2", base), None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, _, body) = send(
        &app,
        authed(
            "GET",
            &format!("/api/v1/customers/{}/payments?limit=0", app.customer_id),
            None,
        ),
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_incoming_request_id_is_preserved() {
    let app = setup().await;
    let request = Request::builder()
        .uri(format!("/api/v1/payments/{}", Uuid::new_v4()))
        .header("x-api-key", API_KEY)
        .header("x-request-id", "req_fromclient0001")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers.get("x-request-id").unwrap(), "req_fromclient0001");
    assert_eq!(body["request_id"], "req_fromclient0001");
}
