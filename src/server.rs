//! HTTP surface: catalog and checkout for the storefront, the payment webhook
//! and a few read endpoints
//!
//! One [`Ledger`] is shared behind an async mutex, so notifications are
//! applied one at a time.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::gateway::{process_notification, PaymentNotification};
use crate::ledger::{Ledger, TrialBalance};
use crate::storefront::Cart;
use crate::traits::LedgerStorage;
use crate::types::*;

/// Application state shared across handlers
pub struct AppState<S: LedgerStorage> {
    pub ledger: Arc<Mutex<Ledger<S>>>,
}

impl<S: LedgerStorage> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<S: LedgerStorage> AppState<S> {
    pub fn new(ledger: Ledger<S>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
        }
    }
}

/// API error types
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };
        (
            status,
            Json(ErrorResponse {
                error: error_type.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(_) | LedgerError::InvalidJournal(_) => {
                ApiError::BadRequest(err.to_string())
            }
            LedgerError::AccountNotFound(_) | LedgerError::OrderNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl ApiError {
    /// Webhook mapping: only a malformed payload is the sender's fault.
    /// Everything else, an unknown order included, is a 500 so the gateway
    /// retries the notification.
    fn from_webhook(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub status: String,
    pub journal_recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub quantity: i64,
}

/// Cart contents posted by the storefront
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub address: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub order_id: i64,
    /// Order id to hand to the payment gateway
    pub gateway_order_id: String,
    pub total_amount: BigDecimal,
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Optional `start` and `end` dates (YYYY-MM-DD) of a report period
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PeriodQuery {
    fn period(&self) -> ReportPeriod {
        ReportPeriod {
            start: self.start,
            end: self.end,
        }
    }
}

/// Creates the router
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: LedgerStorage + Clone + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/products", get(list_products::<S>))
        .route("/products/:id", put(save_product::<S>))
        .route("/checkout", post(checkout::<S>))
        .route("/orders/:id", get(get_order::<S>))
        .route("/midtrans/notification", post(payment_notification::<S>))
        .route("/reports/trial-balance", get(trial_balance::<S>))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Catalog listing
pub async fn list_products<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Product>>, ApiError>
where
    S: LedgerStorage + Clone + 'static,
{
    let ledger = state.ledger.lock().await;
    Ok(Json(ledger.list_products().await?))
}

/// Create or replace a catalog product; the path id wins over the body's
pub async fn save_product<S>(
    State(state): State<AppState<S>>,
    Path(product_id): Path<i64>,
    Json(mut product): Json<Product>,
) -> Result<Json<Product>, ApiError>
where
    S: LedgerStorage + Clone + 'static,
{
    if product.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Product name cannot be empty".to_string()));
    }
    if product.price < BigDecimal::from(0) {
        return Err(ApiError::BadRequest("Product price cannot be negative".to_string()));
    }
    product.id = product_id;

    let mut ledger = state.ledger.lock().await;
    ledger.save_product(&product).await?;
    tracing::info!(product_id, name = %product.name, "product saved");
    Ok(Json(product))
}

/// Turn the posted cart into a pending order
pub async fn checkout<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError>
where
    S: LedgerStorage + Clone + 'static,
{
    let mut ledger = state.ledger.lock().await;

    let mut cart = Cart::new();
    for item in &request.items {
        let product = ledger.get_product(item.product_id).await?.ok_or_else(|| {
            ApiError::BadRequest(format!("Product {} is not in the catalog", item.product_id))
        })?;
        cart.add(&product, item.quantity)?;
    }

    let placed = ledger
        .checkout(
            &cart,
            &request.address,
            request.user_id.clone(),
            chrono::Utc::now().naive_utc(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: placed.order.id,
            gateway_order_id: placed.gateway_order_id,
            total_amount: placed.order.total_amount,
            status: placed.order.status,
        }),
    ))
}

/// An order with its items
pub async fn get_order<S>(
    State(state): State<AppState<S>>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: LedgerStorage + Clone + 'static,
{
    let ledger = state.ledger.lock().await;
    let order = ledger.get_order_required(order_id).await?;
    let items = ledger.get_order_items(order_id).await?;
    Ok(Json(OrderResponse { order, items }))
}

/// Payment gateway notification URL
pub async fn payment_notification<S>(
    State(state): State<AppState<S>>,
    body: Bytes,
) -> Result<Json<NotificationResponse>, ApiError>
where
    S: LedgerStorage + Clone + 'static,
{
    let notification: PaymentNotification = serde_json::from_slice(&body).map_err(|err| {
        tracing::warn!(error = %err, "unreadable notification payload");
        ApiError::BadRequest(format!("Invalid JSON payload: {}", err))
    })?;

    let received_on = chrono::Utc::now().date_naive();
    let mut ledger = state.ledger.lock().await;
    let outcome = process_notification(&mut *ledger, &notification, received_on)
        .await
        .map_err(|err| {
            tracing::error!(order_id = ?notification.order_id, error = %err, "notification failed");
            ApiError::from_webhook(err)
        })?;

    Ok(Json(NotificationResponse {
        status: "ok".to_string(),
        journal_recorded: outcome.journal_recorded,
    }))
}

/// Trial balance for an optional period
pub async fn trial_balance<S>(
    State(state): State<AppState<S>>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<TrialBalance>, ApiError>
where
    S: LedgerStorage + Clone + 'static,
{
    let mut ledger = state.ledger.lock().await;
    let trial_balance = ledger.trial_balance(&query.period()).await?;
    Ok(Json(trial_balance))
}
