//! `POST /checkout`: turns a cart into a receipt.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use farmasys_core::money::{self, Money};
use farmasys_core::{Capability, CheckoutRequest};

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub ok: bool,
    pub receipt_id: String,
    #[serde(with = "money::decimal")]
    pub subtotal: Money,
    #[serde(with = "money::decimal")]
    pub iva: Money,
    #[serde(with = "money::decimal")]
    pub total: Money,
    pub message: String,
}

pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    principal.require(Capability::Checkout)?;
    let Json(request) = body?;

    let outcome = state.db.checkout(&request, &principal.username).await?;

    for o in &outcome.price_overrides {
        warn!(
            receipt_id = %outcome.receipt_id(),
            product_id = %o.product_id,
            submitted = %o.submitted,
            charged = %o.charged,
            cashier = %principal.username,
            "Client price ignored, charged stored price"
        );
    }

    Ok(Json(CheckoutResponse {
        ok: true,
        receipt_id: outcome.receipt_id().to_string(),
        subtotal: outcome.subtotal(),
        iva: outcome.iva(),
        total: outcome.total(),
        message: format!("Sale completed, total {}", outcome.total()),
    }))
}
