//! Receipt lookups.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use farmasys_core::money::{self, Money};
use farmasys_core::{Capability, PaymentMethod, ReceiptDetail, ReceiptLine};

#[derive(Debug, Serialize)]
pub struct ReceiptLineView {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub qty: i64,
    #[serde(with = "money::decimal")]
    pub unit_price: Money,
    #[serde(with = "money::decimal")]
    pub line_subtotal: Money,
}

impl From<ReceiptLine> for ReceiptLineView {
    fn from(line: ReceiptLine) -> Self {
        ReceiptLineView {
            unit_price: line.unit_price(),
            line_subtotal: line.line_subtotal(),
            product_id: line.product_id,
            sku: line.sku,
            name: line.name,
            qty: line.qty,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReceiptView {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub customer: Option<String>,
    pub payment_method: PaymentMethod,
    pub cashier: String,
    #[serde(with = "money::decimal")]
    pub subtotal: Money,
    #[serde(with = "money::decimal")]
    pub iva: Money,
    #[serde(with = "money::decimal")]
    pub total: Money,
    pub lines: Vec<ReceiptLineView>,
}

impl From<ReceiptDetail> for ReceiptView {
    fn from(detail: ReceiptDetail) -> Self {
        let r = detail.receipt;
        ReceiptView {
            subtotal: r.subtotal(),
            iva: r.iva(),
            total: r.total(),
            id: r.id,
            created_at: r.created_at,
            customer: r.customer,
            payment_method: r.payment_method,
            cashier: r.cashier,
            lines: detail.lines.into_iter().map(ReceiptLineView::from).collect(),
        }
    }
}

/// `?limit=&offset=`. Without `limit` every receipt is returned.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
}

#[derive(Serialize)]
pub struct ReceiptsResponse {
    pub ok: bool,
    pub receipts: Vec<ReceiptView>,
}

#[derive(Serialize)]
pub struct ReceiptResponse {
    pub ok: bool,
    pub receipt: ReceiptView,
}

/// Newest first.
pub async fn list_receipts(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<ReceiptsResponse>, ApiError> {
    principal.require(Capability::ViewReceipts)?;

    let receipts = state
        .db
        .receipts()
        .list(params.limit, params.offset)
        .await?
        .into_iter()
        .map(ReceiptView::from)
        .collect();

    Ok(Json(ReceiptsResponse { ok: true, receipts }))
}

pub async fn get_receipt(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ReceiptResponse>, ApiError> {
    principal.require(Capability::ViewReceipts)?;

    let detail = state.db.receipts().get(&id).await?;
    Ok(Json(ReceiptResponse {
        ok: true,
        receipt: detail.into(),
    }))
}
