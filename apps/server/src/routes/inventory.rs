//! Inventory CRUD.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;
use farmasys_core::money::{self, Money};
use farmasys_core::validation::parse_expiry;
use farmasys_core::{Capability, NewProduct, Product, ProductPatch};

/// A product as the counter sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub stock: i64,
    #[serde(with = "money::decimal")]
    pub price: Money,
    /// `YYYY-MM-DD`, or null.
    pub expiry: Option<NaiveDate>,
    pub category: String,
}

impl From<Product> for ProductView {
    fn from(p: Product) -> Self {
        ProductView {
            price: p.price(),
            id: p.id,
            sku: p.sku,
            name: p.name,
            stock: p.stock,
            expiry: p.expiry,
            category: p.category,
        }
    }
}

/// Body of `POST /inventory`.
#[derive(Debug, Deserialize)]
pub struct CreateProductBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default, with = "money::decimal")]
    pub price: Money,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TryFrom<CreateProductBody> for NewProduct {
    type Error = ApiError;

    fn try_from(body: CreateProductBody) -> Result<Self, Self::Error> {
        let expiry = match body.expiry.as_deref() {
            Some(text) => parse_expiry(text)?,
            None => None,
        };

        Ok(NewProduct {
            id: body.id.filter(|id| !id.trim().is_empty()),
            sku: body.sku,
            name: body.name,
            stock: body.stock,
            price: body.price,
            expiry,
            category: body.category.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /inventory/{id}`. Absent fields are left unchanged; an
/// empty `expiry` clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateProductBody {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default, with = "money::decimal::option")]
    pub price: Option<Money>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TryFrom<UpdateProductBody> for ProductPatch {
    type Error = ApiError;

    fn try_from(body: UpdateProductBody) -> Result<Self, Self::Error> {
        let expiry = match body.expiry.as_deref() {
            Some(text) => Some(parse_expiry(text)?),
            None => None,
        };

        Ok(ProductPatch {
            sku: body.sku,
            name: body.name,
            stock: body.stock,
            price: body.price,
            expiry,
            category: body.category,
        })
    }
}

#[derive(Serialize)]
pub struct ItemsResponse {
    pub ok: bool,
    pub items: Vec<ProductView>,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub ok: bool,
    pub item: ProductView,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub ok: bool,
    pub deleted: u64,
}

fn item(product: Product) -> Json<ItemResponse> {
    Json(ItemResponse {
        ok: true,
        item: product.into(),
    })
}

pub async fn list_items(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> Result<Json<ItemsResponse>, ApiError> {
    principal.require(Capability::ViewInventory)?;

    let items = state
        .db
        .products()
        .list()
        .await?
        .into_iter()
        .map(ProductView::from)
        .collect();

    Ok(Json(ItemsResponse { ok: true, items }))
}

pub async fn get_item(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, ApiError> {
    principal.require(Capability::ViewInventory)?;
    Ok(item(state.db.products().get(&id).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    body: Result<Json<CreateProductBody>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    principal.require(Capability::ManageInventory)?;
    let Json(body) = body?;

    let new = NewProduct::try_from(body)?;
    Ok(item(state.db.products().create(&new).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<UpdateProductBody>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    principal.require(Capability::ManageInventory)?;
    let Json(body) = body?;

    let patch = ProductPatch::try_from(body)?;
    Ok(item(state.db.products().update(&id, &patch).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    principal.require(Capability::ManageInventory)?;

    let deleted = state.db.products().delete(&id).await?;
    Ok(Json(DeletedResponse { ok: true, deleted }))
}
