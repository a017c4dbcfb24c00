//! Product catalog endpoints.
//!
//! Reads are public; creation is gated to sellers and admins. Products are
//! never updated or deleted once listed.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ecowear_shared::Role;
use ecowear_store::{Database, Product, StoreError};

use crate::api::AppState;
use crate::auth::{authenticate, AuthUser};
use crate::error::{non_negative, require, require_text, ApiError};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize, Debug)]
pub struct SellerRef {
    pub id: Uuid,
    pub name: String,
}

/// A catalog record with the seller reference resolved inline.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: String,
    pub materials: String,
    pub eco_certifications: Vec<String>,
    pub carbon_footprint: f64,
    pub production_process: Option<String>,
    pub stock: i64,
    /// `None` when the endpoint does not resolve sellers (own listings) or
    /// the reference dangles.
    pub seller: Option<SellerRef>,
    pub created_at: DateTime<Utc>,
}

impl ProductView {
    pub fn from_product(product: Product, seller: Option<SellerRef>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            image: product.image,
            materials: product.materials,
            eco_certifications: product.eco_certifications,
            carbon_footprint: product.carbon_footprint,
            production_process: product.production_process,
            stock: product.stock,
            seller,
            created_at: product.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    name: Option<String>,
    description: Option<String>,
    price: Option<f64>,
    category: Option<String>,
    image: Option<String>,
    materials: Option<String>,
    eco_certifications: Option<Vec<String>>,
    carbon_footprint: Option<f64>,
    production_process: Option<String>,
    stock: Option<i64>,
}

/// Check field presence and numeric shape, and build the record to persist.
fn validate_new_product(req: CreateProductRequest, seller_id: Uuid) -> Result<Product, ApiError> {
    let price = non_negative(require(req.price, "price")?, "price")?;
    let carbon_footprint = non_negative(
        require(req.carbon_footprint, "carbonFootprint")?,
        "carbonFootprint",
    )?;

    let stock = require(req.stock, "stock")?;
    if stock < 0 {
        return Err(ApiError::Validation(
            "stock must be a non-negative number".to_string(),
        ));
    }

    Ok(Product {
        id: Uuid::new_v4(),
        name: require_text(req.name, "name")?,
        description: require_text(req.description, "description")?,
        price,
        category: require_text(req.category, "category")?,
        image: require_text(req.image, "image")?,
        materials: require_text(req.materials, "materials")?,
        eco_certifications: req.eco_certifications.unwrap_or_default(),
        carbon_footprint,
        production_process: req.production_process,
        stock,
        seller_id,
        created_at: Utc::now(),
    })
}

/// Resolve a seller reference, tolerating a dangling id.
pub fn seller_ref(db: &Database, id: Uuid) -> Result<Option<SellerRef>, ApiError> {
    match db.get_user(id) {
        Ok(user) => Ok(Some(SellerRef {
            id: user.id,
            name: user.name,
        })),
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Whole catalog with seller names. Public.
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let db = state.db.lock().await;
    let products = db.list_products()?;

    let mut views = Vec::with_capacity(products.len());
    for product in products {
        let seller = seller_ref(&db, product.seller_id)?;
        views.push(ProductView::from_product(product, seller));
    }
    Ok(Json(views))
}

/// Single product with seller name. Public.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, ApiError> {
    let db = state.db.lock().await;

    let product = db.get_product(id).map_err(|e| match e {
        StoreError::NotFound => ApiError::NotFound("Product not found".to_string()),
        other => other.into(),
    })?;

    let seller = seller_ref(&db, product.seller_id)?;
    Ok(Json(ProductView::from_product(product, seller)))
}

/// The caller's own listings, without the (self-evident) seller resolution.
pub async fn my_products(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    let caller = authenticate(&headers, &state)?;

    let products = state.db.lock().await.list_products_for_seller(caller.user_id)?;

    Ok(Json(
        products
            .into_iter()
            .map(|p| ProductView::from_product(p, None))
            .collect(),
    ))
}

/// Create a listing owned by the caller. Sellers and admins only.
pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ProductView>, ApiError> {
    let caller = authenticate(&headers, &state)?;
    ensure_can_list(&caller)?;

    let product = validate_new_product(req, caller.user_id)?;

    let db = state.db.lock().await;
    db.insert_product(&product)?;
    let seller = seller_ref(&db, caller.user_id)?;
    drop(db);

    info!(product = %product.id, seller = %caller.user_id, "product listed");

    Ok(Json(ProductView::from_product(product, seller)))
}

fn ensure_can_list(caller: &AuthUser) -> Result<(), ApiError> {
    match caller.role {
        Role::Seller | Role::Admin => Ok(()),
        Role::Buyer => Err(ApiError::Forbidden(
            "Only sellers can create products".to_string(),
        )),
    }
}
