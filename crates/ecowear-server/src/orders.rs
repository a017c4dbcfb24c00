//! Order endpoints.
//!
//! Orders record what the client submitted, verbatim: no stock decrement and
//! no price re-verification against the live catalog. Listing resolves each
//! line item's product reference to the full record where it still resolves.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use ecowear_store::{Database, Order, OrderLine, StoreError};

use crate::api::AppState;
use crate::auth::authenticate;
use crate::error::{non_negative, require, ApiError};
use crate::products::ProductView;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    products: Option<Vec<LineRequest>>,
    total_amount: Option<f64>,
}

#[derive(Deserialize)]
pub struct LineRequest {
    product: Option<Uuid>,
    quantity: Option<i64>,
}

/// The stored order as created: line items keep their bare product ids.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrderView {
    pub id: Uuid,
    pub buyer: Uuid,
    pub products: Vec<CreatedLineView>,
    pub total_amount: f64,
    pub carbon_offset: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
pub struct CreatedLineView {
    pub product: Uuid,
    pub quantity: i64,
}

/// An order with line-item product references resolved to full records.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub buyer: Uuid,
    pub products: Vec<LineView>,
    pub total_amount: f64,
    pub carbon_offset: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct LineView {
    /// `null` when the stored reference no longer resolves.
    pub product: Option<ProductView>,
    pub quantity: i64,
}

fn validate_lines(lines: Vec<LineRequest>) -> Result<Vec<OrderLine>, ApiError> {
    let mut validated = Vec::with_capacity(lines.len());
    for line in lines {
        let quantity = require(line.quantity, "quantity")?;
        if quantity < 1 {
            return Err(ApiError::Validation(
                "quantity must be a positive number".to_string(),
            ));
        }
        validated.push(OrderLine {
            product_id: require(line.product, "product")?,
            quantity,
        });
    }
    Ok(validated)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Persist an order owned by the caller. The carbon-offset flag is always
/// set; product ids are stored as given.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreatedOrderView>, ApiError> {
    let caller = authenticate(&headers, &state)?;

    let lines = validate_lines(require(req.products, "products")?)?;
    let total_amount = non_negative(require(req.total_amount, "totalAmount")?, "totalAmount")?;

    let order = Order {
        id: Uuid::new_v4(),
        buyer_id: caller.user_id,
        total_amount,
        carbon_offset: true,
        created_at: Utc::now(),
    };

    state.db.lock().await.insert_order(&order, &lines)?;

    info!(order = %order.id, buyer = %caller.user_id, items = lines.len(), "order placed");

    Ok(Json(CreatedOrderView {
        id: order.id,
        buyer: order.buyer_id,
        products: lines
            .into_iter()
            .map(|l| CreatedLineView {
                product: l.product_id,
                quantity: l.quantity,
            })
            .collect(),
        total_amount: order.total_amount,
        carbon_offset: order.carbon_offset,
        created_at: order.created_at,
    }))
}

/// The caller's orders with product records resolved.
pub async fn my_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let caller = authenticate(&headers, &state)?;

    let db = state.db.lock().await;

    let orders = db.list_orders_for_buyer(caller.user_id)?;
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        views.push(order_view(&db, order)?);
    }
    Ok(Json(views))
}

fn order_view(db: &Database, order: Order) -> Result<OrderView, ApiError> {
    let mut products = Vec::new();
    for line in db.lines_for_order(order.id)? {
        let product = match db.get_product(line.product_id) {
            Ok(product) => Some(ProductView::from_product(product, None)),
            // Dangling references stay in the order; they just resolve to null.
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };
        products.push(LineView {
            product,
            quantity: line.quantity,
        });
    }

    Ok(OrderView {
        id: order.id,
        buyer: order.buyer_id,
        products,
        total_amount: order.total_amount,
        carbon_offset: order.carbon_offset,
        created_at: order.created_at,
    })
}
