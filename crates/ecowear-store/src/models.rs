//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be embedded
//! directly in API responses where no cross-entity resolution is needed.

use chrono::{DateTime, Utc};
use ecowear_shared::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account. Role is assigned at registration and never changes;
/// the only mutable field is the admin-controlled verification flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// bcrypt hash of the account password. Never serialized to clients;
    /// response types carry name and id only.
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A catalog listing, owned by the seller who created it. There is no update
/// or delete operation for products anywhere in the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    /// Image URL shown in the storefront.
    pub image: String,
    pub materials: String,
    /// Certification labels, e.g. "GOTS", "Fair Trade". May be empty.
    pub eco_certifications: Vec<String>,
    /// Seller-declared kg CO2e per unit; summed across order line items by
    /// the impact aggregate.
    pub carbon_footprint: f64,
    /// Optional transparent-sourcing narrative.
    pub production_process: Option<String>,
    pub stock: i64,
    pub seller_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

/// A buyer review of a product. The product and author references are
/// immutable once set; the like-set and reply sequence live in their own
/// tables and are the only parts that change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    /// 1..=5
    pub rating: u8,
    /// 1..=5
    pub sustainability_rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A seller/admin addendum to a review. Append-only: replies are never
/// edited or deleted, and display order always matches submission order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewReply {
    pub id: Uuid,
    pub review_id: Uuid,
    pub user_id: Uuid,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A purchase record. Line items are stored verbatim from the request;
/// nothing is re-priced or stock-decremented at order time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub total_amount: f64,
    /// Always true in the current design; kept as data so the flag can vary
    /// later without a schema change.
    pub carbon_offset: bool,
    pub created_at: DateTime<Utc>,
}

/// One (product reference, quantity) pair within an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i64,
}
