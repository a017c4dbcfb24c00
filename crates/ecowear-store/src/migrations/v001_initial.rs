//! v001 -- Initial schema creation.
//!
//! Creates the six core tables: `users`, `products`, `reviews`,
//! `review_likes`, `review_replies`, and `orders` + `order_items`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,               -- bcrypt
    role          TEXT NOT NULL,               -- buyer | seller | admin, immutable
    is_verified   INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1, set by admin
    created_at    TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Products
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS products (
    id                 TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name               TEXT NOT NULL,
    description        TEXT NOT NULL,
    price              REAL NOT NULL,
    category           TEXT NOT NULL,
    image              TEXT NOT NULL,              -- image URL
    materials          TEXT NOT NULL,
    eco_certifications TEXT NOT NULL DEFAULT '[]', -- JSON array of labels
    carbon_footprint   REAL NOT NULL DEFAULT 0,    -- kg CO2e per unit
    production_process TEXT,                       -- nullable narrative
    stock              INTEGER NOT NULL DEFAULT 0,
    seller_id          TEXT NOT NULL,              -- FK -> users(id)
    created_at         TEXT NOT NULL,

    FOREIGN KEY (seller_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_products_seller ON products(seller_id);

-- ----------------------------------------------------------------
-- Reviews
-- ----------------------------------------------------------------
-- product_id is deliberately not a foreign key: review submission does not
-- check the catalog, matching the permissive write path of the rest of the
-- system.
CREATE TABLE IF NOT EXISTS reviews (
    id                    TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    product_id            TEXT NOT NULL,
    user_id               TEXT NOT NULL,              -- author, FK -> users(id)
    rating                INTEGER NOT NULL,           -- 1..=5
    sustainability_rating INTEGER NOT NULL,           -- 1..=5
    comment               TEXT NOT NULL,
    created_at            TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_reviews_product ON reviews(product_id);

-- ----------------------------------------------------------------
-- Review likes
-- ----------------------------------------------------------------
-- The like-set. Membership is the source of truth; the composite primary
-- key makes a duplicate like unrepresentable.
CREATE TABLE IF NOT EXISTS review_likes (
    review_id  TEXT NOT NULL,
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    PRIMARY KEY (review_id, user_id),
    FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Review replies
-- ----------------------------------------------------------------
-- Append-only. seq fixes insertion order independent of wall clocks.
CREATE TABLE IF NOT EXISTS review_replies (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    id         TEXT NOT NULL UNIQUE,            -- UUID v4
    review_id  TEXT NOT NULL,
    user_id    TEXT NOT NULL,                   -- reply author
    comment    TEXT NOT NULL,
    created_at TEXT NOT NULL,

    FOREIGN KEY (review_id) REFERENCES reviews(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_replies_review ON review_replies(review_id);

-- ----------------------------------------------------------------
-- Orders
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS orders (
    id            TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    buyer_id      TEXT NOT NULL,                -- FK -> users(id)
    total_amount  REAL NOT NULL,
    carbon_offset INTEGER NOT NULL DEFAULT 1,   -- boolean 0/1
    created_at    TEXT NOT NULL,

    FOREIGN KEY (buyer_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_orders_buyer ON orders(buyer_id);

-- ----------------------------------------------------------------
-- Order line items
-- ----------------------------------------------------------------
-- product_id is stored verbatim with no foreign key: orders never
-- re-validate the catalog and a reference is allowed to dangle.
CREATE TABLE IF NOT EXISTS order_items (
    order_id   TEXT NOT NULL,
    seq        INTEGER NOT NULL,               -- position within the order
    product_id TEXT NOT NULL,
    quantity   INTEGER NOT NULL,

    PRIMARY KEY (order_id, seq),
    FOREIGN KEY (order_id) REFERENCES orders(id) ON DELETE CASCADE
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
