//! CRUD operations for [`Order`] records and the platform impact aggregate.

use rusqlite::params;
use uuid::Uuid;

use crate::database::{time_col, uuid_col, Database};
use crate::error::{Result, StoreError};
use crate::models::{Order, OrderLine};

/// Raw totals scanned from the order history. The trees-planted conversion
/// lives with the API layer; the store only reports what it counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactTotals {
    pub total_orders: i64,
    pub total_carbon_offset: f64,
}

impl Database {
    /// Persist an order together with its line items, verbatim.
    ///
    /// Product references are not checked against the catalog and prices are
    /// not re-verified; the order records exactly what was submitted.
    pub fn insert_order(&mut self, order: &Order, lines: &[OrderLine]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "INSERT INTO orders (id, buyer_id, total_amount, carbon_offset, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                order.id.to_string(),
                order.buyer_id.to_string(),
                order.total_amount,
                order.carbon_offset,
                order.created_at.to_rfc3339(),
            ],
        )?;

        for (seq, line) in lines.iter().enumerate() {
            tx.execute(
                "INSERT INTO order_items (order_id, seq, product_id, quantity)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    order.id.to_string(),
                    seq as i64,
                    line.product_id.to_string(),
                    line.quantity,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Fetch a single order by id.
    pub fn get_order(&self, id: Uuid) -> Result<Order> {
        self.conn()
            .query_row(
                "SELECT id, buyer_id, total_amount, carbon_offset, created_at
                 FROM orders WHERE id = ?1",
                params![id.to_string()],
                row_to_order,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List a buyer's orders in submission order.
    pub fn list_orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, buyer_id, total_amount, carbon_offset, created_at
             FROM orders WHERE buyer_id = ?1 ORDER BY rowid ASC",
        )?;

        let rows = stmt.query_map(params![buyer_id.to_string()], row_to_order)?;

        let mut orders = Vec::new();
        for row in rows {
            orders.push(row?);
        }
        Ok(orders)
    }

    /// Read an order's line items in position order.
    pub fn lines_for_order(&self, order_id: Uuid) -> Result<Vec<OrderLine>> {
        let mut stmt = self.conn().prepare(
            "SELECT product_id, quantity FROM order_items
             WHERE order_id = ?1 ORDER BY seq ASC",
        )?;

        let rows = stmt.query_map(params![order_id.to_string()], |row| {
            let product_str: String = row.get(0)?;
            Ok(OrderLine {
                product_id: uuid_col(0, &product_str)?,
                quantity: row.get(1)?,
            })
        })?;

        let mut lines = Vec::new();
        for row in rows {
            lines.push(row?);
        }
        Ok(lines)
    }

    /// Scan every order and sum carbon footprint x quantity across all line
    /// items. Line items whose product reference dangles contribute nothing.
    ///
    /// Callers only see [`ImpactTotals`], so this full scan can later be
    /// replaced by a counter maintained at order creation without touching
    /// them.
    pub fn platform_impact(&self) -> Result<ImpactTotals> {
        let total_orders: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;

        let total_carbon_offset: f64 = self.conn().query_row(
            "SELECT COALESCE(SUM(p.carbon_footprint * oi.quantity), 0.0)
             FROM order_items oi
             JOIN products p ON p.id = oi.product_id",
            [],
            |row| row.get(0),
        )?;

        Ok(ImpactTotals {
            total_orders,
            total_carbon_offset,
        })
    }
}

/// Map a `rusqlite::Row` to an [`Order`].
fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let id_str: String = row.get(0)?;
    let buyer_str: String = row.get(1)?;
    let created_str: String = row.get(4)?;

    Ok(Order {
        id: uuid_col(0, &id_str)?,
        buyer_id: uuid_col(1, &buyer_str)?,
        total_amount: row.get(2)?,
        carbon_offset: row.get(3)?,
        created_at: time_col(4, &created_str)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ecowear_shared::Role;

    use crate::models::User;
    use crate::products::tests::{sample_product, seeded_seller};

    fn seeded_buyer(db: &Database) -> User {
        let buyer = User {
            id: Uuid::new_v4(),
            name: "Test Buyer".to_string(),
            email: format!("{}@example.com", Uuid::new_v4()),
            password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
            role: Role::Buyer,
            is_verified: false,
            created_at: Utc::now(),
        };
        db.create_user(&buyer).unwrap();
        buyer
    }

    fn place_order(db: &mut Database, buyer_id: Uuid, lines: &[OrderLine], total: f64) -> Order {
        let order = Order {
            id: Uuid::new_v4(),
            buyer_id,
            total_amount: total,
            carbon_offset: true,
            created_at: Utc::now(),
        };
        db.insert_order(&order, lines).unwrap();
        order
    }

    #[test]
    fn order_round_trip_keeps_line_order() {
        let mut db = Database::open_in_memory().unwrap();
        let buyer = seeded_buyer(&db);

        let lines = vec![
            OrderLine { product_id: Uuid::new_v4(), quantity: 2 },
            OrderLine { product_id: Uuid::new_v4(), quantity: 1 },
        ];
        let order = place_order(&mut db, buyer.id, &lines, 135.0);

        assert_eq!(db.get_order(order.id).unwrap(), order);
        assert_eq!(db.lines_for_order(order.id).unwrap(), lines);

        let mine = db.list_orders_for_buyer(buyer.id).unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[test]
    fn impact_on_empty_store_is_zero() {
        let db = Database::open_in_memory().unwrap();
        let totals = db.platform_impact().unwrap();
        assert_eq!(totals.total_orders, 0);
        assert_eq!(totals.total_carbon_offset, 0.0);
    }

    #[test]
    fn impact_multiplies_footprint_by_quantity() {
        let mut db = Database::open_in_memory().unwrap();
        let seller = seeded_seller(&db);
        let buyer = seeded_buyer(&db);

        let product = sample_product(seller.id, "Classic Organic Tee", 5.0);
        db.insert_product(&product).unwrap();

        place_order(
            &mut db,
            buyer.id,
            &[OrderLine { product_id: product.id, quantity: 3 }],
            75.0,
        );

        let totals = db.platform_impact().unwrap();
        assert_eq!(totals.total_orders, 1);
        assert_eq!(totals.total_carbon_offset, 15.0);
    }

    #[test]
    fn impact_accumulates_across_orders() {
        let mut db = Database::open_in_memory().unwrap();
        let seller = seeded_seller(&db);
        let buyer = seeded_buyer(&db);

        let product = sample_product(seller.id, "Recycled Denim Jacket", 10.0);
        db.insert_product(&product).unwrap();

        let line = OrderLine { product_id: product.id, quantity: 2 };
        place_order(&mut db, buyer.id, &[line.clone()], 170.0);
        place_order(&mut db, buyer.id, &[line], 170.0);

        let totals = db.platform_impact().unwrap();
        assert_eq!(totals.total_orders, 2);
        assert_eq!(totals.total_carbon_offset, 40.0);
    }

    #[test]
    fn dangling_product_references_contribute_nothing() {
        let mut db = Database::open_in_memory().unwrap();
        let buyer = seeded_buyer(&db);

        place_order(
            &mut db,
            buyer.id,
            &[OrderLine { product_id: Uuid::new_v4(), quantity: 4 }],
            99.0,
        );

        let totals = db.platform_impact().unwrap();
        assert_eq!(totals.total_orders, 1);
        assert_eq!(totals.total_carbon_offset, 0.0);
    }
}
