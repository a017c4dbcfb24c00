//! CRUD operations for [`Product`] records.
//!
//! Products are created once and never updated or deleted, so the write
//! surface here is a single insert.

use rusqlite::params;
use uuid::Uuid;

use crate::database::{json_col, time_col, uuid_col, Database};
use crate::error::{Result, StoreError};
use crate::models::Product;

impl Database {
    /// Insert a new catalog listing.
    pub fn insert_product(&self, product: &Product) -> Result<()> {
        // Certification labels are a display-only list; JSON text keeps the
        // schema flat.
        let certifications = serde_json::to_string(&product.eco_certifications)?;

        self.conn().execute(
            "INSERT INTO products (id, name, description, price, category, image, materials,
                                   eco_certifications, carbon_footprint, production_process,
                                   stock, seller_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                product.id.to_string(),
                product.name,
                product.description,
                product.price,
                product.category,
                product.image,
                product.materials,
                certifications,
                product.carbon_footprint,
                product.production_process,
                product.stock,
                product.seller_id.to_string(),
                product.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single product by id.
    pub fn get_product(&self, id: Uuid) -> Result<Product> {
        self.conn()
            .query_row(
                &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
                params![id.to_string()],
                row_to_product,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List the whole catalog, newest listings first.
    pub fn list_products(&self) -> Result<Vec<Product>> {
        self.query_products(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY rowid DESC"),
            params![],
        )
    }

    /// List the listings owned by one seller, newest first.
    pub fn list_products_for_seller(&self, seller_id: Uuid) -> Result<Vec<Product>> {
        self.query_products(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_id = ?1 ORDER BY rowid DESC"
            ),
            params![seller_id.to_string()],
        )
    }

    fn query_products(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Product>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, row_to_product)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category, image, materials, \
                               eco_certifications, carbon_footprint, production_process, \
                               stock, seller_id, created_at";

/// Map a `rusqlite::Row` to a [`Product`].
fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    let id_str: String = row.get(0)?;
    let certifications_str: String = row.get(7)?;
    let seller_str: String = row.get(11)?;
    let created_str: String = row.get(12)?;

    Ok(Product {
        id: uuid_col(0, &id_str)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: row.get(3)?,
        category: row.get(4)?,
        image: row.get(5)?,
        materials: row.get(6)?,
        eco_certifications: json_col(7, &certifications_str)?,
        carbon_footprint: row.get(8)?,
        production_process: row.get(9)?,
        stock: row.get(10)?,
        seller_id: uuid_col(11, &seller_str)?,
        created_at: time_col(12, &created_str)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use ecowear_shared::Role;

    use crate::models::User;

    pub(crate) fn seeded_seller(db: &Database) -> User {
        let seller = User {
            id: Uuid::new_v4(),
            name: "Green Threads Co".to_string(),
            email: format!("{}@sellers.example.com", Uuid::new_v4()),
            password_hash: "$2b$12$fakefakefakefakefakefake".to_string(),
            role: Role::Seller,
            is_verified: true,
            created_at: Utc::now(),
        };
        db.create_user(&seller).unwrap();
        seller
    }

    pub(crate) fn sample_product(seller_id: Uuid, name: &str, carbon_footprint: f64) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: "A soft, breathable organic cotton tee.".to_string(),
            price: 25.0,
            category: "Men".to_string(),
            image: "https://images.example.com/tee.jpg".to_string(),
            materials: "100% Organic Cotton".to_string(),
            eco_certifications: vec!["GOTS".to_string()],
            carbon_footprint,
            production_process: None,
            stock: 50,
            seller_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn insert_and_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let seller = seeded_seller(&db);
        let product = sample_product(seller.id, "Classic Organic Tee", 4.5);

        db.insert_product(&product).unwrap();

        let fetched = db.get_product(product.id).unwrap();
        assert_eq!(fetched, product);
        assert_eq!(fetched.eco_certifications, vec!["GOTS".to_string()]);
    }

    #[test]
    fn missing_product_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.get_product(Uuid::new_v4()),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn list_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let seller = seeded_seller(&db);

        let first = sample_product(seller.id, "First", 1.0);
        let second = sample_product(seller.id, "Second", 2.0);
        db.insert_product(&first).unwrap();
        db.insert_product(&second).unwrap();

        let listed = db.list_products().unwrap();
        assert_eq!(listed[0].name, "Second");
        assert_eq!(listed[1].name, "First");
    }

    #[test]
    fn seller_listing_excludes_other_sellers() {
        let db = Database::open_in_memory().unwrap();
        let a = seeded_seller(&db);
        let b = seeded_seller(&db);

        db.insert_product(&sample_product(a.id, "A's tee", 1.0)).unwrap();
        db.insert_product(&sample_product(b.id, "B's tee", 1.0)).unwrap();

        let mine = db.list_products_for_seller(a.id).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].seller_id, a.id);
    }
}
