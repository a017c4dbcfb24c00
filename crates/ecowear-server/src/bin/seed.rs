//! Populate the catalog with sample listings behind a demo seller account.
//!
//! Run with `cargo run --bin seed`. Honors `DATABASE_PATH` like the server.
//! The store has no product deletion, so seeding is skipped when the catalog
//! already has listings.

use std::path::PathBuf;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use ecowear_shared::Role;
use ecowear_store::{Database, Product, StoreError, User};

const SELLER_EMAIL: &str = "seedseller@test.com";

struct SeedProduct {
    name: &'static str,
    description: &'static str,
    price: f64,
    category: &'static str,
    image: &'static str,
    materials: &'static str,
    certifications: &'static [&'static str],
    carbon_footprint: f64,
    stock: i64,
}

const SAMPLE_PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Classic Organic Tee",
        description: "A soft, breathable organic cotton t-shirt perfect for everyday wear.",
        price: 25.0,
        category: "Men",
        image: "https://images.unsplash.com/photo-1521572163474-6864f9cf17ab?q=80&w=800",
        materials: "100% Organic Cotton",
        certifications: &["GOTS"],
        carbon_footprint: 4.5,
        stock: 50,
    },
    SeedProduct {
        name: "Recycled Denim Jacket",
        description: "Stylish jacket made from 100% recycled denim fibers.",
        price: 85.0,
        category: "Men",
        image: "https://images.unsplash.com/photo-1523240795612-9a054b0db644?q=80&w=800",
        materials: "Recycled Denim",
        certifications: &["Recycled Claim Standard"],
        carbon_footprint: 12.0,
        stock: 30,
    },
    SeedProduct {
        name: "Linen Summer Dress",
        description: "Lightweight linen dress for hot summer days, sourced sustainably.",
        price: 75.0,
        category: "Women",
        image: "https://images.unsplash.com/photo-1515372039744-b8f02a3ae446?q=80&w=800",
        materials: "100% Linen",
        certifications: &["Fair Trade"],
        carbon_footprint: 6.2,
        stock: 40,
    },
    SeedProduct {
        name: "Bamboo Yoga Leggings",
        description: "Stretchy and comfortable leggings made from bamboo viscose.",
        price: 45.0,
        category: "Activewear",
        image: "https://images.unsplash.com/photo-1518310383802-640c2de311b2?q=80&w=800",
        materials: "Bamboo Viscose",
        certifications: &["Oeko-Tex"],
        carbon_footprint: 5.5,
        stock: 60,
    },
    SeedProduct {
        name: "Vegan Leather Tote",
        description: "Durable and stylish tote bag made from apple leather.",
        price: 110.0,
        category: "Accessories",
        image: "https://images.unsplash.com/photo-1548036328-c9fa89d128fa?q=80&w=800",
        materials: "Apple Skin Leather",
        certifications: &["PETA Approved Vegan"],
        carbon_footprint: 8.0,
        stock: 20,
    },
    SeedProduct {
        name: "Eco-Friendly Sneakers",
        description: "Sneakers made from recycled plastic bottles and natural rubber.",
        price: 95.0,
        category: "Footwear",
        image: "https://images.unsplash.com/photo-1560769629-975ec94e6a86?q=80&w=800",
        materials: "Recycled Polyester, Natural Rubber",
        certifications: &["Fair Trade"],
        carbon_footprint: 9.5,
        stock: 35,
    },
    SeedProduct {
        name: "Cork Yoga Mat",
        description: "Non-slip natural cork yoga mat. Antimicrobial and purely sustainable.",
        price: 60.0,
        category: "Accessories",
        image: "https://images.unsplash.com/photo-1592432678016-e910b95255f3?q=80&w=800",
        materials: "Natural Cork, Natural Rubber",
        certifications: &["FSC Certified"],
        carbon_footprint: 4.0,
        stock: 50,
    },
    SeedProduct {
        name: "Upcycled Patchwork Hoodie",
        description: "One-of-a-kind hoodie created from textile scraps to ensure zero waste.",
        price: 90.0,
        category: "Men",
        image: "https://images.unsplash.com/photo-1556905055-8f358a7a47b2?q=80&w=800",
        materials: "Upcycled Cotton Blend",
        certifications: &["Zero Waste Certified"],
        carbon_footprint: 1.5,
        stock: 10,
    },
];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./ecowear.db".to_string());
    let db = Database::open_at(&PathBuf::from(path))?;

    if !db.list_products()?.is_empty() {
        info!("catalog already has listings, nothing to do");
        return Ok(());
    }

    let seller = find_or_create_seller(&db)?;

    for sample in SAMPLE_PRODUCTS {
        let product = Product {
            id: Uuid::new_v4(),
            name: sample.name.to_string(),
            description: sample.description.to_string(),
            price: sample.price,
            category: sample.category.to_string(),
            image: sample.image.to_string(),
            materials: sample.materials.to_string(),
            eco_certifications: sample.certifications.iter().map(|s| s.to_string()).collect(),
            carbon_footprint: sample.carbon_footprint,
            production_process: None,
            stock: sample.stock,
            seller_id: seller.id,
            created_at: Utc::now(),
        };
        db.insert_product(&product)?;
        info!(name = %product.name, "seeded listing");
    }

    info!(count = SAMPLE_PRODUCTS.len(), seller = %seller.email, "catalog seeded");
    Ok(())
}

fn find_or_create_seller(db: &Database) -> anyhow::Result<User> {
    match db.get_user_by_email(SELLER_EMAIL) {
        Ok(user) => Ok(user),
        Err(StoreError::NotFound) => {
            info!("no seed seller found, creating one");
            let seller = User {
                id: Uuid::new_v4(),
                name: "Seed Seller".to_string(),
                email: SELLER_EMAIL.to_string(),
                password_hash: bcrypt::hash("password123", bcrypt::DEFAULT_COST)?,
                role: Role::Seller,
                is_verified: true,
                created_at: Utc::now(),
            };
            db.create_user(&seller)?;
            Ok(seller)
        }
        Err(e) => Err(e.into()),
    }
}
