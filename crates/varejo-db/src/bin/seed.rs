//! # Seed Data Generator
//!
//! Populates the database with catalog data for development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./varejo.db)
//! cargo run -p varejo-db --bin seed
//!
//! # Specify database path
//! cargo run -p varejo-db --bin seed -- --db ./data/varejo.db
//!
//! # Custom product count
//! cargo run -p varejo-db --bin seed -- --count 50
//! ```
//!
//! ## Generated Catalog
//! Creates apparel products, each with size variants, and runs a restock
//! through the real restock service so every variant gets stock, an
//! inventory-log entry, a product cost basis, and a treasury expense row -
//! the same write path production uses.

use std::env;

use varejo_core::RestockTarget;
use varejo_db::{Database, DbConfig};

/// Base garments for the generated catalog.
const GARMENTS: &[(&str, i64)] = &[
    ("Camiseta Básica", 4990),
    ("Camiseta Estampada", 5990),
    ("Camisa Polo", 8990),
    ("Calça Jeans", 14990),
    ("Bermuda Sarja", 9990),
    ("Vestido Midi", 12990),
    ("Jaqueta Corta-Vento", 19990),
    ("Moletom Canguru", 11990),
    ("Saia Plissada", 8490),
    ("Meia Kit 3", 2490),
];

const COLORS: &[&str] = &["Preto", "Branco", "Azul", "Vermelho"];
const SIZES: &[&str] = &["P", "M", "G", "GG"];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./varejo.db".to_string());
    let count: usize = arg_value(&args, "--count")
        .and_then(|v| v.parse().ok())
        .unwrap_or(GARMENTS.len());

    println!("Seeding {count} products into {db_path}");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .expect("failed to open database");

    let products = db.products();
    let restock = db.restock();

    let mut variants_created = 0usize;

    for index in 0..count {
        let (garment, price_cents) = GARMENTS[index % GARMENTS.len()];
        let color = COLORS[index % COLORS.len()];
        let name = format!("{garment} {color}");

        let product = products
            .create_product(&name, Some("seeded"))
            .await
            .expect("failed to create product");

        for (size_index, size) in SIZES.iter().enumerate() {
            let sku = format!("SEED-{:03}-{}", index, size);

            // Restock through the real service: variant creation, stock,
            // movement log, cost basis, and the expense entry in one shot.
            let quantity = 5 + ((index + size_index) % 20) as i64;
            let unit_cost = price_cents / 2;

            restock
                .restock(
                    RestockTarget::NewVariant {
                        product_id: product.id.clone(),
                        sku,
                        name: format!("{name} {size}"),
                        price_cents,
                        min_stock: 3,
                    },
                    quantity,
                    unit_cost,
                )
                .await
                .expect("failed to restock seeded variant");

            variants_created += 1;
        }
    }

    println!("Seeded {count} products / {variants_created} variants");

    db.close().await;
}

/// Returns the value following a `--flag` argument.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
