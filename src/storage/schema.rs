//! Database schema definitions
//!
//! This module contains the SQL schema for the product database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs and their final counters
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    categories_finished INTEGER NOT NULL DEFAULT 0,
    categories_skipped INTEGER NOT NULL DEFAULT 0,
    pages_requested INTEGER NOT NULL DEFAULT 0,
    page_retries INTEGER NOT NULL DEFAULT 0,
    pages_exhausted INTEGER NOT NULL DEFAULT 0,
    products_dispatched INTEGER NOT NULL DEFAULT 0,
    products_accepted INTEGER NOT NULL DEFAULT 0,
    products_rejected INTEGER NOT NULL DEFAULT 0,
    duplicates_skipped INTEGER NOT NULL DEFAULT 0,
    sink_failures INTEGER NOT NULL DEFAULT 0,
    render_failures INTEGER NOT NULL DEFAULT 0
);

-- One row per product URL; the first stored record wins
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    price TEXT NOT NULL,
    images TEXT NOT NULL,
    category TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    run_id INTEGER REFERENCES runs(id)
);

CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
