//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProductSink trait,
//! plus the read queries behind `--stats` and `--export`.

use crate::crawler::ProductRecord;
use crate::state::RunSummary;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ProductSink, StorageError, StorageResult, UpsertOutcome};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite product sink
pub struct SqliteSink {
    conn: Connection,
    run_id: Option<i64>,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn, run_id: None })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn, run_id: None })
    }

    /// Total number of stored products
    pub fn count_products(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Stored products per category URL, largest first
    pub fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT category, COUNT(*) AS n FROM products GROUP BY category ORDER BY n DESC, category",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// The most recent runs, newest first
    pub fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, status,
                    categories_finished, categories_skipped, pages_requested, page_retries,
                    pages_exhausted, products_dispatched, products_accepted, products_rejected,
                    duplicates_skipped, sink_failures, render_failures
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], |row| {
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    config_hash: row.get(3)?,
                    status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                        .unwrap_or(RunStatus::Running),
                    summary: RunSummary {
                        categories_finished: row.get::<_, i64>(5)? as u64,
                        categories_skipped: row.get::<_, i64>(6)? as u64,
                        pages_requested: row.get::<_, i64>(7)? as u64,
                        page_retries: row.get::<_, i64>(8)? as u64,
                        pages_exhausted: row.get::<_, i64>(9)? as u64,
                        products_dispatched: row.get::<_, i64>(10)? as u64,
                        products_accepted: row.get::<_, i64>(11)? as u64,
                        products_rejected: row.get::<_, i64>(12)? as u64,
                        duplicates_skipped: row.get::<_, i64>(13)? as u64,
                        sink_failures: row.get::<_, i64>(14)? as u64,
                        render_failures: row.get::<_, i64>(15)? as u64,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    /// All stored products in insertion order
    pub fn load_products(&self) -> StorageResult<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT title, price, product_url, images, category FROM products ORDER BY id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut products = Vec::with_capacity(rows.len());
        for (title, price, product_url, images, category) in rows {
            products.push(ProductRecord {
                title,
                price,
                product_url,
                images: serde_json::from_str(&images)?,
                category,
            });
        }

        Ok(products)
    }
}

impl ProductSink for SqliteSink {
    fn begin_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        let run_id = self.conn.last_insert_rowid();
        self.run_id = Some(run_id);
        Ok(run_id)
    }

    fn upsert(&mut self, record: &ProductRecord) -> StorageResult<UpsertOutcome> {
        let images = serde_json::to_string(&record.images)?;
        let now = Utc::now().to_rfc3339();

        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO products (product_url, title, price, images, category, scraped_at, run_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.product_url,
                record.title,
                record.price,
                images,
                record.category,
                now,
                self.run_id
            ],
        )?;

        if changed == 0 {
            Ok(UpsertOutcome::DuplicateSkipped)
        } else {
            Ok(UpsertOutcome::Inserted)
        }
    }

    fn finish_run(&mut self, run_id: i64, summary: &RunSummary) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET finished_at = ?1, status = ?2,
                categories_finished = ?3, categories_skipped = ?4, pages_requested = ?5,
                page_retries = ?6, pages_exhausted = ?7, products_dispatched = ?8,
                products_accepted = ?9, products_rejected = ?10, duplicates_skipped = ?11,
                sink_failures = ?12, render_failures = ?13
             WHERE id = ?14",
            params![
                now,
                RunStatus::Completed.to_db_string(),
                summary.categories_finished as i64,
                summary.categories_skipped as i64,
                summary.pages_requested as i64,
                summary.page_retries as i64,
                summary.pages_exhausted as i64,
                summary.products_dispatched as i64,
                summary.products_accepted as i64,
                summary.products_rejected as i64,
                summary.duplicates_skipped as i64,
                summary.sink_failures as i64,
                summary.render_failures as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn close(self) -> StorageResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| StorageError::Database(format!("Failed to close database: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(url: &str, title: &str) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            price: "₦12,500".to_string(),
            product_url: url.to_string(),
            images: vec!["https://img.example.com/product/a.jpg".to_string()],
            category: "https://shop.example.com/category/phones".to_string(),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let sink = SqliteSink::open_in_memory();
        assert!(sink.is_ok());
    }

    #[test]
    fn test_begin_run() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let run_id = sink.begin_run("test_hash").unwrap();
        assert!(run_id > 0);
    }

    #[test]
    fn test_upsert_inserts() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.begin_run("test_hash").unwrap();

        let outcome = sink
            .upsert(&record("https://shop.example.com/product/a", "Phone A"))
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(sink.count_products().unwrap(), 1);
    }

    #[test]
    fn test_first_write_wins() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.begin_run("test_hash").unwrap();

        let url = "https://shop.example.com/product/a";
        sink.upsert(&record(url, "Phone A")).unwrap();
        let outcome = sink.upsert(&record(url, "Phone A (renamed)")).unwrap();

        assert_eq!(outcome, UpsertOutcome::DuplicateSkipped);
        let products = sink.load_products().unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].title, "Phone A");
    }

    #[test]
    fn test_images_roundtrip_as_json() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let mut product = record("https://shop.example.com/product/b", "Phone B");
        product.images = vec![
            "https://img.example.com/product/b1.jpg".to_string(),
            "https://img.example.com/product/b2.jpg".to_string(),
        ];
        sink.upsert(&product).unwrap();

        let loaded = sink.load_products().unwrap();
        assert_eq!(loaded, vec![product]);
    }

    #[test]
    fn test_upsert_without_run() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let outcome = sink
            .upsert(&record("https://shop.example.com/product/a", "Phone A"))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
    }

    #[test]
    fn test_count_by_category() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.upsert(&record("https://shop.example.com/product/a", "A"))
            .unwrap();
        sink.upsert(&record("https://shop.example.com/product/b", "B"))
            .unwrap();
        let mut other = record("https://shop.example.com/product/c", "C");
        other.category = "https://shop.example.com/category/laptops".to_string();
        sink.upsert(&other).unwrap();

        let counts = sink.count_by_category().unwrap();
        assert_eq!(
            counts,
            vec![
                ("https://shop.example.com/category/phones".to_string(), 2),
                ("https://shop.example.com/category/laptops".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_finish_run_records_summary() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let run_id = sink.begin_run("abc123").unwrap();

        let summary = RunSummary {
            categories_finished: 2,
            products_accepted: 7,
            duplicates_skipped: 1,
            ..RunSummary::default()
        };
        sink.finish_run(run_id, &summary).unwrap();

        let runs = sink.recent_runs(5).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Completed);
        assert_eq!(runs[0].config_hash, "abc123");
        assert!(runs[0].finished_at.is_some());
        assert_eq!(runs[0].summary, summary);
    }

    #[test]
    fn test_finish_unknown_run() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let result = sink.finish_run(42, &RunSummary::default());
        assert!(matches!(result, Err(StorageError::RunNotFound(42))));
    }

    #[test]
    fn test_recent_runs_newest_first() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        let first = sink.begin_run("one").unwrap();
        let second = sink.begin_run("two").unwrap();

        let runs = sink.recent_runs(10).unwrap();
        assert_eq!(runs.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second, first]);

        let runs = sink.recent_runs(1).unwrap();
        assert_eq!(runs.len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("products.db");

        let mut sink = SqliteSink::open(&path).unwrap();
        sink.upsert(&record("https://shop.example.com/product/a", "A"))
            .unwrap();
        sink.close().unwrap();

        let mut sink = SqliteSink::open(&path).unwrap();
        let outcome = sink
            .upsert(&record("https://shop.example.com/product/a", "A again"))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::DuplicateSkipped);
        assert_eq!(sink.count_products().unwrap(), 1);
    }
}
