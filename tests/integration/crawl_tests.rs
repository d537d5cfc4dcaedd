//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the Splash render service and
//! test the full crawl cycle end-to-end against a temporary SQLite database.

use catalog_crawler::config::{
    CategoryEntry, Config, CrawlerConfig, ExtractionConfig, OutputConfig, RendererConfig,
    UserAgentConfig,
};
use catalog_crawler::crawler::{crawl, Coordinator};
use catalog_crawler::render::{RenderOptions, RenderOutcome, Renderer};
use catalog_crawler::storage::{open_sink, ProductSink, SqliteSink, UpsertOutcome};
use catalog_crawler::ProductRecord;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHOP: &str = "https://shop.example.com";

fn category(name: &str) -> String {
    format!("{}/category/{}", SHOP, name)
}

fn product(slug: &str) -> String {
    format!("{}/product/{}", SHOP, slug)
}

fn listing_html(products: &[&str], has_next: bool) -> String {
    let mut html = String::from("<html><body><div class=\"grid\">");
    for slug in products {
        html.push_str(&format!(
            r#"<a href="/product/{0}"><img src="/product/{0}-thumb.jpg"></a><a href="/product/{0}">{0}</a>"#,
            slug
        ));
    }
    html.push_str("</div>");
    if has_next {
        html.push_str(r#"<ul class="pagination"><li><a href="?page=2">Next</a></li></ul>"#);
    }
    html.push_str("</body></html>");
    html
}

fn product_html(title: &str, amount: &str) -> String {
    format!(
        r#"<html><head><title>{title} | Online Shopping</title></head><body>
           <h1>{title}</h1>
           <div class="price"><span style="font-family: naira-icons">₦</span>{amount}</div>
           <img src="https://img.example.com/product/{title}-1.jpg">
           <img src="https://img.example.com/product/{title}-1.jpg">
           <img src="https://img.example.com/product/{title}-2.jpg">
           <img src="https://img.example.com/banner.jpg">
           </body></html>"#
    )
}

/// Creates a test configuration pointing at the given render endpoint
fn create_test_config(endpoint: &str, categories: &[(&str, bool)], db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            wait_seconds: 0.0,
            request_delay_ms: 0,
            ..CrawlerConfig::default()
        },
        renderer: RendererConfig {
            endpoint: endpoint.to_string(),
            timeout_secs: 5,
        },
        user_agent: UserAgentConfig {
            agents: vec!["TestAgent/1.0".to_string(), "TestAgent/2.0".to_string()],
        },
        extraction: ExtractionConfig::default(),
        output: OutputConfig {
            database_path: db_path.to_string_lossy().to_string(),
        },
        categories: categories
            .iter()
            .map(|(name, skip)| CategoryEntry {
                url: category(name),
                skip: *skip,
            })
            .collect(),
    }
}

/// Serves `html` for every render request whose target is `url`
async fn mount_page(server: &MockServer, url: &str, html: String) {
    Mock::given(method("POST"))
        .and(path("/render.html"))
        .and(body_partial_json(json!({ "url": url })))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

fn stored(db_path: &Path) -> HashMap<String, ProductRecord> {
    let sink = SqliteSink::open(db_path).unwrap();
    sink.load_products()
        .unwrap()
        .into_iter()
        .map(|p| (p.product_url.clone(), p))
        .collect()
}

#[tokio::test]
async fn test_full_crawl_against_render_service() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("products.db");

    mount_page(&server, &category("phones"), listing_html(&["p1", "p2"], true)).await;
    mount_page(
        &server,
        &format!("{}?page=2", category("phones")),
        listing_html(&["p3"], false),
    )
    .await;
    mount_page(&server, &category("laptops"), listing_html(&["p2", "l1"], false)).await;
    for (slug, amount) in [("p1", "12,500"), ("p2", "99,000"), ("p3", "1,250,000"), ("l1", "450")] {
        mount_page(&server, &product(slug), product_html(slug, amount)).await;
    }

    let config = create_test_config(
        &server.uri(),
        &[("phones", false), ("tablets", true), ("laptops", false)],
        &db_path,
    );
    let summary = crawl(config, "integration-hash").await.unwrap();

    assert_eq!(summary.categories_finished, 2);
    assert_eq!(summary.categories_skipped, 1);
    assert_eq!(summary.pages_requested, 3);
    assert_eq!(summary.products_dispatched, 4);
    assert_eq!(summary.products_accepted, 4);

    let products = stored(&db_path);
    assert_eq!(products.len(), 4);

    let p1 = &products[&product("p1")];
    assert_eq!(p1.title, "p1");
    assert_eq!(p1.price, "₦12,500");
    assert_eq!(p1.category, category("phones"));
    assert_eq!(
        p1.images,
        vec![
            "https://img.example.com/product/p1-1.jpg".to_string(),
            "https://img.example.com/product/p1-2.jpg".to_string(),
        ]
    );

    // p2 is listed by both categories; the first one wins
    assert_eq!(products[&product("p2")].category, category("phones"));
    assert_eq!(products[&product("p3")].price, "₦1,250,000");
    assert_eq!(products[&product("l1")].category, category("laptops"));

    // The skipped category never reached the render service
    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !String::from_utf8_lossy(&r.body).contains("/category/tablets")));

    let sink = open_sink(&db_path).unwrap();
    let runs = sink.recent_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].config_hash, "integration-hash");
    assert_eq!(runs[0].summary, summary);
}

#[tokio::test]
async fn test_render_service_errors_are_retried() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("products.db");

    // First attempt at the listing gets a 504 from the render service
    Mock::given(method("POST"))
        .and(path("/render.html"))
        .and(body_partial_json(json!({ "url": category("phones") })))
        .respond_with(ResponseTemplate::new(504))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, &category("phones"), listing_html(&["p1"], false)).await;
    mount_page(&server, &product("p1"), product_html("p1", "12,500")).await;

    let config = create_test_config(&server.uri(), &[("phones", false)], &db_path);
    let summary = crawl(config, "hash").await.unwrap();

    assert_eq!(summary.render_failures, 1);
    assert_eq!(summary.page_retries, 1);
    assert_eq!(summary.pages_requested, 2);
    assert_eq!(stored(&db_path).len(), 1);
}

#[tokio::test]
async fn test_unavailable_products_are_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("products.db");

    mount_page(&server, &category("phones"), listing_html(&["ok", "gone", "free"], false)).await;
    mount_page(&server, &product("ok"), product_html("ok", "5,000")).await;
    Mock::given(method("POST"))
        .and(path("/render.html"))
        .and(body_partial_json(json!({ "url": product("gone") })))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not found</html>"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        &product("free"),
        "<html><head><title>Free thing | Shop</title></head><body>Out of stock</body></html>"
            .to_string(),
    )
    .await;

    let config = create_test_config(&server.uri(), &[("phones", false)], &db_path);
    let summary = crawl(config, "hash").await.unwrap();

    assert_eq!(summary.products_accepted, 1);
    assert_eq!(summary.products_rejected, 2);
    assert_eq!(
        stored(&db_path).keys().cloned().collect::<Vec<_>>(),
        vec![product("ok")]
    );
}

/// Renderer that answers from a fixed page map
struct StaticRenderer {
    pages: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl StaticRenderer {
    fn new(pages: &[(String, String)]) -> Self {
        Self {
            pages: pages.iter().cloned().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl Renderer for StaticRenderer {
    async fn render(&self, url: &str, _options: RenderOptions) -> RenderOutcome {
        self.calls.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(html) => RenderOutcome::Success {
                html: html.clone(),
                final_url: url.to_string(),
                status_code: 200,
            },
            None => RenderOutcome::Failure {
                cause: "connection refused".to_string(),
            },
        }
    }
}

#[tokio::test]
async fn test_second_run_keeps_first_records() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("products.db");
    let config = create_test_config("http://localhost:8050", &[("phones", false)], &db_path);

    let first = Arc::new(StaticRenderer::new(&[
        (category("phones"), listing_html(&["p1"], false)),
        (product("p1"), product_html("p1", "12,500")),
    ]));
    let coordinator =
        Coordinator::new(&config, first, SqliteSink::open(&db_path).unwrap(), "h1").unwrap();
    coordinator.run().await.unwrap();

    // Same URL, new price: the stored record is not overwritten
    let second = Arc::new(StaticRenderer::new(&[
        (category("phones"), listing_html(&["p1"], false)),
        (product("p1"), product_html("p1", "15,000")),
    ]));
    let coordinator =
        Coordinator::new(&config, second, SqliteSink::open(&db_path).unwrap(), "h2").unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.products_accepted, 1);
    assert_eq!(summary.duplicates_skipped, 1);

    let products = stored(&db_path);
    assert_eq!(products.len(), 1);
    assert_eq!(products[&product("p1")].price, "₦12,500");

    let sink = open_sink(&db_path).unwrap();
    assert_eq!(sink.recent_runs(5).unwrap().len(), 2);
}

#[tokio::test]
async fn test_pagination_stops_when_next_link_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("products.db");
    let config = create_test_config("http://localhost:8050", &[("phones", false)], &db_path);

    let renderer = Arc::new(StaticRenderer::new(&[
        (category("phones"), listing_html(&["p1"], true)),
        (
            format!("{}?page=2", category("phones")),
            listing_html(&["p2"], false),
        ),
        (
            format!("{}?page=3", category("phones")),
            listing_html(&["p3"], false),
        ),
        (product("p1"), product_html("p1", "1,000")),
        (product("p2"), product_html("p2", "2,000")),
        (product("p3"), product_html("p3", "3,000")),
    ]));

    let coordinator = Coordinator::new(
        &config,
        renderer.clone(),
        SqliteSink::open(&db_path).unwrap(),
        "hash",
    )
    .unwrap();
    coordinator.run().await.unwrap();

    let calls = renderer.calls.lock().unwrap().clone();
    assert!(!calls.contains(&format!("{}?page=3", category("phones"))));
    assert_eq!(stored(&db_path).len(), 2);
}

#[test]
fn test_sink_upsert_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let mut sink = SqliteSink::open(&dir.path().join("products.db")).unwrap();

    let record = ProductRecord {
        title: "Phone".to_string(),
        price: "₦1,000".to_string(),
        product_url: product("p1"),
        images: vec![],
        category: category("phones"),
    };
    let renamed = ProductRecord {
        title: "Phone v2".to_string(),
        ..record.clone()
    };

    assert_eq!(sink.upsert(&record).unwrap(), UpsertOutcome::Inserted);
    assert_eq!(sink.upsert(&renamed).unwrap(), UpsertOutcome::DuplicateSkipped);
    assert_eq!(sink.load_products().unwrap(), vec![record]);
    sink.close().unwrap();
}
