//! Crawl engine scenarios
//!
//! These tests drive whole runs against in-memory fetchers and renderers, so
//! every decision the engine makes is observable without a network.

mod common;

use common::{article, FakeFetcher, FakeLauncher, FakeRender, SEED};
use kb_crawler::config::Config;
use kb_crawler::crawler::{start_crawl, CrawlEngine, HttpFetch, RendererLauncher};
use kb_crawler::{ContentType, RunStatus};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

const BLOG_LISTING: &str = r#"<html><head><title>Blog</title></head><body>
<header><a href="/">Acme</a></header>
<main>
  <h2>Why Users Want Customer-Facing Analytics</h2>
  <p>October 3</p>
  <p>Customers expect dashboards inside the products they already pay for,
  and they notice when those are missing.</p>
  <p><a href="/blog/analytics">Read more</a></p>
  <h2>Brief Overview of the Modern Data Stack</h2>
  <p>July 12</p>
  <p>Warehouses, transformation tools and BI layers each solve one part
  of the larger data problem.</p>
  <p><a href="/blog/data-stack">Read more</a></p>
</main>
</body></html>"#;

fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.base_delay_ms = 0;
    config
}

fn engine(
    config: &Config,
    fetcher: &Arc<FakeFetcher>,
    launcher: Option<&FakeLauncher>,
) -> CrawlEngine {
    let fetcher: Arc<dyn HttpFetch> = fetcher.clone();
    let launcher = launcher.map(|l| Arc::new(l.clone()) as Arc<dyn RendererLauncher>);
    CrawlEngine::new(config, SEED, fetcher, launcher).expect("valid seed")
}

fn titles(outcome: &kb_crawler::CrawlOutcome) -> Vec<&str> {
    outcome.report.items.iter().map(|r| r.title()).collect()
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(
                SEED,
                200,
                article(
                    "Home",
                    &[
                        "/about",
                        "/blog",
                        "/shop/item",
                        "https://other.test/elsewhere",
                        "/docs/guide.pdf",
                    ],
                ),
            )
            .page("https://example.test/about", 200, article("About Us", &[]))
            .page(
                "https://example.test/blog/analytics",
                200,
                article("Customer Analytics", &[]),
            ),
    );
    let launcher = FakeLauncher::new(vec![(
        "https://example.test/blog",
        FakeRender::html(BLOG_LISTING, &["/blog/analytics", "/"]),
    )]);

    let outcome = engine(&test_config(), &fetcher, Some(&launcher)).run().await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(
        titles(&outcome),
        vec![
            "Home",
            "About Us",
            "Why Users Want Customer-Facing Analytics",
            "Brief Overview of the Modern Data Stack",
            "Customer Analytics",
        ]
    );
    assert_eq!(
        outcome.visited,
        vec![
            "https://example.test/",
            "https://example.test/about",
            "https://example.test/blog",
            "https://example.test/blog/analytics",
        ]
    );

    // Listing posts keep the listing page as their source
    assert_eq!(
        outcome.report.items[2].source_url(),
        "https://example.test/blog"
    );

    // Excluded, foreign and rendered-first URLs never hit the static fetcher
    assert_eq!(fetcher.calls_to("https://example.test/shop/item"), 0);
    assert_eq!(fetcher.calls_to("https://example.test/docs/guide.pdf"), 0);
    assert_eq!(fetcher.calls_to("https://example.test/blog"), 0);
    assert!(fetcher.calls().iter().all(|c| c.starts_with(SEED)));

    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert!(launcher.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_page_budget_is_respected() {
    let links = ["/one", "/two", "/three", "/four"];
    let mut fetcher = FakeFetcher::new().page(SEED, 200, article("Home", &links));
    for link in links {
        fetcher = fetcher.page(
            &format!("https://example.test{}", link),
            200,
            article(&format!("Page {}", link), &[]),
        );
    }
    let fetcher = Arc::new(fetcher);

    let mut config = test_config();
    config.crawler.max_pages = 2;
    let outcome = engine(&config, &fetcher, None).run().await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.report.items.len(), 2);
    assert_eq!(outcome.visited.len(), 2);
    assert_eq!(fetcher.calls_to("https://example.test/two"), 0);
}

#[tokio::test]
async fn test_no_url_is_visited_twice() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(
                SEED,
                200,
                article("Home", &["/about", "/about#team", "HTTPS://EXAMPLE.TEST/about"]),
            )
            .page(
                "https://example.test/about",
                200,
                article("About Us", &["/", "/about", "/#top"]),
            ),
    );

    let outcome = engine(&test_config(), &fetcher, None).run().await;

    assert_eq!(outcome.visited.len(), 2);
    assert_eq!(fetcher.calls_to(SEED), 1);
    assert_eq!(fetcher.calls_to("https://example.test/about"), 1);
    assert_eq!(outcome.report.items.len(), 2);
}

#[tokio::test]
async fn test_cancellation_keeps_partial_results() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(SEED, 200, article("Home", &["/about", "/team"]))
            .page("https://example.test/about", 200, article("About Us", &[]))
            .page("https://example.test/team", 200, article("Our Team", &[])),
    );

    let engine = engine(&test_config(), &fetcher, None);
    fetcher.cancel_after(1, engine.progress());
    let outcome = engine.run().await;

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(titles(&outcome), vec!["Home"]);
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_start_crawl_runs_in_background() {
    let fetcher: Arc<dyn HttpFetch> =
        Arc::new(FakeFetcher::new().page(SEED, 200, article("Home", &[])));

    let handle = start_crawl(&test_config(), SEED, fetcher, None).unwrap();
    let progress = handle.progress_handle();
    let outcome = handle.join().await.unwrap();

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.report.site, SEED);
    let snapshot = progress.snapshot();
    assert_eq!(snapshot.visited_count, 1);
    assert_eq!(snapshot.result_count, 1);
    assert!(!snapshot.running);
}

#[tokio::test]
async fn test_start_crawl_reports_running_immediately() {
    let fetcher: Arc<dyn HttpFetch> =
        Arc::new(FakeFetcher::new().page(SEED, 200, article("Home", &[])));

    // The current-thread runtime has not polled the run yet
    let handle = start_crawl(&test_config(), SEED, fetcher, None).unwrap();
    assert!(handle.progress().running);

    let outcome = handle.join().await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
}

#[test]
fn test_start_crawl_rejects_invalid_seed() {
    let fetcher: Arc<dyn HttpFetch> = Arc::new(FakeFetcher::new());
    assert!(start_crawl(&test_config(), "mailto:someone@example.test", fetcher, None).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_rate_limited_page_is_abandoned_with_backoff() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(SEED, 200, article("Home", &["/busy", "/about"]))
            .page("https://example.test/busy", 429, "Too Many Requests")
            .page("https://example.test/about", 200, article("About Us", &[])),
    );

    let mut config = test_config();
    config.crawler.base_delay_ms = 1000;

    let start = tokio::time::Instant::now();
    let outcome = engine(&config, &fetcher, None).run().await;

    assert_eq!(fetcher.calls_to("https://example.test/busy"), 3);
    assert_eq!(titles(&outcome), vec!["Home", "About Us"]);
    assert!(outcome
        .visited
        .contains(&"https://example.test/busy".to_string()));
    // Backoffs of 1s, 2s and 4s on top of the regular spacing
    assert!(start.elapsed() >= Duration::from_secs(7));
}

#[tokio::test]
async fn test_forbidden_page_uses_rendered_bypass() {
    let fetcher = Arc::new(FakeFetcher::new().page(SEED, 403, "Forbidden"));
    let launcher = FakeLauncher::new(vec![(
        SEED,
        FakeRender::html(article("Rendered Home", &[]), &[]),
    )]);

    let outcome = engine(&test_config(), &fetcher, Some(&launcher)).run().await;

    assert_eq!(titles(&outcome), vec!["Rendered Home"]);
    assert_eq!(fetcher.calls_to(SEED), 1);
    assert_eq!(launcher.navigations(), vec![SEED]);
}

#[tokio::test]
async fn test_forbidden_page_without_renderer_is_abandoned() {
    let fetcher = Arc::new(FakeFetcher::new().page(SEED, 403, "Forbidden"));

    let outcome = engine(&test_config(), &fetcher, None).run().await;

    // One attempt plus one per identity rotation
    assert_eq!(fetcher.calls_to(SEED), 3);
    assert!(outcome.report.is_empty());
    assert_eq!(outcome.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_script_shell_falls_back_to_renderer() {
    let shell = r#"<html><head><title>App</title></head><body>
        <noscript>You need to enable JavaScript to run this app.</noscript>
        <div id="root"></div>
        <a href="/pricing">Pricing</a>
        </body></html>"#;
    let fetcher = Arc::new(FakeFetcher::new().page(SEED, 200, shell));
    let launcher = FakeLauncher::new(vec![(
        SEED,
        FakeRender {
            title: Some("App Home".to_string()),
            text: "The rendered application explains what the product does in plenty of words."
                .to_string(),
            ..FakeRender::default()
        },
    )]);

    let outcome = engine(&test_config(), &fetcher, Some(&launcher)).run().await;

    assert_eq!(titles(&outcome), vec!["App Home"]);
    assert_eq!(launcher.navigations(), vec![SEED]);
    // Links found in the static shell are still followed
    assert!(outcome
        .visited
        .contains(&"https://example.test/pricing".to_string()));
}

#[tokio::test]
async fn test_render_timeout_falls_back_to_static() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(SEED, 200, article("Home", &["/blog"]))
            .page("https://example.test/blog", 200, article("Blog", &[])),
    );
    let launcher = FakeLauncher::new(vec![("https://example.test/blog", FakeRender::timeout())]);

    let outcome = engine(&test_config(), &fetcher, Some(&launcher)).run().await;

    assert_eq!(titles(&outcome), vec!["Home", "Blog"]);
    assert_eq!(fetcher.calls_to("https://example.test/blog"), 1);
}

#[tokio::test]
async fn test_script_heavy_host_is_rendered_first() {
    let fetcher = Arc::new(FakeFetcher::new());
    let launcher = FakeLauncher::new(vec![(
        "https://acme.webflow.io/",
        FakeRender::html(article("Acme", &[]), &[]),
    )]);
    let launcher: Arc<dyn RendererLauncher> = Arc::new(launcher);

    let outcome = CrawlEngine::new(
        &test_config(),
        "https://acme.webflow.io/",
        fetcher.clone(),
        Some(launcher),
    )
    .unwrap()
    .run()
    .await;

    assert_eq!(titles(&outcome), vec!["Acme"]);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_required_renderer_failure_fails_run() {
    let fetcher = Arc::new(FakeFetcher::new().page(SEED, 200, article("Home", &[])));
    let launcher = FakeLauncher::failing();

    let mut config = test_config();
    config.renderer.required = true;
    let outcome = engine(&config, &fetcher, Some(&launcher)).run().await;

    assert_eq!(outcome.status, RunStatus::Failed);
    assert!(outcome.report.is_empty());
    assert!(outcome.visited.is_empty());
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_cancelled_run_closes_renderer() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(SEED, 200, article("Home", &["/about"]))
            .page("https://example.test/about", 200, article("About Us", &[])),
    );
    let launcher = FakeLauncher::new(vec![]);

    let mut config = test_config();
    config.renderer.required = true;
    let engine = engine(&config, &fetcher, Some(&launcher));
    fetcher.cancel_after(1, engine.progress());
    let outcome = engine.run().await;

    assert_eq!(outcome.status, RunStatus::Cancelled);
    assert_eq!(titles(&outcome), vec!["Home"]);
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    assert!(launcher.closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_optional_renderer_failure_is_tried_once() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(SEED, 200, article("Home", &["/blog", "/news/blog"]))
            .page("https://example.test/blog", 200, article("Blog", &[]))
            .page("https://example.test/news/blog", 200, article("News Blog", &[])),
    );
    let launcher = FakeLauncher::failing();

    let outcome = engine(&test_config(), &fetcher, Some(&launcher)).run().await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(titles(&outcome), vec!["Home", "Blog", "News Blog"]);
    assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_block_pages_are_not_recorded() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(SEED, 200, article("Home", &["/gone"]))
            .page(
                "https://example.test/gone",
                200,
                "<html><head><title>404 Page Not Found</title></head><body><main>\
                 <p>Sorry, the page you were looking for has moved somewhere else entirely.</p>\
                 </main></body></html>",
            ),
    );

    let outcome = engine(&test_config(), &fetcher, None).run().await;

    assert_eq!(titles(&outcome), vec!["Home"]);
    assert_eq!(outcome.visited.len(), 2);
}

#[tokio::test]
async fn test_records_are_classified() {
    let fetcher = Arc::new(
        FakeFetcher::new()
            .page(SEED, 200, article("Home", &["/blog/launch-week"]))
            .page(
                "https://example.test/blog/launch-week",
                200,
                article("Launch Week Recap", &[]),
            ),
    );

    let outcome = engine(&test_config(), &fetcher, None).run().await;

    assert_eq!(outcome.report.items.len(), 2);
    assert_eq!(outcome.report.items[1].content_type(), ContentType::Blog);
}
