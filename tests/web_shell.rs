#![cfg(feature = "web")]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use playlist_scraper::browser::{BrowserPage, PageLauncher, SnapshotLauncher};
use playlist_scraper::error::BrowserResult;
use playlist_scraper::config::{ConfigBuilder, TimingConfig};
use playlist_scraper::models::ScrapeResult;
use playlist_scraper::playlist::Scraper;
use playlist_scraper::web::{router, AppState};

const SEARCH_HTML: &str = include_str!("fixtures/search.html");
const PLAYLIST_HTML: &str = include_str!("fixtures/playlist.html");

fn app_with(search_html: &str) -> (Router, AppState) {
    let config = ConfigBuilder::new().with_timing(TimingConfig::instant()).build();
    let scraper = Scraper::new(
        Arc::new(config),
        Arc::new(SnapshotLauncher::new(search_html, PLAYLIST_HTML)),
    );
    let state = AppState::new(scraper);
    (router(state.clone()), state)
}

/// Launcher whose launches take a while and that tracks how many overlap
struct SlowLauncher {
    inner: SnapshotLauncher,
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    launches: AtomicUsize,
}

impl SlowLauncher {
    fn new(delay: Duration) -> Self {
        Self {
            inner: SnapshotLauncher::new(SEARCH_HTML, PLAYLIST_HTML),
            delay,
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            launches: AtomicUsize::new(0),
        }
    }
}

impl PageLauncher for SlowLauncher {
    fn launch(&self) -> BrowserResult<Box<dyn BrowserPage>> {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);
        self.launches.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.inner.launch()
    }
}

fn scrape_request(course_name: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scrape")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "course_name={}",
            urlencoding::encode(course_name)
        )))
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_serves_form() {
    let (app, _) = app_with(SEARCH_HTML);
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="course_name""#));
    assert!(html.contains("Scrape Playlist"));
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app_with(SEARCH_HTML);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_scrape_renders_results_and_download() {
    let (app, state) = app_with(SEARCH_HTML);

    let response = app.clone().oneshot(scrape_request("Rust programming")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("Scraping complete!"));
    assert!(html.contains("Rustacean Academy"));
    assert!(html.contains("<summary>Ownership and Borrowing</summary>"));
    assert!(html.contains("<summary>Lifetimes Explained</summary>"));
    assert!(!html.contains("Course Trailer"));
    assert!(html.contains("<strong>Views</strong>: N/A"));
    assert!(html.contains(r#"width="320""#));

    let name = state.results.read().await.keys().next().cloned().unwrap();
    assert!(name.starts_with("youtube_playlist_") && name.ends_with(".json"));
    assert!(html.contains(&format!("/download/{}", name)));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/download/{}", name))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains(&name));

    let json = body_text(response).await;
    assert!(json.contains("\n    \"playlist_info\""));
    let result: ScrapeResult = serde_json::from_str(&json).unwrap();
    assert_eq!(result.videos.len(), 2);
}

#[tokio::test]
async fn test_empty_course_name_is_an_inline_error() {
    let (app, state) = app_with(SEARCH_HTML);
    let response = app.oneshot(scrape_request("   ")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("Error: Course name must not be empty"));
    assert!(state.results.read().await.is_empty());
}

#[tokio::test]
async fn test_scrape_failure_is_an_inline_error() {
    let (app, _) = app_with("<html><body></body></html>");
    let response = app.oneshot(scrape_request("Rust programming")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let html = body_text(response).await;
    assert!(html.contains("Error: No playlist found"));
    assert!(html.contains(r#"value="Rust programming""#));
}

#[tokio::test]
async fn test_unknown_download_is_not_found() {
    let (app, _) = app_with(SEARCH_HTML);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/download/youtube_playlist_20000101_000000.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dropped_request_keeps_scrape_lock_until_session_ends() {
    let launcher = Arc::new(SlowLauncher::new(Duration::from_millis(400)));
    let config = ConfigBuilder::new().with_timing(TimingConfig::instant()).build();
    let scraper = Scraper::new(Arc::new(config), launcher.clone());
    let app = router(AppState::new(scraper));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        app.clone().oneshot(scrape_request("Rust programming")),
    )
    .await;
    assert!(abandoned.is_err());

    let response = app.oneshot(scrape_request("Rust programming")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(launcher.launches.load(Ordering::SeqCst), 2);
    assert_eq!(launcher.peak.load(Ordering::SeqCst), 1);
}
