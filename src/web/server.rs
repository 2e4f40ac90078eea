//! HTTP server for the interactive shell

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::render;
use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::ScrapeResult;
use crate::output::{timestamped_file_name, to_pretty_json};
use crate::playlist::Scraper;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scraper: Scraper,
    /// Finished results keyed by download file name
    pub results: Arc<RwLock<BTreeMap<String, ScrapeResult>>>,
    /// Held until the browser session ends; one session at a time
    pub scrape_lock: Arc<Mutex<()>>,
    pub max_kept_results: usize,
    pub download_prefix: String,
}

impl AppState {
    pub fn new(scraper: Scraper) -> Self {
        let config = scraper.config();
        let max_kept_results = config.server.max_kept_results.max(1);
        let download_prefix = config.output.download_prefix.clone();
        Self {
            scraper,
            results: Arc::new(RwLock::new(BTreeMap::new())),
            scrape_lock: Arc::new(Mutex::new(())),
            max_kept_results,
            download_prefix,
        }
    }

    async fn keep(&self, name: String, result: ScrapeResult) {
        let mut results = self.results.write().await;
        results.insert(name, result);
        // Names sort chronologically; drop the oldest
        while results.len() > self.max_kept_results {
            results.pop_first();
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeForm {
    #[serde(default)]
    pub course_name: String,
}

/// Build the router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/scrape", post(scrape_handler))
        .route("/download/:file", get(download_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Bind and serve until the process exits
pub async fn start_http_server(config: &ScraperConfig, state: AppState) -> Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 Playlist scraper listening on http://{}", address);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn index_handler() -> Html<String> {
    Html(render::form_page("", None))
}

async fn scrape_handler(State(state): State<AppState>, Form(form): Form<ScrapeForm>) -> Response {
    let course_name = form.course_name.trim().to_string();
    if course_name.is_empty() {
        let message = ScrapeError::EmptyCourseName.to_string();
        return (StatusCode::BAD_REQUEST, Html(render::form_page("", Some(&message)))).into_response();
    }

    // The guard moves into the blocking task so a dropped request cannot free the lock early
    let guard = state.scrape_lock.clone().lock_owned().await;
    info!("📝 Scrape requested for '{}'", course_name);

    let result = match state.scraper.scrape_holding(course_name.clone(), guard).await {
        Ok(result) => result,
        Err(e) => {
            warn!("Scrape for '{}' failed: {}", course_name, e);
            let page = render::form_page(&course_name, Some(&e.to_string()));
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response();
        }
    };

    let playlist_json = match to_pretty_json(&result.playlist_info) {
        Ok(json) => json,
        Err(e) => {
            let page = render::form_page(&course_name, Some(&e.to_string()));
            return (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response();
        }
    };

    let name = timestamped_file_name(&state.download_prefix);
    let page = render::results_page(&course_name, &result, &name, &playlist_json);
    state.keep(name, result).await;

    Html(page).into_response()
}

async fn download_handler(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let results = state.results.read().await;
    let Some(result) = results.get(&file) else {
        return (StatusCode::NOT_FOUND, format!("No result named {}", file)).into_response();
    };

    match to_pretty_json(result) {
        Ok(json) => (
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file),
                ),
            ],
            json,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "playlist-scraper",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
