//! Interactive shell served over HTTP
//!
//! A form collects the course name, the scrape runs on a blocking thread and
//! the result is rendered as HTML with a JSON download.

use anyhow::Result;
use tracing::info;

use crate::playlist::Scraper;

pub mod render;
pub mod server;

pub use server::{router, AppState};

/// Web server wrapping one [`Scraper`]
pub struct WebServer {
    scraper: Scraper,
}

impl WebServer {
    pub fn new(scraper: Scraper) -> Self {
        Self { scraper }
    }

    /// Serve until the process exits
    pub async fn start(self) -> Result<()> {
        let config = self.scraper.config().clone();
        info!("🚀 Starting web shell on port {}", config.server.port);
        server::start_http_server(&config, AppState::new(self.scraper)).await
    }
}
