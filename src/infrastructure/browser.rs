//! Browser session used to render listing pages
//!
//! The listing grid is filled in by JavaScript, so pages are rendered in a
//! real browser through WebDriver. Only the page loop talks to the session;
//! entry workers receive plain extracted data.

use std::time::Duration;

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::error::{HarvestError, HarvestResult};
pub use crate::infrastructure::config::BrowserConfig;

/// Renders a listing page and hands back its DOM once results are present
#[async_trait]
pub trait PageRenderer: Send {
    /// Load `url`, wait up to `ready_timeout` for `ready_selector`, return the rendered HTML
    async fn render(&mut self, url: &str, ready_selector: &str, ready_timeout: Duration) -> HarvestResult<String>;

    /// Release the session; further renders fail
    async fn close(&mut self) -> HarvestResult<()>;
}

/// Chrome session driven through a WebDriver endpoint (chromedriver)
pub struct WebDriverSession {
    client: Option<Client>,
    page_load_timeout: Duration,
}

impl WebDriverSession {
    pub async fn connect(config: &BrowserConfig) -> HarvestResult<Self> {
        let mut args: Vec<String> = config.chrome_args.clone();
        if config.headless {
            args.push("--headless=new".to_string());
        }

        let mut capabilities = Map::new();
        capabilities.insert("browserName".to_string(), Value::from("chrome"));
        capabilities.insert("goog:chromeOptions".to_string(), json!({ "args": args }));

        info!(webdriver = %config.webdriver_url, headless = config.headless, "Connecting to WebDriver");
        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to start session at {}: {e}", config.webdriver_url)))?;

        Ok(Self {
            client: Some(client),
            page_load_timeout: Duration::from_secs(config.page_load_timeout_seconds),
        })
    }

    fn client(&self) -> HarvestResult<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| HarvestError::Browser("session already closed".to_string()))
    }
}

#[async_trait]
impl PageRenderer for WebDriverSession {
    async fn render(&mut self, url: &str, ready_selector: &str, ready_timeout: Duration) -> HarvestResult<String> {
        let client = self.client()?;

        match tokio::time::timeout(self.page_load_timeout, client.goto(url)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(HarvestError::PageLoad { url: url.to_string(), reason: e.to_string() }),
            Err(_) => {
                return Err(HarvestError::PageLoad {
                    url: url.to_string(),
                    reason: format!("no response within {}s", self.page_load_timeout.as_secs()),
                });
            }
        }

        if let Err(e) = client
            .wait()
            .at_most(ready_timeout)
            .for_element(Locator::Css(ready_selector))
            .await
        {
            debug!(url, error = %e, "Ready selector never appeared");
            return Err(HarvestError::ReadyTimeout { url: url.to_string(), seconds: ready_timeout.as_secs() });
        }

        client
            .source()
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to read page source for {url}: {e}")))
    }

    async fn close(&mut self) -> HarvestResult<()> {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close().await {
                warn!(error = %e, "Failed to close WebDriver session cleanly");
                return Err(HarvestError::Browser(e.to_string()));
            }
            info!("WebDriver session closed");
        }
        Ok(())
    }
}
