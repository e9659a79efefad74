use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;

/// Cookie banners and "show more" toggles that hide rows on first render.
const EXPAND_SELECTORS: &[&str] = &[
    "#onetrust-accept-btn-handler",
    ".cookie-consent button",
    ".load-more",
    "a.more",
];

const LISTING_SELECTOR: &str = "table";
const CLICK_PROBE: Duration = Duration::from_millis(500);
const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum PageSourceError {
    #[error("browser operation failed: {0}")]
    Browser(String),
    #[error("failed to read saved page {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Produces the rendered HTML of the listings page.
pub trait PageSource: Debug {
    fn fetch_html(&self, url: &str) -> Result<String, PageSourceError>;
}

/// Drives a headless Chrome instance through the listings page.
#[derive(Debug, Clone)]
pub struct ChromePageSource {
    config: ScrapeConfig,
}

impl ChromePageSource {
    pub fn new(config: ScrapeConfig) -> Self {
        Self { config }
    }

    fn map_error(err: anyhow::Error) -> PageSourceError {
        PageSourceError::Browser(format!("{err:#}"))
    }

    fn launch(&self) -> Result<Browser, PageSourceError> {
        let options = LaunchOptions {
            headless: self.config.headless,
            sandbox: false,
            window_size: Some((1920, 1080)),
            idle_browser_timeout: idle_timeout(self.config.page_timeout),
            args: vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--lang=en-US"),
            ],
            ..Default::default()
        };

        Browser::new(options).map_err(Self::map_error)
    }

    /// Fixed number of passes over the expand selectors; missing elements
    /// are not an error.
    fn expand_listing(&self, tab: &Tab) -> usize {
        let mut clicked = 0;
        for attempt in 1..=self.config.click_attempts {
            for selector in EXPAND_SELECTORS {
                let Ok(element) = tab.wait_for_element_with_custom_timeout(selector, CLICK_PROBE)
                else {
                    continue;
                };
                match element.click() {
                    Ok(_) => {
                        clicked += 1;
                        debug!(selector, attempt, "clicked listing control");
                    }
                    Err(err) => debug!(selector, attempt, error = %err, "click failed"),
                }
            }
            std::thread::sleep(self.config.settle);
        }
        clicked
    }
}

impl PageSource for ChromePageSource {
    fn fetch_html(&self, url: &str) -> Result<String, PageSourceError> {
        info!(url, headless = self.config.headless, "launching headless chrome");
        let browser = self.launch()?;
        let tab = browser.new_tab().map_err(Self::map_error)?;
        tab.set_default_timeout(self.config.page_timeout);

        tab.navigate_to(url).map_err(Self::map_error)?;
        tab.wait_until_navigated().map_err(Self::map_error)?;

        if tab
            .wait_for_element_with_custom_timeout(LISTING_SELECTOR, self.config.page_timeout)
            .is_err()
        {
            warn!(url, "listing table did not appear; continuing with current content");
        }

        let clicked = self.expand_listing(&tab);
        let html = tab.get_content().map_err(Self::map_error)?;
        info!(bytes = html.len(), clicked, "captured rendered listing page");
        Ok(html)
    }
}

/// Chrome is torn down when idle for this long, so it must outlast the
/// longest single wait.
fn idle_timeout(page_timeout: Duration) -> Duration {
    page_timeout.max(MIN_IDLE_TIMEOUT).saturating_mul(2)
}

/// Serves a previously saved copy of the listings page.
#[derive(Debug, Clone)]
pub struct HtmlFilePageSource {
    path: PathBuf,
}

impl HtmlFilePageSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PageSource for HtmlFilePageSource {
    fn fetch_html(&self, _url: &str) -> Result<String, PageSourceError> {
        let bytes = std::fs::read(&self.path).map_err(|source| PageSourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
