use std::path::PathBuf;
use std::time::Duration;

use crate::RenderError;

/// Desktop Chrome user agent presented by every engine.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Injected before any page script runs so the page cannot see it is automated.
pub const STEALTH_SCRIPT: &str = "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });\
     window.chrome = window.chrome || { runtime: {} };\
     Object.defineProperty(navigator, 'languages', { get: () => ['fr-FR', 'fr', 'en-US', 'en'] });";

/// Hardened launch configuration shared by every session the manager starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub headless: bool,
    /// Containers usually cannot provide the Chrome sandbox.
    pub sandbox: bool,
    pub cache_dir: PathBuf,
    pub viewport: (u32, u32),
    pub user_agent: String,
    pub accept_language: String,
    pub stealth_script: String,
    pub page_load_timeout: Duration,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            cache_dir: std::env::temp_dir().join("jobwatch-browser-cache"),
            viewport: (1920, 1080),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "fr-FR,fr;q=0.9,en;q=0.8".to_string(),
            stealth_script: STEALTH_SCRIPT.to_string(),
            page_load_timeout: Duration::from_secs(30),
        }
    }
}

impl BrowserProfile {
    /// Command-line switches for a Chromium process started with this profile.
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--disable-extensions".to_string(),
            format!("--disk-cache-dir={}", self.cache_dir.display()),
            format!("--window-size={},{}", self.viewport.0, self.viewport.1),
            format!("--user-agent={}", self.user_agent),
            format!("--lang={}", self.primary_language()),
        ];
        if !self.sandbox {
            args.push("--no-sandbox".to_string());
            args.push("--disable-setuid-sandbox".to_string());
        }
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args
    }

    fn primary_language(&self) -> &str {
        self.accept_language
            .split([',', ';'])
            .next()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("en-US")
    }
}

/// Starts rendering sessions. Availability is only discovered here.
#[async_trait::async_trait]
pub trait RenderEngine: Send + Sync {
    async fn launch(&self, profile: &BrowserProfile) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// One live engine instance.
#[async_trait::async_trait]
pub trait RenderSession: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Forces lazy-loaded content of the current page to load.
    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError>;

    /// Markup of the current page.
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Cheap liveness probe.
    async fn current_url(&mut self) -> Result<Option<String>, RenderError>;

    /// Releases the underlying resources. Errors are logged, never returned.
    async fn close(self: Box<Self>);
}
