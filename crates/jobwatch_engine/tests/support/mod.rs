#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use std::collections::HashMap;

use jobwatch_core::{JobPosting, SearchQuery};
use jobwatch_engine::{
    BrowserProfile, BrowserSessionManager, CardSelectors, DiscoveryCycle, DiscoverySettings,
    ListingCardExtractor, MemoryBacking, NotifyError, PersistError, RenderEngine, RenderError,
    RenderFailureKind, RenderSession, SeenBacking, Transport,
};
use tokio_util::sync::CancellationToken;

pub const SEARCH_BASE: &str = "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// Two relevant cards, one card without a link and one irrelevant card.
pub const LISTING_PAGE: &str = r#"
<html><body><ul>
  <li>
    <div class="base-card">
      <a class="base-card__full-link" href="https://fr.linkedin.com/jobs/view/alternance-analyste-soc-4012?refId=abc&amp;trackingId=xyz"></a>
      <h3 class="base-search-card__title">
        Alternance - Analyste SOC
      </h3>
      <h4 class="base-search-card__subtitle"><a href="https://fr.linkedin.com/company/acme">ACME Security</a></h4>
      <span class="job-search-card__location">  Paris, Île-de-France </span>
    </div>
  </li>
  <li>
    <div class="base-card">
      <h3 class="base-search-card__title">Alternant Pentester</h3>
      <h4 class="base-search-card__subtitle">NoLink Corp</h4>
    </div>
  </li>
  <li>
    <div class="base-card">
      <a class="base-card__full-link" href="/jobs/view/apprenti-devsecops-5150?trk=guest"></a>
      <h3 class="base-search-card__title">Apprenti DevSecOps</h3>
    </div>
  </li>
  <li>
    <div class="base-card">
      <a class="base-card__full-link" href="/jobs/view/stage-comptable-77"></a>
      <h3 class="base-search-card__title">Stage Comptabilité</h3>
      <h4 class="base-search-card__subtitle">Cabinet Durand</h4>
    </div>
  </li>
</ul></body></html>
"#;

/// One valid card and one card lacking a link.
pub const SINGLE_MATCH_PAGE: &str = r#"
<html><body><ul>
  <li><div><h3>Alternant Pentester</h3><h4>NoLink Corp</h4></div></li>
  <li><div><a href="https://fr.linkedin.com/jobs/view/alternance-soc-1?x=1"></a><h3>Alternance SOC Analyst</h3><h4>Blue Team SA</h4></div></li>
</ul></body></html>
"#;

#[derive(Debug, Default)]
pub struct EngineLog {
    pub page: String,
    pub launches: usize,
    pub closes: usize,
    pub navigations: Vec<String>,
    pub scrolls: usize,
    pub fail_launch: bool,
    pub crash_next_render: bool,
    pub probe_fails: bool,
}

impl EngineLog {
    pub fn live_sessions(&self) -> usize {
        self.launches - self.closes
    }
}

/// In-memory rendering engine whose behaviour tests can flip at any time.
#[derive(Clone, Default)]
pub struct FakeEngine {
    pub log: Arc<Mutex<EngineLog>>,
}

impl FakeEngine {
    pub fn with_page(page: &str) -> Self {
        let engine = Self::default();
        engine.log.lock().unwrap().page = page.to_string();
        engine
    }

    pub fn set<F: FnOnce(&mut EngineLog)>(&self, f: F) {
        f(&mut self.log.lock().unwrap());
    }

    pub fn get<T, F: FnOnce(&EngineLog) -> T>(&self, f: F) -> T {
        f(&self.log.lock().unwrap())
    }
}

#[async_trait::async_trait]
impl RenderEngine for FakeEngine {
    async fn launch(&self, _profile: &BrowserProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        let mut log = self.log.lock().unwrap();
        if log.fail_launch {
            return Err(RenderError::new(
                RenderFailureKind::Unavailable,
                "browser binary not found",
            ));
        }
        log.launches += 1;
        Ok(Box::new(FakeSession {
            id: log.launches,
            log: self.log.clone(),
            current: None,
        }))
    }
}

pub struct FakeSession {
    pub id: usize,
    log: Arc<Mutex<EngineLog>>,
    current: Option<String>,
}

#[async_trait::async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        let mut log = self.log.lock().unwrap();
        if log.crash_next_render {
            log.crash_next_render = false;
            return Err(RenderError::new(
                RenderFailureKind::Crashed,
                "session deleted because of page crash",
            ));
        }
        log.navigations.push(url.to_string());
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
        self.log.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        Ok(self.log.lock().unwrap().page.clone())
    }

    async fn current_url(&mut self) -> Result<Option<String>, RenderError> {
        if self.log.lock().unwrap().probe_fails {
            return Err(RenderError::new(RenderFailureKind::Crashed, "no such window"));
        }
        Ok(self.current.clone())
    }

    async fn close(self: Box<Self>) {
        self.log.lock().unwrap().closes += 1;
    }
}

/// Records every message; sends listed in `fail_on` (0-based) are rejected.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<String>>,
    pub attempts: Mutex<usize>,
    pub fail_on: Vec<usize>,
    /// Fired once this many attempts have been made.
    pub cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingTransport {
    pub fn failing_on(fail_on: Vec<usize>) -> Self {
        Self {
            fail_on,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts - 1
        };
        if let Some((after, token)) = &self.cancel_after {
            if attempt + 1 >= *after {
                token.cancel();
            }
        }
        if self.fail_on.contains(&attempt) {
            return Err(NotifyError::Rejected {
                status: 429,
                body: "Too Many Requests: retry after 5".to_string(),
            });
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Counts saves and can be told to fail every one of them.
#[derive(Clone, Default)]
pub struct RecordingBacking {
    pub saves: Arc<Mutex<usize>>,
    pub fail: bool,
}

impl RecordingBacking {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl SeenBacking for RecordingBacking {
    fn load_all(&self) -> HashMap<String, JobPosting> {
        HashMap::new()
    }

    fn save_all(&self, _entries: &HashMap<String, JobPosting>) -> Result<(), PersistError> {
        *self.saves.lock().unwrap() += 1;
        if self.fail {
            return Err(PersistError::StateDir("read-only volume".to_string()));
        }
        Ok(())
    }
}

pub fn instant_settings() -> DiscoverySettings {
    DiscoverySettings {
        settle_delay: Duration::ZERO,
        scroll_settle_delay: Duration::ZERO,
        default_location: "France".to_string(),
    }
}

pub fn search_query() -> SearchQuery {
    SearchQuery {
        base_url: SEARCH_BASE.to_string(),
        ..SearchQuery::default()
    }
}

pub fn discovery_with(engine: &FakeEngine, backing: Box<dyn SeenBacking>) -> DiscoveryCycle {
    let query = search_query();
    let extractor = ListingCardExtractor::new(&CardSelectors::default(), query.origin())
        .expect("default selectors parse");
    let sessions = BrowserSessionManager::new(Arc::new(engine.clone()), BrowserProfile::default());
    DiscoveryCycle::new(sessions, Box::new(extractor), backing, query).with_settings(instant_settings())
}

pub fn discovery(engine: &FakeEngine) -> DiscoveryCycle {
    discovery_with(engine, Box::new(MemoryBacking))
}
