use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jobwatch_core::{fingerprint, JobPosting, KeywordFilter, RawCandidate, SearchQuery, SeenStore};
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::extract::Extractor;
use crate::persist::SeenBacking;
use crate::session::BrowserSessionManager;
use crate::{DiscoveryError, RenderError, RenderFailureKind, SessionError};

/// Source of "now" for discovery timestamps and retention.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    /// Wait after navigation before touching the page.
    pub settle_delay: Duration,
    /// Wait after scrolling so lazy-loaded cards can arrive.
    pub scroll_settle_delay: Duration,
    /// Location used for cards that do not show one.
    pub default_location: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(5),
            scroll_settle_delay: Duration::from_secs(2),
            default_location: "France".to_string(),
        }
    }
}

/// One polling iteration: ensure a live session, render the search page,
/// extract, filter and dedup. Exclusively owns the seen-job store.
pub struct DiscoveryCycle {
    sessions: BrowserSessionManager,
    extractor: Box<dyn Extractor>,
    filter: KeywordFilter,
    store: SeenStore,
    backing: Box<dyn SeenBacking>,
    query: SearchQuery,
    settings: DiscoverySettings,
    clock: Clock,
}

impl DiscoveryCycle {
    /// Builds the cycle and restores previously seen postings from `backing`.
    pub fn new(
        sessions: BrowserSessionManager,
        extractor: Box<dyn Extractor>,
        backing: Box<dyn SeenBacking>,
        query: SearchQuery,
    ) -> Self {
        let store = SeenStore::from_entries(backing.load_all());
        Self {
            sessions,
            extractor,
            filter: KeywordFilter::default(),
            store,
            backing,
            query,
            settings: DiscoverySettings::default(),
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_filter(mut self, filter: KeywordFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_settings(mut self, settings: DiscoverySettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    pub fn sessions(&self) -> &BrowserSessionManager {
        &self.sessions
    }

    /// First engine launch; a failure here means the process cannot work at all.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.sessions.start().await
    }

    /// Runs one discovery pass and returns the postings never seen before.
    /// They are already recorded in the store when this returns.
    pub async fn discover(&mut self) -> Result<Vec<JobPosting>, DiscoveryError> {
        let url = self.query.to_url()?;
        self.sessions.ensure_live().await?;

        let content = match self.render(url.as_str()).await {
            Ok(content) => content,
            Err(err) if err.is_crash() => {
                watch_warn!("rendering engine crashed, cycle yields nothing: {}", err);
                self.sessions.mark_crashed().await;
                return Ok(Vec::new());
            }
            Err(err) => return Err(DiscoveryError::Render(err)),
        };

        let candidates = self.extractor.extract(&content);
        watch_debug!("extracted {} candidate cards", candidates.len());
        Ok(self.record_new(candidates))
    }

    /// Drops entries older than `retention`; returns how many went.
    pub fn evict_expired(&mut self, retention: chrono::Duration) -> usize {
        let removed = self.store.evict_older_than(retention, (self.clock)());
        if removed > 0 {
            watch_info!("evicted {} expired postings, {} kept", removed, self.store.len());
            self.persist();
        }
        removed
    }

    pub async fn recycle_session(&mut self) -> Result<(), SessionError> {
        self.sessions.recycle().await
    }

    pub async fn shutdown(&mut self) {
        self.sessions.shutdown().await;
    }

    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        let settle = self.settings.settle_delay;
        let scroll_settle = self.settings.scroll_settle_delay;
        let session = self
            .sessions
            .session_mut()
            .ok_or_else(|| RenderError::new(RenderFailureKind::Crashed, "no live session"))?;

        session.navigate(url).await?;
        tokio::time::sleep(settle).await;
        session.scroll_to_bottom().await?;
        tokio::time::sleep(scroll_settle).await;
        session.content().await
    }

    fn record_new(&mut self, candidates: Vec<RawCandidate>) -> Vec<JobPosting> {
        let now = (self.clock)();
        let mut fresh = Vec::new();

        for raw in candidates {
            let (Some(title), Some(url)) = (raw.clean_title(), raw.canonical_link()) else {
                continue;
            };
            let company = raw.clean_company();
            if !self
                .filter
                .is_relevant(&JobPosting::relevance_text(&title, &company))
            {
                watch_debug!("not relevant: {} / {}", title, company);
                continue;
            }
            if self.store.has(&fingerprint(&url)) {
                continue;
            }

            let location = raw.clean_location(&self.settings.default_location);
            let posting = JobPosting::new(title, company, location, url, now);
            self.store.insert(posting.clone());
            self.persist();
            fresh.push(posting);
        }

        fresh
    }

    fn persist(&self) {
        if let Err(err) = self.backing.save_all(self.store.entries()) {
            watch_warn!("failed to persist seen jobs: {}", err);
        }
    }
}
