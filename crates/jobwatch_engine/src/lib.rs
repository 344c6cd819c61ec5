//! Jobwatch engine: rendering sessions, extraction, discovery, notification and the run loop.
#[cfg(feature = "chromium")]
mod chromium;
mod decode;
mod discovery;
mod extract;
mod http_render;
mod notify;
mod persist;
mod render;
mod run_loop;
mod session;
mod types;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumEngine;
pub use decode::{decode_page, DecodedPage};
pub use discovery::{Clock, DiscoveryCycle, DiscoverySettings};
pub use extract::{CardSelectors, Extractor, ListingCardExtractor, SelectorError};
pub use http_render::{FetchSettings, HttpRenderEngine};
pub use notify::{DispatchSummary, NotificationDispatcher, TelegramTransport, Transport};
pub use persist::{ensure_state_dir, AtomicFileWriter, JsonFileBacking, MemoryBacking, PersistError, SeenBacking};
pub use render::{BrowserProfile, RenderEngine, RenderSession, DEFAULT_USER_AGENT, STEALTH_SCRIPT};
pub use run_loop::{CycleOutcome, RunLoop, RunLoopSettings};
pub use session::BrowserSessionManager;
pub use types::{DiscoveryError, NotifyError, RenderError, RenderFailureKind, SessionError};
