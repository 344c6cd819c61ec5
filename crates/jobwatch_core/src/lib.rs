//! Jobwatch core: pure listing model, filtering, dedup store and session state machine.
mod fingerprint;
mod message;
mod posting;
mod relevance;
mod search;
mod session;
mod store;

pub use fingerprint::{canonicalize_url, fingerprint};
pub use message::{escape_markdown, format_notification};
pub use posting::{parse_found_at, JobPosting, RawCandidate, DEFAULT_COMPANY};
pub use relevance::{KeywordFilter, DEFAULT_DOMAIN_TERMS, DEFAULT_EMPLOYMENT_TERMS};
pub use search::SearchQuery;
pub use session::{transition, SessionEffect, SessionMsg, SessionState};
pub use store::SeenStore;
