use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::fingerprint::{canonicalize_url, fingerprint, strip_query_raw};

/// Company shown when a listing card does not name one.
pub const DEFAULT_COMPANY: &str = "N/A";

/// One listing card as read from the page, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCandidate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    /// Absolute link to the listing, query string still attached.
    pub link: Option<String>,
}

impl RawCandidate {
    /// Collapsed title, or `None` when the card has no usable title.
    pub fn clean_title(&self) -> Option<String> {
        self.title.as_deref().map(collapse_whitespace).filter(|t| !t.is_empty())
    }

    pub fn clean_company(&self) -> String {
        self.company
            .as_deref()
            .map(collapse_whitespace)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COMPANY.to_string())
    }

    pub fn clean_location(&self, default_location: &str) -> String {
        self.location
            .as_deref()
            .map(collapse_whitespace)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| default_location.to_string())
    }

    /// Canonical listing URL. Links that do not parse fall back to the raw
    /// text cut the same way [`fingerprint`] cuts it.
    pub fn canonical_link(&self) -> Option<String> {
        let raw = self.link.as_deref()?;
        let link = canonicalize_url(raw).unwrap_or_else(|| strip_query_raw(raw).to_string());
        (!link.is_empty()).then_some(link)
    }
}

/// A listing worth notifying about. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(rename = "id")]
    pub fingerprint: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    #[serde(deserialize_with = "deserialize_found_at")]
    pub found_at: DateTime<Utc>,
}

impl JobPosting {
    /// Builds a posting whose fingerprint is derived from `url`.
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
        found_at: DateTime<Utc>,
    ) -> Self {
        let url = url.into();
        Self {
            fingerprint: fingerprint(&url),
            title: title.into(),
            company: company.into(),
            location: location.into(),
            url,
            found_at,
        }
    }

    /// Text the relevance filter is applied to.
    pub fn relevance_text(title: &str, company: &str) -> String {
        format!("{title} {company}")
    }
}

/// RFC 3339, or an offset-less ISO 8601 timestamp taken as local time (the
/// format older `seen_jobs.json` files were written in).
pub fn parse_found_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = raw.parse::<NaiveDateTime>().ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_found_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_found_at(&raw).ok_or_else(|| de::Error::custom(format!("invalid found_at {raw:?}")))
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
