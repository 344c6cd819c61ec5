use jobwatch_core::RawCandidate;
use scraper::{ElementRef, Html, Selector};
use url::Url;
use watch_logging::watch_debug;

/// CSS selectors locating listing cards and the fields inside one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelectors {
    pub card: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub link: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            card: "li".to_string(),
            title: "h3".to_string(),
            company: "h4".to_string(),
            location: ".job-search-card__location".to_string(),
            link: "a[href]".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid {field} selector {selector:?}: {message}")]
pub struct SelectorError {
    pub field: &'static str,
    pub selector: String,
    pub message: String,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Vec<RawCandidate>;
}

/// Why a single card was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardSkip {
    MissingTitle,
    MissingLink,
    UnresolvableLink,
}

/// Reads listing cards positionally: first title, company, location and link
/// element inside each card.
#[derive(Debug)]
pub struct ListingCardExtractor {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    link: Selector,
    base_url: Option<Url>,
}

impl ListingCardExtractor {
    pub fn new(selectors: &CardSelectors, base_url: Option<Url>) -> Result<Self, SelectorError> {
        Ok(Self {
            card: parse_selector("card", &selectors.card)?,
            title: parse_selector("title", &selectors.title)?,
            company: parse_selector("company", &selectors.company)?,
            location: parse_selector("location", &selectors.location)?,
            link: parse_selector("link", &selectors.link)?,
            base_url,
        })
    }

    fn read_card(&self, card: ElementRef<'_>) -> Result<RawCandidate, CardSkip> {
        let title = first_text(card, &self.title).ok_or(CardSkip::MissingTitle)?;
        let href = card
            .select(&self.link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .ok_or(CardSkip::MissingLink)?;
        let link = resolve_link(href, self.base_url.as_ref()).ok_or(CardSkip::UnresolvableLink)?;

        Ok(RawCandidate {
            title: Some(title),
            company: first_text(card, &self.company),
            location: first_text(card, &self.location),
            link: Some(link.into()),
        })
    }
}

impl Extractor for ListingCardExtractor {
    fn extract(&self, html: &str) -> Vec<RawCandidate> {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();
        for (index, card) in document.select(&self.card).enumerate() {
            match self.read_card(card) {
                Ok(candidate) => candidates.push(candidate),
                Err(reason) => watch_debug!("skipping card #{}: {:?}", index, reason),
            }
        }
        candidates
    }
}

fn parse_selector(field: &'static str, selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|err| SelectorError {
        field,
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

/// Text of the first matching element, `None` when absent or blank.
fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
}

fn resolve_link(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") || lower.starts_with("mailto:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}
