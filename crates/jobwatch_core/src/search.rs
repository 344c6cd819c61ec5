use url::Url;

/// LinkedIn guest search endpoint returning bare listing cards.
const DEFAULT_BASE_URL: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// The single results page polled every cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub base_url: String,
    pub keywords: String,
    pub location: String,
    /// Only listings posted within this many seconds.
    pub posted_within_secs: u64,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            keywords: "alternance cybersécurité".to_string(),
            location: "France".to_string(),
            posted_within_secs: 24 * 60 * 60,
        }
    }
}

impl SearchQuery {
    /// Full search URL with keywords, location and recency filter encoded.
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.base_url)?;
        url.query_pairs_mut()
            .append_pair("keywords", &self.keywords)
            .append_pair("location", &self.location)
            .append_pair("f_TPR", &format!("r{}", self.posted_within_secs))
            .append_pair("start", "0");
        Ok(url)
    }

    /// Origin used to resolve relative listing links found on the page.
    pub fn origin(&self) -> Option<Url> {
        let url = Url::parse(&self.base_url).ok()?;
        url.join("/").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::SearchQuery;

    #[test]
    fn url_carries_all_filters() {
        let url = SearchQuery::default().to_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("keywords".into(), "alternance cybersécurité".into())));
        assert!(pairs.contains(&("location".into(), "France".into())));
        assert!(pairs.contains(&("f_TPR".into(), "r86400".into())));
        assert!(pairs.contains(&("start".into(), "0".into())));
    }

    #[test]
    fn origin_is_site_root() {
        let origin = SearchQuery::default().origin().unwrap();
        assert_eq!(origin.as_str(), "https://www.linkedin.com/");
    }

    #[test]
    fn bad_base_url_is_reported() {
        let query = SearchQuery {
            base_url: "not a url".into(),
            ..SearchQuery::default()
        };
        assert!(query.to_url().is_err());
    }
}
