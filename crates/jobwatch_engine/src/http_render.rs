use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, CONTENT_TYPE};
use watch_logging::{watch_debug, watch_trace};

use crate::decode::decode_page;
use crate::render::{BrowserProfile, RenderEngine, RenderSession};
use crate::{RenderError, RenderFailureKind};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

/// Plain HTTP "engine": no script execution, the page markup is whatever the
/// server sends. Works against endpoints that return server-rendered cards.
#[derive(Debug, Clone, Default)]
pub struct HttpRenderEngine {
    settings: FetchSettings,
}

impl HttpRenderEngine {
    pub fn new(settings: FetchSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self, profile: &BrowserProfile) -> Result<reqwest::Client, RenderError> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&profile.accept_language)
            .map_err(|err| RenderError::new(RenderFailureKind::Unavailable, err.to_string()))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        reqwest::Client::builder()
            .user_agent(profile.user_agent.clone())
            .default_headers(headers)
            .connect_timeout(self.settings.connect_timeout)
            .timeout(profile.page_load_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.settings.redirect_limit))
            .build()
            .map_err(|err| RenderError::new(RenderFailureKind::Unavailable, err.to_string()))
    }
}

#[async_trait::async_trait]
impl RenderEngine for HttpRenderEngine {
    async fn launch(&self, profile: &BrowserProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        let client = self.build_client(profile)?;
        watch_debug!("http render session ready");
        Ok(Box::new(HttpRenderSession {
            client,
            settings: self.settings.clone(),
            current_url: None,
            page: None,
        }))
    }
}

pub struct HttpRenderSession {
    client: reqwest::Client,
    settings: FetchSettings,
    current_url: Option<String>,
    page: Option<String>,
}

impl HttpRenderSession {
    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    fn too_large(&self, actual: u64) -> RenderError {
        RenderError::new(
            RenderFailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "response too large",
        )
    }
}

#[async_trait::async_trait]
impl RenderSession for HttpRenderSession {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| RenderError::new(RenderFailureKind::InvalidUrl, err.to_string()))?;
        self.page = None;

        let response = self.client.get(parsed).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::new(
                RenderFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(RenderError::new(
                    RenderFailureKind::Page,
                    format!("unsupported content type {ct}"),
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }

        let decoded = decode_page(&bytes, content_type.as_deref());
        watch_trace!(
            "fetched {} ({} bytes, {})",
            final_url,
            bytes.len(),
            decoded.encoding_label
        );
        self.current_url = Some(final_url);
        self.page = Some(decoded.html);
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
        // Static markup has no lazy-loaded content.
        Ok(())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.page
            .clone()
            .ok_or_else(|| RenderError::new(RenderFailureKind::Page, "no page loaded"))
    }

    async fn current_url(&mut self) -> Result<Option<String>, RenderError> {
        Ok(self.current_url.clone())
    }

    async fn close(self: Box<Self>) {
        watch_debug!("http render session closed");
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RenderError {
    if err.is_timeout() {
        return RenderError::new(RenderFailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return RenderError::new(RenderFailureKind::Page, err.to_string());
    }
    // Connection refused, reset or dropped mid-body: the client is not trusted again.
    RenderError::new(RenderFailureKind::Crashed, err.to_string())
}
