//! Headless Chromium engine over the DevTools protocol.
//!
//! Only built with the `chromium` feature. The browser binary is located by
//! chromiumoxide unless an explicit executable is configured.

use std::path::PathBuf;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use watch_logging::{watch_debug, watch_info, watch_warn};

use crate::render::{BrowserProfile, RenderEngine, RenderSession};
use crate::{RenderError, RenderFailureKind};

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight)";

#[derive(Debug, Clone, Default)]
pub struct ChromiumEngine {
    executable: Option<PathBuf>,
}

impl ChromiumEngine {
    pub fn new(executable: Option<PathBuf>) -> Self {
        Self { executable }
    }

    fn config(&self, profile: &BrowserProfile) -> Result<BrowserConfig, RenderError> {
        std::fs::create_dir_all(&profile.cache_dir)
            .map_err(|err| RenderError::new(RenderFailureKind::Unavailable, err.to_string()))?;

        // chromiumoxide adds its own headless switch.
        let args: Vec<String> = profile
            .launch_args()
            .into_iter()
            .filter(|arg| !arg.starts_with("--headless"))
            .collect();

        let mut builder = BrowserConfig::builder()
            .args(args)
            .window_size(profile.viewport.0, profile.viewport.1)
            .viewport(None)
            .user_data_dir(profile.cache_dir.join("profile"))
            .request_timeout(profile.page_load_timeout);
        if !profile.sandbox {
            builder = builder.no_sandbox();
        }
        if !profile.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder
            .build()
            .map_err(|msg| RenderError::new(RenderFailureKind::Unavailable, msg))
    }
}

#[async_trait::async_trait]
impl RenderEngine for ChromiumEngine {
    async fn launch(&self, profile: &BrowserProfile) -> Result<Box<dyn RenderSession>, RenderError> {
        let config = self.config(profile)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| RenderError::new(RenderFailureKind::Unavailable, err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    watch_warn!("devtools handler stopped: {}", err);
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler_task.abort();
                return Err(RenderError::new(RenderFailureKind::Unavailable, err.to_string()));
            }
        };
        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(
            profile.stealth_script.clone(),
        ))
        .await
        .map_err(map_cdp_error)?;

        watch_info!("chromium session started");
        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
        }))
    }
}

pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait::async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.page.goto(url).await.map_err(map_cdp_error)?;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), RenderError> {
        self.page
            .evaluate(SCROLL_TO_BOTTOM)
            .await
            .map_err(map_cdp_error)?;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.page.content().await.map_err(map_cdp_error)
    }

    async fn current_url(&mut self) -> Result<Option<String>, RenderError> {
        if self.handler_task.is_finished() {
            return Err(RenderError::new(
                RenderFailureKind::Crashed,
                "devtools connection closed",
            ));
        }
        self.page.url().await.map_err(map_cdp_error)
    }

    async fn close(self: Box<Self>) {
        let ChromiumSession {
            mut browser,
            page: _,
            handler_task,
        } = *self;
        if let Err(err) = browser.close().await {
            watch_debug!("browser close failed: {}", err);
        }
        if let Err(err) = browser.wait().await {
            watch_debug!("browser wait failed: {}", err);
        }
        handler_task.abort();
        watch_debug!("chromium session closed");
    }
}

fn map_cdp_error(err: CdpError) -> RenderError {
    let kind = match &err {
        CdpError::Ws(_) | CdpError::Io(_) | CdpError::ChannelSendError(_) | CdpError::NoResponse => {
            RenderFailureKind::Crashed
        }
        CdpError::Timeout => RenderFailureKind::Timeout,
        _ => RenderFailureKind::Page,
    };
    RenderError::new(kind, err.to_string())
}
