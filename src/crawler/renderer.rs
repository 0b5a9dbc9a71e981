//! Rendering collaborator
//!
//! Pages that need a script runtime are loaded through a [`Renderer`]
//! session obtained from a [`RendererLauncher`]. The engine only talks to
//! these traits; [`RemoteRenderer`] is the bundled implementation and drives
//! an HTTP rendering service.

use crate::extract::html;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::Html;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Extra time granted to the service beyond the requested wait
const RESPONSE_GRACE: Duration = Duration::from_secs(5);

/// Rendering failures
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Timed out waiting for '{0}'")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Rendering session could not start: {0}")]
    Setup(String),

    #[error("No page loaded")]
    NoPage,
}

/// A live rendering session
///
/// A session loads one page at a time. `navigate` followed by
/// `wait_for_selector` makes a page current; the accessors then describe
/// that page.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError>;

    /// Waits until `selector` matches on the current page, bounded by `timeout`
    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration)
        -> Result<(), RenderError>;

    async fn title(&self) -> Result<Option<String>, RenderError>;

    /// Visible text of the rendered body
    async fn rendered_text(&self) -> Result<String, RenderError>;

    /// Serialized DOM, if the session can provide it
    async fn rendered_html(&self) -> Result<Option<String>, RenderError>;

    /// Anchor targets on the current page, as written in the DOM
    async fn find_links(&self) -> Result<Vec<String>, RenderError>;

    async fn close(&mut self) -> Result<(), RenderError>;
}

/// Starts rendering sessions
#[async_trait]
pub trait RendererLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn Renderer>, RenderError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderRequest<'a> {
    url: &'a str,
    wait_for_selector: WaitForSelector<'a>,
}

#[derive(Debug, Serialize)]
struct WaitForSelector<'a> {
    selector: &'a str,
    timeout: u64,
}

/// Launches [`RemoteRenderer`] sessions against one service endpoint
#[derive(Debug, Clone)]
pub struct RemoteRendererLauncher {
    endpoint: Url,
    client: Client,
}

impl RemoteRendererLauncher {
    pub fn new(endpoint: &str) -> Result<Self, RenderError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RenderError::Setup(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RenderError::Setup(e.to_string()))?;

        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl RendererLauncher for RemoteRendererLauncher {
    /// Checks that the service answers at all, then hands out a session
    ///
    /// Any HTTP status counts as reachable; only transport errors fail.
    async fn launch(&self) -> Result<Box<dyn Renderer>, RenderError> {
        self.client
            .get(self.endpoint.clone())
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| {
                RenderError::Setup(format!("renderer at {} unreachable: {}", self.endpoint, e))
            })?;

        tracing::info!("Rendering service reachable at {}", self.endpoint);

        Ok(Box::new(RemoteRenderer {
            endpoint: self.endpoint.clone(),
            client: self.client.clone(),
            target: None,
            page_html: None,
        }))
    }
}

/// [`Renderer`] over an HTTP rendering service
///
/// The service loads a page and waits for a selector in a single request, so
/// `navigate` only records the target and `wait_for_selector` performs the
/// request. Title, text and links are derived from the returned HTML.
#[derive(Debug)]
pub struct RemoteRenderer {
    endpoint: Url,
    client: Client,
    target: Option<String>,
    page_html: Option<String>,
}

impl RemoteRenderer {
    fn document(&self) -> Result<Html, RenderError> {
        self.page_html
            .as_deref()
            .map(Html::parse_document)
            .ok_or(RenderError::NoPage)
    }
}

#[async_trait]
impl Renderer for RemoteRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        Url::parse(url).map_err(|e| RenderError::Navigation(format!("{}: {}", url, e)))?;
        self.target = Some(url.to_string());
        self.page_html = None;
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        let target = self.target.as_deref().ok_or(RenderError::NoPage)?;
        let request = RenderRequest {
            url: target,
            wait_for_selector: WaitForSelector {
                selector,
                timeout: timeout.as_millis() as u64,
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .timeout(timeout + RESPONSE_GRACE)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RenderError::Timeout(selector.to_string())
                } else {
                    RenderError::Navigation(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
            return Err(RenderError::Timeout(selector.to_string()));
        }
        if !status.is_success() {
            return Err(RenderError::Navigation(format!(
                "rendering service returned {} for {}",
                status, target
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RenderError::Navigation(e.to_string()))?;
        self.page_html = Some(body);
        Ok(())
    }

    async fn title(&self) -> Result<Option<String>, RenderError> {
        Ok(html::extract_title(&self.document()?))
    }

    async fn rendered_text(&self) -> Result<String, RenderError> {
        Ok(html::visible_text(&self.document()?))
    }

    async fn rendered_html(&self) -> Result<Option<String>, RenderError> {
        match &self.page_html {
            Some(page) => Ok(Some(page.clone())),
            None => Err(RenderError::NoPage),
        }
    }

    async fn find_links(&self) -> Result<Vec<String>, RenderError> {
        Ok(html::anchor_hrefs(&self.document()?))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.target = None;
        self.page_html = None;
        Ok(())
    }
}
