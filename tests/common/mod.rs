//! In-memory collaborators for engine scenarios

#![allow(dead_code)]

use async_trait::async_trait;
use kb_crawler::crawler::{
    FetchError, FetchResponse, HttpFetch, RenderError, Renderer, RendererLauncher, RunProgress,
};
use reqwest::header::HeaderMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SEED: &str = "https://example.test/";

/// A page with an `<article>` long enough to be accepted
pub fn article(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<p><a href="{}">{}</a></p>"#, href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><nav><a href=\"/\">Home</a></nav>\
         <article><h1>{}</h1><p>{}</p>{}</article></body></html>",
        title,
        title,
        "This page explains the subject in enough detail to be worth keeping. ".repeat(2),
        anchors
    )
}

/// Serves canned responses per URL
///
/// Each URL has a sequence of responses; the last one repeats. Unknown URLs
/// answer 404.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, Vec<(u16, String)>>,
    calls: Mutex<Vec<String>>,
    cancel_after: Mutex<Option<(usize, Arc<RunProgress>)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
        self.pages
            .entry(url.to_string())
            .or_default()
            .push((status, body.into()));
        self
    }

    /// Requests cancellation once `calls` fetches have been served
    pub fn cancel_after(&self, calls: usize, progress: Arc<RunProgress>) {
        *self.cancel_after.lock().unwrap() = Some((calls, progress));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| *c == url).count()
    }
}

#[async_trait]
impl HttpFetch for FakeFetcher {
    async fn get(
        &self,
        url: &str,
        _headers: &HeaderMap,
        _timeout: Duration,
    ) -> Result<FetchResponse, FetchError> {
        let served = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            calls.iter().filter(|c| *c == url).count() - 1
        };

        if let Some((limit, progress)) = self.cancel_after.lock().unwrap().as_ref() {
            if self.calls.lock().unwrap().len() >= *limit {
                progress.cancel();
            }
        }

        let (status, body) = match self.pages.get(url) {
            Some(responses) => responses[served.min(responses.len() - 1)].clone(),
            None => (404, "Not Found".to_string()),
        };

        Ok(FetchResponse {
            status,
            body,
            headers: HeaderMap::new(),
        })
    }
}

/// What the fake renderer shows for one URL
#[derive(Debug, Clone, Default)]
pub struct FakeRender {
    pub title: Option<String>,
    pub text: String,
    pub html: Option<String>,
    pub links: Vec<String>,
    pub timeout: bool,
}

impl FakeRender {
    pub fn html(html: impl Into<String>, links: &[&str]) -> Self {
        Self {
            html: Some(html.into()),
            links: links.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn timeout() -> Self {
        Self {
            timeout: true,
            ..Self::default()
        }
    }
}

/// Launches sessions over a fixed set of rendered pages
#[derive(Clone, Default)]
pub struct FakeLauncher {
    pages: Arc<HashMap<String, FakeRender>>,
    fail: bool,
    pub launches: Arc<AtomicUsize>,
    pub closed: Arc<AtomicBool>,
    pub navigations: Arc<Mutex<Vec<String>>>,
}

impl FakeLauncher {
    pub fn new(pages: Vec<(&str, FakeRender)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(url, page)| (url.to_string(), page))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[async_trait]
impl RendererLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn Renderer>, RenderError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RenderError::Setup("no browser available".to_string()));
        }
        Ok(Box::new(FakeRenderer {
            launcher: self.clone(),
            current: None,
        }))
    }
}

struct FakeRenderer {
    launcher: FakeLauncher,
    current: Option<FakeRender>,
}

impl FakeRenderer {
    fn page(&self) -> Result<&FakeRender, RenderError> {
        self.current.as_ref().ok_or(RenderError::NoPage)
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
        self.launcher.navigations.lock().unwrap().push(url.to_string());
        self.current = None;
        match self.launcher.pages.get(url) {
            Some(page) => {
                self.current = Some(page.clone());
                Ok(())
            }
            None => Err(RenderError::Navigation(format!("no page at {}", url))),
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<(), RenderError> {
        if self.page()?.timeout {
            return Err(RenderError::Timeout(selector.to_string()));
        }
        Ok(())
    }

    async fn title(&self) -> Result<Option<String>, RenderError> {
        Ok(self.page()?.title.clone())
    }

    async fn rendered_text(&self) -> Result<String, RenderError> {
        Ok(self.page()?.text.clone())
    }

    async fn rendered_html(&self) -> Result<Option<String>, RenderError> {
        Ok(self.page()?.html.clone())
    }

    async fn find_links(&self) -> Result<Vec<String>, RenderError> {
        Ok(self.page()?.links.clone())
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.launcher.closed.store(true, Ordering::SeqCst);
        self.current = None;
        Ok(())
    }
}
