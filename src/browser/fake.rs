//! In-memory driver for tests.
//!
//! Pages are static HTML fixtures parsed with `scraper`; inline `style`
//! declarations stand in for computed styles. Every open and close is
//! recorded so tests can check lifecycle ordering.

use super::{BrowserHandle, BrowsingContext, ContextSettings, Launcher, PageHandle, PageScript};
use crate::error::{LaunchError, ScrapeError};
use crate::meta::META_EXTRACTOR;
use crate::sampler::script::STYLE_SAMPLER;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];

/// Knobs and recordings shared by every fake object
#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub html: Mutex<String>,
    pub events: Mutex<Vec<String>>,
    pub contexts: Mutex<Vec<ContextSettings>>,
    pub fail_launch: AtomicBool,
    pub fail_navigation: AtomicBool,
    pub fail_sampler: AtomicBool,
    pub fail_screenshot: AtomicBool,
    pub fail_page_close: AtomicBool,
    pub fail_context_close: AtomicBool,
    /// Liveness flag of the most recently launched browser
    pub alive: Mutex<Option<Arc<AtomicBool>>>,
}

impl FakeState {
    pub fn with_page(html: &str) -> Arc<Self> {
        let state = Arc::new(Self::default());
        *state.html.lock().unwrap() = html.to_string();
        state
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    /// Simulate the browser process dying
    pub fn kill_browser(&self) {
        if let Some(alive) = self.alive.lock().unwrap().as_ref() {
            alive.store(false, Ordering::SeqCst);
        }
    }
}

#[derive(Debug)]
pub(crate) struct FakeLauncher {
    pub state: Arc<FakeState>,
    pub delay: Duration,
}

impl FakeLauncher {
    pub fn new(state: Arc<FakeState>) -> Self {
        Self {
            state,
            delay: Duration::from_millis(20),
        }
    }
}

impl Launcher for FakeLauncher {
    type Handle = FakeBrowser;

    async fn launch(&self) -> Result<FakeBrowser, LaunchError> {
        self.state.record("launch");
        tokio::time::sleep(self.delay).await;

        if self.state.fail_launch.load(Ordering::SeqCst) {
            return Err(LaunchError::Spawn {
                binary: "fake-driver".to_string(),
                reason: "launch disabled".to_string(),
            });
        }

        let alive = Arc::new(AtomicBool::new(true));
        *self.state.alive.lock().unwrap() = Some(Arc::clone(&alive));
        Ok(FakeBrowser {
            state: Arc::clone(&self.state),
            alive,
        })
    }
}

#[derive(Debug)]
pub(crate) struct FakeBrowser {
    state: Arc<FakeState>,
    alive: Arc<AtomicBool>,
}

impl BrowserHandle for FakeBrowser {
    type Context = FakeContext;

    fn is_connected(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn new_context(&self, settings: &ContextSettings) -> Result<FakeContext, ScrapeError> {
        self.state.contexts.lock().unwrap().push(settings.clone());
        self.state.record("context:open");
        Ok(FakeContext {
            state: Arc::clone(&self.state),
        })
    }

    async fn close(&self) -> Result<(), ScrapeError> {
        self.alive.store(false, Ordering::SeqCst);
        self.state.record("browser:close");
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct FakeContext {
    state: Arc<FakeState>,
}

impl BrowsingContext for FakeContext {
    type Page = FakePage;

    async fn new_page(&mut self) -> Result<FakePage, ScrapeError> {
        self.state.record("page:open");
        Ok(FakePage {
            state: Arc::clone(&self.state),
        })
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.state.record("context:close");
        if self.state.fail_context_close.load(Ordering::SeqCst) {
            return Err(ScrapeError::Driver("context already gone".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct FakePage {
    state: Arc<FakeState>,
}

impl FakePage {
    fn document(&self) -> Html {
        Html::parse_document(&self.state.html.lock().unwrap())
    }
}

impl PageHandle for FakePage {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        self.state.record(format!("goto:{url}"));
        if self.state.fail_navigation.load(Ordering::SeqCst) {
            return Err(ScrapeError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn title(&mut self) -> Result<String, ScrapeError> {
        Ok(document_title(&self.document()))
    }

    async fn evaluate(
        &mut self,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value, ScrapeError> {
        self.state.record(format!("evaluate:{}", script.name));
        if *script == STYLE_SAMPLER {
            if self.state.fail_sampler.load(Ordering::SeqCst) {
                return Err(ScrapeError::Evaluation {
                    script: script.name,
                    reason: "TypeError: cannot read properties of null".to_string(),
                });
            }
            let limit = args.first().and_then(Value::as_u64).unwrap_or(u64::MAX) as usize;
            Ok(style_sample(&self.document(), limit))
        } else if *script == META_EXTRACTOR {
            Ok(meta_sample(&self.document()))
        } else {
            Err(ScrapeError::Evaluation {
                script: script.name,
                reason: "unknown script".to_string(),
            })
        }
    }

    async fn screenshot_full_page(&mut self) -> Result<Vec<u8>, ScrapeError> {
        self.state.record("screenshot");
        if self.state.fail_screenshot.load(Ordering::SeqCst) {
            return Err(ScrapeError::Screenshot("capture failed".to_string()));
        }
        Ok(PNG_MAGIC.to_vec())
    }

    async fn close(self) -> Result<(), ScrapeError> {
        self.state.record("page:close");
        if self.state.fail_page_close.load(Ordering::SeqCst) {
            return Err(ScrapeError::Driver("window already closed".to_string()));
        }
        Ok(())
    }
}

fn document_title(doc: &Html) -> String {
    let selector = Selector::parse("title").unwrap();
    doc.select(&selector)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Inline style declaration, or the browser default for that property
fn inline_style(element: &ElementRef, property: &str, default: &str) -> String {
    element
        .value()
        .attr("style")
        .and_then(|style| {
            style.split(';').find_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                (name.trim() == property).then(|| value.trim().to_string())
            })
        })
        .unwrap_or_else(|| default.to_string())
}

fn style_sample(doc: &Html, limit: usize) -> Value {
    let all = Selector::parse("*").unwrap();
    let elements: Vec<Value> = doc
        .select(&all)
        .take(limit)
        .map(|el| {
            json!({
                "tag": el.value().name().to_lowercase(),
                "role": el.value().attr("role"),
                "className": el.value().attr("class").unwrap_or_default(),
                "dataComponent": el.value().attr("data-component"),
                "backgroundColor": inline_style(&el, "background-color", "rgba(0, 0, 0, 0)"),
                "color": inline_style(&el, "color", "rgb(0, 0, 0)"),
                "borderColor": inline_style(&el, "border-color", "rgb(0, 0, 0)"),
                "fontFamily": inline_style(&el, "font-family", "\"Times New Roman\""),
                "fontSize": inline_style(&el, "font-size", "16px"),
                "padding": inline_style(&el, "padding", "0px"),
                "margin": inline_style(&el, "margin", "0px"),
                "gap": inline_style(&el, "gap", "normal"),
                "display": inline_style(&el, "display", "block"),
            })
        })
        .collect();

    let links = Selector::parse("link[href]").unwrap();
    let scripts = Selector::parse("script[src]").unwrap();
    let assets: Vec<&str> = doc
        .select(&links)
        .filter_map(|l| l.value().attr("href"))
        .chain(doc.select(&scripts).filter_map(|s| s.value().attr("src")))
        .collect();

    json!({ "elements": elements, "assets": assets })
}

fn meta_sample(doc: &Html) -> Value {
    let selector = Selector::parse("meta[name], meta[property]").unwrap();
    let tags: Vec<Value> = doc
        .select(&selector)
        .map(|m| {
            let key = m
                .value()
                .attr("name")
                .or_else(|| m.value().attr("property"))
                .unwrap_or_default();
            json!([key, m.value().attr("content").unwrap_or_default()])
        })
        .collect();

    json!({ "title": document_title(doc), "tags": tags })
}
