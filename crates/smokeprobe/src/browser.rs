//! Browser sessions over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`CdpSession`] implements [`Session`] on top of
//! chromiumoxide. The async client runs on a private tokio runtime owned by the
//! session; every call blocks on it, so callers stay synchronous.
//!
//! A session either launches a local Chromium or, when a remote endpoint is
//! configured, connects to an already running browser (`ws://…` debugger URL
//! or the `http://host:9222` discovery endpoint).
//!
//! [`Session`]: crate::Session

use crate::config::SmokeConfig;

/// Browser launch arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub viewport_width: u32,
    /// Window height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Remote browser endpoint; launch locally when `None`
    pub remote_url: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            chromium_path: None,
            remote_url: None,
            sandbox: false,
        }
    }
}

impl BrowserConfig {
    /// Launch arguments for a smoke run
    #[must_use]
    pub fn from_smoke(config: &SmokeConfig) -> Self {
        Self {
            headless: config.headless,
            chromium_path: config.chrome_path.clone(),
            remote_url: config.remote_url.clone(),
            ..Self::default()
        }
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Connect to a running browser instead of launching one
    #[must_use]
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Extra command-line switches for a local launch
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "--disable-dev-shm-usage".to_string(),
            format!("--window-size={},{}", self.viewport_width, self.viewport_height),
        ]
    }
}

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use super::BrowserConfig;
    use crate::fixture::SessionProvider;
    use crate::result::{SmokeError, SmokeResult};
    use crate::selector::Selector;
    use crate::session::{Element, Session};
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
    use chromiumoxide::element::Element as CdpNode;
    use chromiumoxide::page::{Page as CdpPage, ScreenshotParams};
    use futures::StreamExt;
    use std::sync::Arc;
    use tokio::runtime::Runtime;

    const IS_VISIBLE_JS: &str = "function() {
        const r = this.getBoundingClientRect();
        const s = window.getComputedStyle(this);
        return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
    }";

    const CLEAR_JS: &str = "function() {
        this.focus();
        this.value = '';
        this.dispatchEvent(new Event('input', { bubbles: true }));
    }";

    fn session_err(e: impl std::fmt::Display) -> SmokeError {
        SmokeError::session(e.to_string())
    }

    /// Live page in a Chromium instance
    #[derive(Debug)]
    pub struct CdpSession {
        runtime: Arc<Runtime>,
        browser: CdpBrowser,
        page: CdpPage,
        handler: tokio::task::JoinHandle<()>,
        remote: bool,
    }

    impl CdpSession {
        /// Launch a local browser, or connect to `config.remote_url` when set
        pub fn start(config: &BrowserConfig) -> SmokeResult<Self> {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .map_err(|e| SmokeError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            let runtime = Arc::new(runtime);

            let remote = config.remote_url.is_some();
            let (browser, mut handler) = runtime.block_on(async {
                match &config.remote_url {
                    Some(url) => {
                        tracing::info!(%url, "connecting to remote browser");
                        CdpBrowser::connect(url.clone()).await
                    }
                    None => {
                        let cdp_config = launch_config(config)?;
                        tracing::info!(headless = config.headless, "launching local browser");
                        CdpBrowser::launch(cdp_config).await
                    }
                }
                .map_err(|e| SmokeError::BrowserLaunch {
                    message: e.to_string(),
                })
            })?;

            let handler = runtime.spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = runtime
                .block_on(browser.new_page("about:blank"))
                .map_err(|e| SmokeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

            Ok(Self {
                runtime,
                browser,
                page,
                handler,
                remote,
            })
        }

        /// Close the page, and the browser when it was launched locally
        pub fn close(self) -> SmokeResult<()> {
            let Self {
                runtime,
                mut browser,
                page,
                handler,
                remote,
            } = self;
            let result = runtime.block_on(async move {
                if remote {
                    page.close().await
                } else {
                    browser.close().await.map(|_| ())
                }
            });
            handler.abort();
            result.map_err(session_err)
        }

        fn element(&self, node: CdpNode) -> CdpElement {
            CdpElement {
                runtime: Arc::clone(&self.runtime),
                node,
            }
        }
    }

    fn launch_config(config: &BrowserConfig) -> SmokeResult<CdpConfig> {
        let mut builder = CdpConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .args(config.launch_args());

        builder = if config.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        builder
            .build()
            .map_err(|message| SmokeError::BrowserLaunch { message })
    }

    impl Session for CdpSession {
        type Element = CdpElement;

        fn navigate(&self, url: &str) -> SmokeResult<()> {
            self.runtime
                .block_on(self.page.goto(url))
                .map(|_| ())
                .map_err(|e| SmokeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
        }

        fn current_url(&self) -> SmokeResult<String> {
            let url = self.runtime.block_on(self.page.url()).map_err(session_err)?;
            Ok(url.unwrap_or_default())
        }

        fn title(&self) -> SmokeResult<String> {
            let title = self
                .runtime
                .block_on(self.page.get_title())
                .map_err(session_err)?;
            Ok(title.unwrap_or_default())
        }

        fn page_source(&self) -> SmokeResult<String> {
            self.runtime
                .block_on(self.page.content())
                .map_err(session_err)
        }

        fn screenshot(&self) -> SmokeResult<Vec<u8>> {
            let params = ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .build();
            self.runtime
                .block_on(self.page.screenshot(params))
                .map_err(|e| SmokeError::Screenshot {
                    message: e.to_string(),
                })
        }

        fn query(&self, selector: &Selector) -> SmokeResult<Option<CdpElement>> {
            let probe = format!(
                "(() => {{ try {{ return ({}) ? 'found' : 'missing'; }} \
                 catch (e) {{ return 'invalid:' + e.message; }} }})()",
                selector.to_query()
            );
            let verdict: String = self.runtime.block_on(async {
                self.page
                    .evaluate(probe)
                    .await
                    .map_err(session_err)?
                    .into_value()
                    .map_err(session_err)
            })?;

            if let Some(message) = verdict.strip_prefix("invalid:") {
                return Err(SmokeError::invalid_selector(selector, message));
            }
            if verdict != "found" {
                return Ok(None);
            }

            // The node may be gone by now; that is a miss, not an error.
            let node = match (selector.to_xpath(), selector.to_css()) {
                (Some(xpath), _) => self.runtime.block_on(self.page.find_xpath(xpath)),
                (None, Some(css)) => self.runtime.block_on(self.page.find_element(css)),
                (None, None) => return Ok(None),
            };
            Ok(node.ok().map(|node| self.element(node)))
        }
    }

    /// DOM node handle in a [`CdpSession`]
    #[derive(Debug)]
    pub struct CdpElement {
        runtime: Arc<Runtime>,
        node: CdpNode,
    }

    impl Element for CdpElement {
        fn is_visible(&self) -> SmokeResult<bool> {
            let returns = self
                .runtime
                .block_on(self.node.call_js_fn(IS_VISIBLE_JS, false))
                .map_err(session_err)?;
            Ok(returns
                .result
                .value
                .and_then(|v| v.as_bool())
                .unwrap_or(false))
        }

        fn text(&self) -> SmokeResult<String> {
            let text = self
                .runtime
                .block_on(self.node.inner_text())
                .map_err(session_err)?;
            Ok(text.unwrap_or_default())
        }

        fn clear(&self) -> SmokeResult<()> {
            self.runtime
                .block_on(self.node.call_js_fn(CLEAR_JS, false))
                .map(|_| ())
                .map_err(|e| SmokeError::input(e.to_string()))
        }

        fn type_text(&self, text: &str) -> SmokeResult<()> {
            self.runtime
                .block_on(async {
                    self.node.focus().await?;
                    self.node.type_str(text).await.map(|_| ())
                })
                .map_err(|e| SmokeError::input(e.to_string()))
        }

        fn click(&self) -> SmokeResult<()> {
            self.runtime
                .block_on(self.node.click())
                .map(|_| ())
                .map_err(|e| SmokeError::input(e.to_string()))
        }
    }

    /// Hands out [`CdpSession`]s for a [`SessionFixture`](crate::SessionFixture)
    #[derive(Debug, Clone)]
    pub struct CdpProvider {
        config: BrowserConfig,
    }

    impl CdpProvider {
        /// Provider launching browsers with `config`
        #[must_use]
        pub const fn new(config: BrowserConfig) -> Self {
            Self { config }
        }
    }

    impl SessionProvider for CdpProvider {
        type Session = CdpSession;

        fn acquire(&mut self) -> SmokeResult<CdpSession> {
            CdpSession::start(&self.config)
        }

        fn release(&mut self, session: CdpSession) -> SmokeResult<()> {
            session.close()
        }

        fn name(&self) -> &str {
            if self.config.remote_url.is_some() {
                "remote chromium"
            } else {
                "local chromium"
            }
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{CdpElement, CdpProvider, CdpSession};
