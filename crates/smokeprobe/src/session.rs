//! Browser session capability.
//!
//! The core never launches or tears down a browser. It only needs an object
//! that can answer "is there an element for this selector right now" and hand
//! back page state for diagnostics. Polling is layered on top of the raw
//! [`Session::query`] primitive by the [`Locator`](crate::Locator).
//!
//! # Implementations
//!
//! - `CdpSession` - real Chromium over CDP (feature `browser`)
//! - [`MockSession`] - in-memory pages for unit and integration tests

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::result::{SmokeError, SmokeResult};
use crate::selector::{normalize_space, Selector};

/// PNG signature used as the default mock screenshot
pub const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Handle to a DOM node, valid until the next navigation
pub trait Element {
    /// Whether the element is rendered and visible
    fn is_visible(&self) -> SmokeResult<bool>;

    /// Rendered text content
    fn text(&self) -> SmokeResult<String>;

    /// Clear an input's value
    fn clear(&self) -> SmokeResult<()>;

    /// Type text into the element
    fn type_text(&self, text: &str) -> SmokeResult<()>;

    /// Click the element
    fn click(&self) -> SmokeResult<()>;
}

/// Capabilities the core consumes from a browser session
pub trait Session {
    /// Element handle type returned by queries
    type Element: Element;

    /// Navigate to URL and wait for the load to finish
    fn navigate(&self, url: &str) -> SmokeResult<()>;

    /// Current URL
    fn current_url(&self) -> SmokeResult<String>;

    /// Current document title
    fn title(&self) -> SmokeResult<String>;

    /// Full rendered markup
    fn page_source(&self) -> SmokeResult<String>;

    /// PNG screenshot of the viewport
    fn screenshot(&self) -> SmokeResult<Vec<u8>>;

    /// Query the page once, without waiting.
    ///
    /// Returns `Ok(None)` when nothing matches and
    /// [`SmokeError::InvalidSelector`] when the driver cannot evaluate the
    /// selector. Any other error means the session itself is unusable.
    fn query(&self, selector: &Selector) -> SmokeResult<Option<Self::Element>>;
}

// ============================================================================
// Mock session
// ============================================================================

/// A node on a mock page
#[derive(Debug, Clone)]
pub struct MockNode {
    tag: String,
    attrs: BTreeMap<String, String>,
    ancestors: Vec<String>,
    css_aliases: Vec<String>,
    text: String,
    visible: bool,
    appears_after: Duration,
    visible_after: Duration,
    navigates_to: Option<String>,
    value: String,
    clicks: u32,
}

impl MockNode {
    /// Create a node with a tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            ancestors: Vec::new(),
            css_aliases: Vec::new(),
            text: String::new(),
            visible: true,
            appears_after: Duration::ZERO,
            visible_after: Duration::ZERO,
            navigates_to: None,
            value: String::new(),
            clicks: 0,
        }
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Place the node under an ancestor tag
    #[must_use]
    pub fn within(mut self, ancestor: impl Into<String>) -> Self {
        self.ancestors.push(ancestor.into());
        self
    }

    /// Raw CSS this node answers to
    #[must_use]
    pub fn alias(mut self, css: impl Into<String>) -> Self {
        self.css_aliases.push(css.into());
        self
    }

    /// Present in the DOM but never visible
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Only attached to the DOM after `delay` from page load
    #[must_use]
    pub const fn appears_after(mut self, delay: Duration) -> Self {
        self.appears_after = delay;
        self
    }

    /// Attached immediately but only visible after `delay` from page load
    #[must_use]
    pub const fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_after = delay;
        self
    }

    /// Clicking follows a link to `url`
    #[must_use]
    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        self.navigates_to = Some(url.into());
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::TestId(id) => self.get("data-testid") == Some(id.as_str()),
            Selector::Name { tag, value } => {
                self.tag == *tag && self.get("name") == Some(value.as_str())
            }
            Selector::Type { tag, value } => {
                self.tag == *tag && self.get("type") == Some(value.as_str())
            }
            Selector::HrefContains(fragment) => {
                self.tag == "a" && self.get("href").is_some_and(|h| h.contains(fragment.as_str()))
            }
            Selector::Class { ancestor, class } => {
                self.has_class(class)
                    && ancestor
                        .as_ref()
                        .map_or(true, |a| self.ancestors.iter().any(|x| x == a))
            }
            Selector::Text { tag, text } => {
                self.tag == *tag && normalize_space(&self.text).contains(text.as_str())
            }
            Selector::Tag(tag) => self.tag == *tag,
            Selector::Css(css) => self.css_aliases.iter().any(|a| a == css),
        }
    }

    fn label(&self) -> String {
        ["data-testid", "name", "type", "href", "class"]
            .iter()
            .find_map(|k| self.get(k).map(|v| format!("{}[{k}={v}]", self.tag)))
            .unwrap_or_else(|| self.tag.clone())
    }

    fn render(&self) -> String {
        let attrs: String = self
            .attrs
            .iter()
            .map(|(k, v)| format!(" {k}=\"{v}\""))
            .collect();
        format!("<{tag}{attrs}>{}</{tag}>", self.text, tag = self.tag)
    }
}

/// A page served by [`MockSession`]
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    title: String,
    source: Option<String>,
    nodes: Vec<MockNode>,
}

impl MockPage {
    /// Create a page with a title
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: None,
            nodes: Vec::new(),
        }
    }

    /// The page a server answers with for unknown routes
    #[must_use]
    pub fn not_found() -> Self {
        Self::new("404 Not Found").with_source("<html><body><h1>Not Found</h1></body></html>")
    }

    /// Override the markup returned by `page_source`
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a node
    #[must_use]
    pub fn node(mut self, node: MockNode) -> Self {
        self.nodes.push(node);
        self
    }

    fn render(&self) -> String {
        self.source.clone().unwrap_or_else(|| {
            let body: String = self.nodes.iter().map(MockNode::render).collect();
            format!(
                "<html><head><title>{}</title></head><body>{body}</body></html>",
                self.title
            )
        })
    }
}

#[derive(Debug)]
struct MockState {
    pages: HashMap<String, MockPage>,
    current_url: String,
    current: MockPage,
    loaded_at: Instant,
    generation: u64,
    screenshot: Option<Vec<u8>>,
    crashed: bool,
    history: Vec<String>,
}

impl MockState {
    fn load(&mut self, url: &str) {
        self.current = self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(MockPage::not_found);
        url.clone_into(&mut self.current_url);
        self.loaded_at = Instant::now();
        self.generation += 1;
    }

    fn ensure_alive(&self) -> SmokeResult<()> {
        if self.crashed {
            Err(SmokeError::session("mock browser has crashed"))
        } else {
            Ok(())
        }
    }
}

/// In-memory browser session for tests.
///
/// Pages are keyed by exact URL; unknown URLs serve [`MockPage::not_found`].
/// Every call is recorded in [`history`](MockSession::history) as
/// `navigate:<url>`, `query:<selector>`, `clear:<node>`, `type:<node>:<text>`,
/// `click:<node>` and `follow:<url>` entries. Clones share state.
#[derive(Debug, Clone)]
pub struct MockSession {
    state: Rc<RefCell<MockState>>,
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSession {
    /// Create a session sitting on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState {
                pages: HashMap::new(),
                current_url: "about:blank".to_string(),
                current: MockPage::default(),
                loaded_at: Instant::now(),
                generation: 0,
                screenshot: Some(PNG_MAGIC.to_vec()),
                crashed: false,
                history: Vec::new(),
            })),
        }
    }

    /// Serve `page` at `url`
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, page: MockPage) -> Self {
        let _ = self.state.borrow_mut().pages.insert(url.into(), page);
        self
    }

    /// Make `screenshot` fail
    #[must_use]
    pub fn without_screenshot(self) -> Self {
        self.state.borrow_mut().screenshot = None;
        self
    }

    /// Make every subsequent call fail with a session error
    pub fn crash(&self) {
        self.state.borrow_mut().crashed = true;
    }

    /// Recorded calls, oldest first
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// Number of recorded calls equal to `entry`
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.state
            .borrow()
            .history
            .iter()
            .filter(|e| e.as_str() == entry)
            .count()
    }

    /// Check if a call starting with `prefix` was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.state
            .borrow()
            .history
            .iter()
            .any(|e| e.starts_with(prefix))
    }

    /// Value typed into the first node on the current page matching `selector`
    #[must_use]
    pub fn value_of(&self, selector: &Selector) -> Option<String> {
        self.state
            .borrow()
            .current
            .nodes
            .iter()
            .find(|n| n.matches(selector))
            .map(|n| n.value.clone())
    }

    /// Click count of the first node on the current page matching `selector`
    #[must_use]
    pub fn clicks_on(&self, selector: &Selector) -> u32 {
        self.state
            .borrow()
            .current
            .nodes
            .iter()
            .find(|n| n.matches(selector))
            .map_or(0, |n| n.clicks)
    }
}

impl Session for MockSession {
    type Element = MockElement;

    fn navigate(&self, url: &str) -> SmokeResult<()> {
        let mut state = self.state.borrow_mut();
        state.ensure_alive()?;
        state.history.push(format!("navigate:{url}"));
        state.load(url);
        Ok(())
    }

    fn current_url(&self) -> SmokeResult<String> {
        let state = self.state.borrow();
        state.ensure_alive()?;
        Ok(state.current_url.clone())
    }

    fn title(&self) -> SmokeResult<String> {
        let state = self.state.borrow();
        state.ensure_alive()?;
        Ok(state.current.title.clone())
    }

    fn page_source(&self) -> SmokeResult<String> {
        let state = self.state.borrow();
        state.ensure_alive()?;
        Ok(state.current.render())
    }

    fn screenshot(&self) -> SmokeResult<Vec<u8>> {
        let state = self.state.borrow();
        state.ensure_alive()?;
        state.screenshot.clone().ok_or_else(|| SmokeError::Screenshot {
            message: "No mock screenshot set".to_string(),
        })
    }

    fn query(&self, selector: &Selector) -> SmokeResult<Option<MockElement>> {
        let mut state = self.state.borrow_mut();
        state.ensure_alive()?;
        state.history.push(format!("query:{selector}"));

        if let Selector::Css(css) = selector {
            if css.contains(":has-text(") {
                return Err(SmokeError::invalid_selector(
                    selector,
                    "':has-text' is not a valid CSS pseudo-class",
                ));
            }
        }

        let elapsed = state.loaded_at.elapsed();
        let index = state
            .current
            .nodes
            .iter()
            .position(|n| elapsed >= n.appears_after && n.matches(selector));

        Ok(index.map(|index| MockElement {
            state: Rc::clone(&self.state),
            generation: state.generation,
            index,
        }))
    }
}

/// Element handle into a [`MockSession`] page
#[derive(Debug, Clone)]
pub struct MockElement {
    state: Rc<RefCell<MockState>>,
    generation: u64,
    index: usize,
}

impl MockElement {
    fn with_node<T>(&self, f: impl FnOnce(&mut MockState, usize) -> T) -> SmokeResult<T> {
        let mut state = self.state.borrow_mut();
        state.ensure_alive()?;
        if state.generation != self.generation {
            return Err(SmokeError::session(
                "stale element reference: page was navigated",
            ));
        }
        Ok(f(&mut *state, self.index))
    }
}

impl Element for MockElement {
    fn is_visible(&self) -> SmokeResult<bool> {
        self.with_node(|state, i| {
            let node = &state.current.nodes[i];
            node.visible && state.loaded_at.elapsed() >= node.visible_after
        })
    }

    fn text(&self) -> SmokeResult<String> {
        self.with_node(|state, i| state.current.nodes[i].text.clone())
    }

    fn clear(&self) -> SmokeResult<()> {
        self.with_node(|state, i| {
            let node = &mut state.current.nodes[i];
            node.value.clear();
            let entry = format!("clear:{}", node.label());
            state.history.push(entry);
        })
    }

    fn type_text(&self, text: &str) -> SmokeResult<()> {
        self.with_node(|state, i| {
            let node = &mut state.current.nodes[i];
            node.value.push_str(text);
            let entry = format!("type:{}:{text}", node.label());
            state.history.push(entry);
        })
    }

    fn click(&self) -> SmokeResult<()> {
        self.with_node(|state, i| {
            let node = &mut state.current.nodes[i];
            node.clicks += 1;
            let entry = format!("click:{}", node.label());
            let target = node.navigates_to.clone();
            state.history.push(entry);
            if let Some(url) = target {
                state.history.push(format!("follow:{url}"));
                state.load(&url);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_page() -> MockPage {
        MockPage::new("Login")
            .node(MockNode::new("input").attr("name", "username"))
            .node(MockNode::new("input").attr("type", "password"))
            .node(MockNode::new("button").text("Войти").navigates_to("http://app/home"))
    }

    mod mock_node_tests {
        use super::*;

        #[test]
        fn test_attribute_matching() {
            let node = MockNode::new("input").attr("name", "email").attr("type", "email");
            assert!(node.matches(&Selector::input_name("email")));
            assert!(node.matches(&Selector::input_type("email")));
            assert!(!node.matches(&Selector::input_type("text")));
            assert!(!node.matches(&Selector::button_type("email")));
        }

        #[test]
        fn test_class_matching_respects_ancestor() {
            let node = MockNode::new("span").attr("class", "brand app-title");
            assert!(node.matches(&Selector::class("app-title")));
            assert!(!node.matches(&Selector::class_within("header", "app-title")));
            let nested = node.within("header");
            assert!(nested.matches(&Selector::class_within("header", "app-title")));
        }

        #[test]
        fn test_href_and_text_matching() {
            let link = MockNode::new("a").attr("href", "/signin?next=/").text("Войти");
            assert!(link.matches(&Selector::href_contains("signin")));
            assert!(!link.matches(&Selector::href_contains("login")));
            assert!(link.matches(&Selector::text("a", "Войти")));
            assert!(!link.matches(&Selector::text("button", "Войти")));
        }

        #[test]
        fn test_text_matching_collapses_whitespace() {
            let button = MockNode::new("button").text("\n  Sign\n     in  ");
            assert!(button.matches(&Selector::text("button", "Sign in")));
        }

        #[test]
        fn test_label_prefers_test_id() {
            let node = MockNode::new("input")
                .attr("name", "username")
                .attr("data-testid", "login-username");
            assert_eq!(node.label(), "input[data-testid=login-username]");
            assert_eq!(MockNode::new("button").label(), "button");
        }
    }

    mod mock_session_tests {
        use super::*;

        #[test]
        fn test_navigate_records_history_and_serves_page() {
            let session = MockSession::new().with_page("http://app/login", login_page());
            session.navigate("http://app/login").unwrap();
            assert_eq!(session.title().unwrap(), "Login");
            assert_eq!(session.current_url().unwrap(), "http://app/login");
            assert_eq!(session.count("navigate:http://app/login"), 1);
        }

        #[test]
        fn test_unknown_route_is_not_found() {
            let session = MockSession::new();
            session.navigate("http://app/missing").unwrap();
            assert!(session.title().unwrap().contains("404"));
            assert!(session.page_source().unwrap().contains("Not Found"));
        }

        #[test]
        fn test_query_and_type() {
            let session = MockSession::new().with_page("http://app/login", login_page());
            session.navigate("http://app/login").unwrap();
            let user = session
                .query(&Selector::input_name("username"))
                .unwrap()
                .unwrap();
            assert!(user.is_visible().unwrap());
            user.type_text("abc").unwrap();
            user.clear().unwrap();
            user.type_text("admin").unwrap();
            assert_eq!(
                session.value_of(&Selector::input_name("username")),
                Some("admin".to_string())
            );
        }

        #[test]
        fn test_query_missing_returns_none() {
            let session = MockSession::new().with_page("http://app/login", login_page());
            session.navigate("http://app/login").unwrap();
            assert!(session
                .query(&Selector::test_id("login-username"))
                .unwrap()
                .is_none());
            assert!(session.was_called("query:[data-testid"));
        }

        #[test]
        fn test_has_text_css_is_invalid() {
            let session = MockSession::new();
            let err = session
                .query(&Selector::css("button:has-text(\"Войти\")"))
                .unwrap_err();
            assert!(matches!(err, SmokeError::InvalidSelector { .. }));
        }

        #[test]
        fn test_click_follows_link_and_invalidates_handles() {
            let session = MockSession::new().with_page("http://app/login", login_page());
            session.navigate("http://app/login").unwrap();
            let button = session.query(&Selector::tag("button")).unwrap().unwrap();
            let user = session
                .query(&Selector::input_name("username"))
                .unwrap()
                .unwrap();
            button.click().unwrap();
            assert_eq!(session.current_url().unwrap(), "http://app/home");
            assert!(session.was_called("follow:http://app/home"));
            assert!(user.text().is_err());
        }

        #[test]
        fn test_delayed_visibility() {
            let page = MockPage::new("Slow").node(
                MockNode::new("h1")
                    .attr("class", "app-title")
                    .visible_after(Duration::from_millis(40)),
            );
            let session = MockSession::new().with_page("http://app/", page);
            session.navigate("http://app/").unwrap();
            let title = session.query(&Selector::class("app-title")).unwrap().unwrap();
            assert!(!title.is_visible().unwrap());
            std::thread::sleep(Duration::from_millis(60));
            assert!(title.is_visible().unwrap());
        }

        #[test]
        fn test_crash_fails_everything() {
            let session = MockSession::new();
            session.crash();
            assert!(matches!(
                session.navigate("http://app/").unwrap_err(),
                SmokeError::Session { .. }
            ));
            assert!(session.screenshot().is_err());
        }

        #[test]
        fn test_screenshot_default_and_disabled() {
            assert_eq!(MockSession::new().screenshot().unwrap(), PNG_MAGIC.to_vec());
            assert!(matches!(
                MockSession::new().without_screenshot().screenshot(),
                Err(SmokeError::Screenshot { .. })
            ));
        }

        #[test]
        fn test_synthesized_source_contains_nodes() {
            let session = MockSession::new().with_page("http://app/login", login_page());
            session.navigate("http://app/login").unwrap();
            let source = session.page_source().unwrap();
            assert!(source.contains("<title>Login</title>"));
            assert!(source.contains("name=\"username\""));
        }
    }
}
