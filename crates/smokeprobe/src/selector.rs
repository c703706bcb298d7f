//! Selector candidates and fallback lists.
//!
//! A [`Selector`] is one way of finding a control. A [`SelectorList`] is the
//! ordered fallback chain for one logical control: explicit test hooks first,
//! semantic attributes next, generic tags last. Drivers evaluate selectors
//! through [`Session::query`](crate::Session::query); nothing here assumes a
//! particular engine's syntax except [`Selector::Css`], the raw escape hatch.

use std::fmt;

/// Label of the sign-in control in the application under test
pub const DEFAULT_SIGN_IN_TEXT: &str = "Войти";

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Test hook (`data-testid` attribute)
    TestId(String),
    /// `name` attribute on a tag, e.g. `input[name="username"]`
    Name {
        /// Tag name
        tag: String,
        /// Attribute value
        value: String,
    },
    /// `type` attribute on a tag, e.g. `button[type="submit"]`
    Type {
        /// Tag name
        tag: String,
        /// Attribute value
        value: String,
    },
    /// Link whose `href` contains a fragment, e.g. `a[href*="login"]`
    HrefContains(String),
    /// Class, optionally under an ancestor tag, e.g. `header .app-title`
    Class {
        /// Ancestor tag the element must sit under
        ancestor: Option<String>,
        /// Class name
        class: String,
    },
    /// Element of a tag whose text contains a string
    Text {
        /// Tag name
        tag: String,
        /// Text to match
        text: String,
    },
    /// Any element with a tag
    Tag(String),
    /// Raw CSS passed to the driver untouched
    Css(String),
}

impl Selector {
    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// `input[name="..."]`
    #[must_use]
    pub fn input_name(value: impl Into<String>) -> Self {
        Self::Name {
            tag: "input".to_string(),
            value: value.into(),
        }
    }

    /// `input[type="..."]`
    #[must_use]
    pub fn input_type(value: impl Into<String>) -> Self {
        Self::Type {
            tag: "input".to_string(),
            value: value.into(),
        }
    }

    /// `button[type="..."]`
    #[must_use]
    pub fn button_type(value: impl Into<String>) -> Self {
        Self::Type {
            tag: "button".to_string(),
            value: value.into(),
        }
    }

    /// `a[href*="..."]`
    #[must_use]
    pub fn href_contains(fragment: impl Into<String>) -> Self {
        Self::HrefContains(fragment.into())
    }

    /// `.class`
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Self::Class {
            ancestor: None,
            class: class.into(),
        }
    }

    /// `ancestor .class`
    #[must_use]
    pub fn class_within(ancestor: impl Into<String>, class: impl Into<String>) -> Self {
        Self::Class {
            ancestor: Some(ancestor.into()),
            class: class.into(),
        }
    }

    /// Element of `tag` whose text contains `text`
    #[must_use]
    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// Any element with `tag`
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self::Tag(tag.into())
    }

    /// Raw CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// CSS form of this selector, or `None` when CSS cannot express it
    #[must_use]
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::TestId(id) => Some(format!("[data-testid={}]", css_string(id))),
            Self::Name { tag, value } => Some(format!("{tag}[name={}]", css_string(value))),
            Self::Type { tag, value } => Some(format!("{tag}[type={}]", css_string(value))),
            Self::HrefContains(fragment) => Some(format!("a[href*={}]", css_string(fragment))),
            Self::Class {
                ancestor: Some(ancestor),
                class,
            } => Some(format!("{ancestor} .{class}")),
            Self::Class {
                ancestor: None,
                class,
            } => Some(format!(".{class}")),
            Self::Text { .. } => None,
            Self::Tag(tag) => Some(tag.clone()),
            Self::Css(css) => Some(css.clone()),
        }
    }

    /// XPath form, used for text matching which CSS cannot express
    #[must_use]
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            Self::Text { tag, text } => Some(format!(
                "//{tag}[contains(normalize-space(string(.)), {})]",
                xpath_literal(text)
            )),
            _ => None,
        }
    }

    /// JavaScript expression evaluating to the first match or `null`.
    ///
    /// Text matches run on whitespace-normalised content, same as
    /// [`Selector::to_xpath`].
    ///
    /// Invalid CSS makes `querySelector` throw, which drivers report as
    /// [`SmokeError::InvalidSelector`](crate::SmokeError::InvalidSelector).
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Text { tag, text } => format!(
                "Array.from(document.querySelectorAll({})).find(el => el.textContent.replace(/\\s+/g, ' ').trim().includes({}))",
                js_string(tag),
                js_string(text)
            ),
            other => {
                let css = other.to_css().unwrap_or_default();
                format!("document.querySelector({})", js_string(&css))
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { tag, text } => write!(f, "{tag} with text {text:?}"),
            other => write!(f, "{}", other.to_css().unwrap_or_default()),
        }
    }
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Collapse whitespace runs and trim, as XPath `normalize-space` does
pub(crate) fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    let parts: Vec<String> = value.split('"').map(|p| format!("\"{p}\"")).collect();
    format!("concat({})", parts.join(", '\"', "))
}

/// Ordered fallback chain of selectors for one logical control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    name: String,
    candidates: Vec<Selector>,
}

impl SelectorList {
    /// Create a named list; order is preference order
    #[must_use]
    pub fn new(name: impl Into<String>, candidates: Vec<Selector>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }

    /// Logical control this list finds
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidates in preference order
    #[must_use]
    pub fn candidates(&self) -> &[Selector] {
        &self.candidates
    }

    /// Number of candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the list has no candidates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Iterate candidates in order
    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.candidates.iter()
    }

    /// Username / login field
    #[must_use]
    pub fn username_field() -> Self {
        Self::new(
            "username field",
            vec![
                Selector::test_id("login-username"),
                Selector::input_name("username"),
                Selector::input_name("login"),
                Selector::input_name("email"),
                Selector::input_type("email"),
                Selector::input_type("text"),
            ],
        )
    }

    /// Password field
    #[must_use]
    pub fn password_field() -> Self {
        Self::new(
            "password field",
            vec![
                Selector::test_id("login-password"),
                Selector::input_name("password"),
                Selector::input_type("password"),
            ],
        )
    }

    /// Submit control; `sign_in_text` is the visible label of the button
    #[must_use]
    pub fn submit_control(sign_in_text: &str) -> Self {
        Self::new(
            "submit control",
            vec![
                Selector::test_id("login-submit"),
                Selector::button_type("submit"),
                Selector::text("button", sign_in_text),
                Selector::tag("button"),
            ],
        )
    }

    /// Entry point on a landing page that leads to the login form
    #[must_use]
    pub fn sign_in_entry(sign_in_text: &str) -> Self {
        Self::new(
            "sign-in entry",
            vec![
                Selector::test_id("login-entry"),
                Selector::href_contains("login"),
                Selector::href_contains("signin"),
                Selector::text("a", sign_in_text),
                Selector::text("button", sign_in_text),
            ],
        )
    }

    /// Header / app title that only renders after login
    #[must_use]
    pub fn app_landmark() -> Self {
        Self::new(
            "post-login landmark",
            vec![
                Selector::class_within("header", "app-title"),
                Selector::class("app-title"),
                Selector::test_id("app-title"),
            ],
        )
    }
}

impl<'a> IntoIterator for &'a SelectorList {
    type Item = &'a Selector;
    type IntoIter = std::slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}
