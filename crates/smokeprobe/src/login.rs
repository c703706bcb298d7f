//! Login form driver.
//!
//! Finds the username, password and submit controls through their fallback
//! lists, fills the fields and clicks submit. One pass, no retry: a failed
//! locate has already been captured by the locator and is returned as is.

use std::time::Duration;

use crate::locator::Locator;
use crate::result::SmokeResult;
use crate::selector::{SelectorList, DEFAULT_SIGN_IN_TEXT};
use crate::session::{Element, Session};
use crate::wait::DEFAULT_TIMEOUT_MS;

/// Selector lists for the three login controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Username / login / email field
    pub username: SelectorList,
    /// Password field
    pub password: SelectorList,
    /// Submit control
    pub submit: SelectorList,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new(DEFAULT_SIGN_IN_TEXT)
    }
}

impl LoginForm {
    /// Standard lists; `sign_in_text` is the label of the submit button
    #[must_use]
    pub fn new(sign_in_text: &str) -> Self {
        Self {
            username: SelectorList::username_field(),
            password: SelectorList::password_field(),
            submit: SelectorList::submit_control(sign_in_text),
        }
    }
}

/// Fills and submits a [`LoginForm`]
#[derive(Debug, Clone)]
pub struct LoginFlow {
    form: LoginForm,
    timeout: Duration,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self::new(LoginForm::default())
    }
}

impl LoginFlow {
    /// Flow over `form` with the default per-candidate timeout
    #[must_use]
    pub fn new(form: LoginForm) -> Self {
        Self {
            form,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Set the per-candidate locate timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The form's selector lists
    #[must_use]
    pub const fn form(&self) -> &LoginForm {
        &self.form
    }

    /// Fill username and password, then click submit.
    pub fn login_with<S: Session>(
        &self,
        locator: &Locator<'_, S>,
        username: &str,
        password: &str,
    ) -> SmokeResult<()> {
        let user = locator.locate(&self.form.username, self.timeout)?;
        user.clear()?;
        user.type_text(username)?;

        let pass = locator.locate(&self.form.password, self.timeout)?;
        pass.clear()?;
        pass.type_text(password)?;

        let submit = locator.locate(&self.form.submit, self.timeout)?;
        submit.click()?;

        tracing::info!(username, "submitted login form");
        Ok(())
    }
}
