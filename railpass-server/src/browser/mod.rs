//! Browser automation.
//!
//! The search session drives the booking site through [`BrowserDriver`].
//! Two drivers exist: [`WebDriverClient`], which speaks the W3C WebDriver
//! protocol to a real browser, and [`FixtureDriver`], which serves scripted
//! pages for tests and offline use. [`SharedBrowser`] holds the one browser
//! the process owns.

mod error;
mod fixture;
mod shared;
mod webdriver;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use error::DriverError;
pub use fixture::{FixtureDriver, FixtureNode, FixturePage, FixtureScript};
pub use shared::{BrowserGuard, SharedBrowser};
pub use webdriver::{WebDriverClient, WebDriverConfig};

/// How to find an element on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    XPath(String),
    Css(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }
}

/// Opaque handle to an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub String);

/// The operations the search session needs from a browser.
///
/// Element lookups return `Ok(None)` when nothing matches; errors are
/// reserved for transport failures and stale references.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    /// Find the first match, searching inside `scope` when given.
    async fn find(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Option<ElementRef>, DriverError>;

    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError>;

    async fn text(&mut self, element: &ElementRef) -> Result<String, DriverError>;

    async fn click(&mut self, element: &ElementRef) -> Result<(), DriverError>;

    /// Replace the contents of an input with `text`.
    async fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError>;

    /// Read a value from the page's session or local storage.
    async fn read_client_storage(&mut self, key: &str) -> Result<Option<String>, DriverError>;

    async fn run_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, DriverError>;

    /// Poll until `locator` matches or `timeout` elapses.
    ///
    /// A timeout is `Ok(None)`, not an error.
    async fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
        poll: Duration,
    ) -> Result<Option<ElementRef>, DriverError> {
        let attempt = async {
            loop {
                if let Some(element) = self.find(None, locator).await? {
                    return Ok::<_, DriverError>(element);
                }
                tokio::time::sleep(poll).await;
            }
        };
        match tokio::time::timeout(timeout, attempt).await {
            Ok(found) => found.map(Some),
            Err(_) => Ok(None),
        }
    }

    /// End the browser session.
    async fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[async_trait]
impl<T: BrowserDriver + ?Sized> BrowserDriver for Box<T> {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        (**self).navigate(url).await
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        (**self).current_url().await
    }

    async fn find(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Option<ElementRef>, DriverError> {
        (**self).find(scope, locator).await
    }

    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError> {
        (**self).find_all(scope, locator).await
    }

    async fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        (**self).text(element).await
    }

    async fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        (**self).click(element).await
    }

    async fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        (**self).type_text(element, text).await
    }

    async fn read_client_storage(&mut self, key: &str) -> Result<Option<String>, DriverError> {
        (**self).read_client_storage(key).await
    }

    async fn run_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        (**self).run_script(script, args).await
    }

    async fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
        poll: Duration,
    ) -> Result<Option<ElementRef>, DriverError> {
        (**self).wait_for(locator, timeout, poll).await
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        (**self).close().await
    }
}
