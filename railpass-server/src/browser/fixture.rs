//! Scripted in-memory browser.
//!
//! Serves a fixed set of pages described as element trees. Clicking an
//! element may switch to another page, so a whole search flow can be
//! replayed without a browser. Used by tests and by offline mode.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{BrowserDriver, DriverError, ElementRef, Locator};

const BLANK_URL: &str = "about:blank";

/// A scripted site: named pages plus the page each URL lands on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureScript {
    #[serde(default)]
    pub landing: BTreeMap<String, String>,
    #[serde(default)]
    pub pages: BTreeMap<String, FixturePage>,
}

impl FixtureScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, name: impl Into<String>, page: FixturePage) -> Self {
        self.pages.insert(name.into(), page);
        self
    }

    pub fn landing(mut self, url: impl Into<String>, page: impl Into<String>) -> Self {
        self.landing.insert(url.into(), page.into());
        self
    }
}

/// One page state: its element tree and client storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixturePage {
    #[serde(default)]
    pub elements: Vec<FixtureNode>,
    #[serde(default)]
    pub storage: BTreeMap<String, String>,
}

impl FixturePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(mut self, node: FixtureNode) -> Self {
        self.elements.push(node);
        self
    }

    pub fn storage(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.storage.insert(key.into(), value.into());
        self
    }
}

/// An element matched by exact locator equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureNode {
    pub locator: Locator,
    #[serde(default)]
    pub text: String,
    /// Page shown after this element is clicked.
    #[serde(default)]
    pub on_click: Option<String>,
    #[serde(default)]
    pub children: Vec<FixtureNode>,
}

impl FixtureNode {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            text: String::new(),
            on_click: None,
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn leads_to(mut self, page: impl Into<String>) -> Self {
        self.on_click = Some(page.into());
        self
    }

    pub fn child(mut self, node: FixtureNode) -> Self {
        self.children.push(node);
        self
    }
}

/// A [`BrowserDriver`] replaying a [`FixtureScript`].
///
/// Element references name the page they were found on, so references from
/// an earlier page are reported stale just like in a real browser.
#[derive(Debug)]
pub struct FixtureDriver {
    script: FixtureScript,
    url: String,
    page: Option<String>,
    typed: Vec<(Locator, String)>,
    scripts: Vec<String>,
    navigations: usize,
}

impl FixtureDriver {
    pub fn new(script: FixtureScript) -> Self {
        Self {
            script,
            url: BLANK_URL.to_string(),
            page: None,
            typed: Vec::new(),
            scripts: Vec::new(),
            navigations: 0,
        }
    }

    /// Load a script from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DriverError::fixture(format!("failed to read {}: {e}", path.display())))?;
        let script: FixtureScript = serde_json::from_str(&json)
            .map_err(|e| DriverError::fixture(format!("failed to parse {}: {e}", path.display())))?;
        Ok(Self::new(script))
    }

    /// Text typed into inputs so far, with the input's locator.
    pub fn typed(&self) -> &[(Locator, String)] {
        &self.typed
    }

    /// Scripts run so far.
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Number of `navigate` calls so far.
    pub fn navigations(&self) -> usize {
        self.navigations
    }

    /// Name of the page currently shown.
    pub fn current_page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    fn current(&self) -> Option<(&str, &FixturePage)> {
        let name = self.page.as_deref()?;
        self.script.pages.get(name).map(|page| (name, page))
    }

    fn resolve(&self, element: &ElementRef) -> Result<&FixtureNode, DriverError> {
        let (page_name, path) = element
            .0
            .rsplit_once('#')
            .ok_or_else(|| DriverError::fixture(format!("malformed element id {}", element.0)))?;
        let (current_name, page) = self.current().ok_or(DriverError::StaleElement)?;
        if page_name != current_name {
            return Err(DriverError::StaleElement);
        }

        let mut nodes = &page.elements;
        let mut found = None;
        for part in path.split('.') {
            let index: usize = part
                .parse()
                .map_err(|_| DriverError::fixture(format!("malformed element id {}", element.0)))?;
            let node = nodes.get(index).ok_or(DriverError::StaleElement)?;
            nodes = &node.children;
            found = Some(node);
        }
        found.ok_or(DriverError::StaleElement)
    }

    /// Depth-first matches below `scope` (or the whole page), as element ids.
    fn matches(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
        first_only: bool,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let Some((page_name, page)) = self.current() else {
            return Ok(Vec::new());
        };

        let (roots, prefix) = match scope {
            Some(element) => {
                let node = self.resolve(element)?;
                let path = element.0.rsplit_once('#').map_or("", |(_, p)| p);
                (&node.children, format!("{path}."))
            }
            None => (&page.elements, String::new()),
        };

        let mut out = Vec::new();
        collect_matches(roots, &prefix, locator, first_only, &mut out);
        Ok(out
            .into_iter()
            .map(|path| ElementRef(format!("{page_name}#{path}")))
            .collect())
    }
}

fn collect_matches(
    nodes: &[FixtureNode],
    prefix: &str,
    locator: &Locator,
    first_only: bool,
    out: &mut Vec<String>,
) {
    for (i, node) in nodes.iter().enumerate() {
        if first_only && !out.is_empty() {
            return;
        }
        let path = format!("{prefix}{i}");
        if node.locator == *locator {
            out.push(path.clone());
        }
        collect_matches(&node.children, &format!("{path}."), locator, first_only, out);
    }
}

#[async_trait]
impl BrowserDriver for FixtureDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        let page = self
            .script
            .landing
            .get(url)
            .ok_or_else(|| DriverError::fixture(format!("no page scripted for {url}")))?
            .clone();
        debug!(url, page = %page, "fixture navigation");
        self.url = url.to_string();
        self.page = Some(page);
        self.navigations += 1;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    async fn find(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Option<ElementRef>, DriverError> {
        Ok(self.matches(scope, locator, true)?.into_iter().next())
    }

    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError> {
        self.matches(scope, locator, false)
    }

    async fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        Ok(self.resolve(element)?.text.clone())
    }

    async fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        let target = self.resolve(element)?.on_click.clone();
        if let Some(page) = target {
            if !self.script.pages.contains_key(&page) {
                return Err(DriverError::fixture(format!("click leads to unknown page {page}")));
            }
            debug!(page = %page, "fixture click");
            self.page = Some(page);
        }
        Ok(())
    }

    async fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        let locator = self.resolve(element)?.locator.clone();
        self.typed.push((locator, text.to_string()));
        Ok(())
    }

    async fn read_client_storage(&mut self, key: &str) -> Result<Option<String>, DriverError> {
        Ok(self
            .current()
            .and_then(|(_, page)| page.storage.get(key).cloned()))
    }

    async fn run_script(&mut self, script: &str, _args: Vec<Value>) -> Result<Value, DriverError> {
        self.scripts.push(script.to_string());
        Ok(Value::Null)
    }
}
