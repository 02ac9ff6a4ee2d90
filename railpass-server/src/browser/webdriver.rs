//! W3C WebDriver client.
//!
//! Talks to chromedriver, geckodriver or a Selenium server over the
//! WebDriver HTTP protocol. One client owns one browser session.

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{BrowserDriver, DriverError, ElementRef, Locator};

/// Default WebDriver endpoint (chromedriver's default port).
const DEFAULT_ENDPOINT: &str = "http://localhost:9515";

/// Key under which the protocol returns element references.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const READ_STORAGE_SCRIPT: &str =
    "return window.sessionStorage.getItem(arguments[0]) ?? window.localStorage.getItem(arguments[0]);";

/// Configuration for the WebDriver client.
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// WebDriver server URL
    pub endpoint: String,
    /// Browser to request in the session capabilities
    pub browser_name: String,
    /// Run without a visible window
    pub headless: bool,
    /// Per-command HTTP timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            browser_name: "chrome".to_string(),
            headless: true,
            timeout_secs: 30,
        }
    }
}

impl WebDriverConfig {
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    pub fn with_browser(mut self, name: impl Into<String>) -> Self {
        self.browser_name = name.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Session capabilities for the configured browser.
    fn capabilities(&self) -> Value {
        let mut args = vec!["--window-size=1400,1000", "--disable-gpu"];
        if self.headless {
            args.push("--headless=new");
        }

        let mut always_match = json!({ "browserName": self.browser_name });
        match self.browser_name.as_str() {
            "chrome" => always_match["goog:chromeOptions"] = json!({ "args": args }),
            "firefox" if self.headless => {
                always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] })
            }
            _ => {}
        }

        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

/// Envelope around every WebDriver response.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

/// Error payload inside the envelope.
#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// A browser session driven over the WebDriver protocol.
#[derive(Debug)]
pub struct WebDriverClient {
    http: reqwest::Client,
    endpoint: String,
    session_id: String,
}

impl WebDriverClient {
    /// Start a new browser session.
    pub async fn connect(config: WebDriverConfig) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        let endpoint = config.endpoint.trim_end_matches('/').to_string();

        let value = send(
            &http,
            Method::POST,
            &format!("{endpoint}/session"),
            Some(config.capabilities()),
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::SessionNotCreated("response had no sessionId".into()))?
            .to_string();

        info!(%endpoint, session = %session_id, "browser session started");
        Ok(Self {
            http,
            endpoint,
            session_id,
        })
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, DriverError> {
        let url = format!("{}/session/{}{}", self.endpoint, self.session_id, path);
        send(&self.http, method, &url, body).await
    }

    async fn find_from(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
        many: bool,
    ) -> Result<Value, DriverError> {
        let suffix = if many { "elements" } else { "element" };
        let path = match scope {
            Some(parent) => format!("/element/{}/{}", parent.0, suffix),
            None => format!("/{suffix}"),
        };
        self.command(Method::POST, &path, Some(locator_body(locator)))
            .await
    }
}

#[async_trait]
impl BrowserDriver for WebDriverClient {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!(url, "navigating");
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        let value = self.command(Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Option<ElementRef>, DriverError> {
        match self.find_from(scope, locator, false).await {
            Ok(value) => element_from_value(&value).map(Some),
            Err(e) if is_no_such_element(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn find_all(
        &mut self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>, DriverError> {
        let value = self.find_from(scope, locator, true).await?;
        value
            .as_array()
            .map(|items| items.iter().map(element_from_value).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn text(&mut self, element: &ElementRef) -> Result<String, DriverError> {
        let value = self
            .command(Method::GET, &format!("/element/{}/text", element.0), None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn click(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/click", element.0),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    async fn type_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.command(
            Method::POST,
            &format!("/element/{}/clear", element.0),
            Some(json!({})),
        )
        .await?;
        self.command(
            Method::POST,
            &format!("/element/{}/value", element.0),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    async fn read_client_storage(&mut self, key: &str) -> Result<Option<String>, DriverError> {
        let value = self
            .run_script(READ_STORAGE_SCRIPT, vec![Value::from(key)])
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn run_script(&mut self, script: &str, args: Vec<Value>) -> Result<Value, DriverError> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        info!(session = %self.session_id, "closing browser session");
        self.command(Method::DELETE, "", None).await?;
        Ok(())
    }
}

async fn send(
    http: &reqwest::Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<Value, DriverError> {
    let mut request = http.request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let wire: WireResponse = response.json().await?;

    if status.is_success() {
        return Ok(wire.value);
    }

    let err: WireError = serde_json::from_value(wire.value).unwrap_or(WireError {
        error: "unknown error".to_string(),
        message: String::new(),
    });
    Err(protocol_error(status.as_u16(), err))
}

fn protocol_error(status: u16, err: WireError) -> DriverError {
    match err.error.as_str() {
        "stale element reference" => DriverError::StaleElement,
        "session not created" => DriverError::SessionNotCreated(err.message),
        _ => DriverError::Protocol {
            status,
            error: err.error,
            message: err.message,
        },
    }
}

fn is_no_such_element(err: &DriverError) -> bool {
    matches!(err, DriverError::Protocol { error, .. } if error == "no such element")
}

fn locator_body(locator: &Locator) -> Value {
    let (using, value) = match locator {
        Locator::XPath(expr) => ("xpath", expr),
        Locator::Css(selector) => ("css selector", selector),
    };
    json!({ "using": using, "value": value })
}

fn element_from_value(value: &Value) -> Result<ElementRef, DriverError> {
    value
        .get(ELEMENT_KEY)
        .and_then(Value::as_str)
        .map(|id| ElementRef(id.to_string()))
        .ok_or_else(|| DriverError::Protocol {
            status: 200,
            error: "invalid response".into(),
            message: format!("expected an element reference, got {value}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_bodies() {
        assert_eq!(
            locator_body(&Locator::xpath("//div")),
            json!({ "using": "xpath", "value": "//div" })
        );
        assert_eq!(
            locator_body(&Locator::css("div.row")),
            json!({ "using": "css selector", "value": "div.row" })
        );
    }

    #[test]
    fn element_references() {
        let value = json!({ ELEMENT_KEY: "abc-123" });
        assert_eq!(
            element_from_value(&value).unwrap(),
            ElementRef("abc-123".into())
        );
        assert!(element_from_value(&json!({ "id": "x" })).is_err());
    }

    #[test]
    fn protocol_errors_are_classified() {
        let stale = protocol_error(
            404,
            WireError {
                error: "stale element reference".into(),
                message: String::new(),
            },
        );
        assert!(matches!(stale, DriverError::StaleElement));

        let missing = protocol_error(
            404,
            WireError {
                error: "no such element".into(),
                message: "nothing".into(),
            },
        );
        assert!(is_no_such_element(&missing));

        let other = protocol_error(
            500,
            WireError {
                error: "unknown error".into(),
                message: "boom".into(),
            },
        );
        assert!(!is_no_such_element(&other));
    }

    #[test]
    fn headless_chrome_capabilities() {
        let caps = WebDriverConfig::default().capabilities();
        let always = &caps["capabilities"]["alwaysMatch"];
        assert_eq!(always["browserName"], "chrome");
        let args = always["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));

        let visible = WebDriverConfig::default()
            .with_headless(false)
            .capabilities();
        let args = visible["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[test]
    fn config_builders() {
        let config = WebDriverConfig::default()
            .with_endpoint("http://selenium:4444/wd/hub")
            .with_browser("firefox")
            .with_timeout(5);
        assert_eq!(config.endpoint, "http://selenium:4444/wd/hub");
        assert_eq!(config.timeout_secs, 5);
        let caps = config.capabilities();
        assert_eq!(
            caps["capabilities"]["alwaysMatch"]["moz:firefoxOptions"]["args"][0],
            "-headless"
        );
    }
}
