//! Browser driver error types.

use std::fmt;

/// Errors from a browser driver.
#[derive(Debug)]
pub enum DriverError {
    /// HTTP request to the WebDriver endpoint failed
    Http(reqwest::Error),

    /// The WebDriver endpoint answered with a protocol error
    Protocol {
        status: u16,
        error: String,
        message: String,
    },

    /// No browser session could be started
    SessionNotCreated(String),

    /// An element reference no longer points at the current page
    StaleElement,

    /// A scripted fixture could not serve the request
    Fixture { message: String },
}

impl DriverError {
    pub(crate) fn fixture(message: impl Into<String>) -> Self {
        DriverError::Fixture {
            message: message.into(),
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Http(e) => write!(f, "HTTP error: {e}"),
            DriverError::Protocol {
                status,
                error,
                message,
            } => write!(f, "WebDriver error {status} ({error}): {message}"),
            DriverError::SessionNotCreated(msg) => {
                write!(f, "could not start a browser session: {msg}")
            }
            DriverError::StaleElement => write!(f, "element is no longer attached to the page"),
            DriverError::Fixture { message } => write!(f, "fixture error: {message}"),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DriverError {
    fn from(err: reqwest::Error) -> Self {
        DriverError::Http(err)
    }
}
