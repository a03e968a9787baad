use std::time::Duration;

use url::Url;

/// Where the UI must go next.
///
/// Session operations return this instead of navigating themselves, so the
/// host (the axum shell, a desktop webview, a test) decides how to apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "the navigation is the terminal action of the operation"]
pub enum Navigation {
    /// Leave the app for an external page (the provider login).
    External(Url),
    /// Full reload of an in-app route. Any query string is dropped.
    Reload(String),
    /// Go to an in-app route once the delay has passed.
    Delayed { to: String, after: Duration },
}

impl Navigation {
    /// Target path or URL.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::External(url) => url.as_str(),
            Self::Reload(to) | Self::Delayed { to, .. } => to,
        }
    }
}
