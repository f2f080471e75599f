//! Remote icon sources.

use std::time::Duration;

use ureq::Agent;

/// One icon that could not be resolved.
#[derive(Debug, thiserror::Error)]
#[error("icon `{name}`: {kind}")]
pub struct IconError {
    pub name: String,
    pub kind: IconErrorKind,
}

impl IconError {
    pub fn new(name: impl Into<String>, kind: IconErrorKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IconErrorKind {
    #[error("invalid icon name")]
    InvalidName,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("response is not SVG markup")]
    NotSvg,
    #[error("not in the icon cache and fetching is disabled")]
    Offline,
    #[error("I/O error: {0}")]
    Io(String),
}

/// Fetches raw icon markup by remote name.
pub trait IconSource: Send + Sync {
    fn fetch(&self, remote: &str) -> Result<String, IconErrorKind>;
}

/// `GET <endpoint><name>.svg` over a shared agent.
pub struct HttpIconSource {
    agent: Agent,
    endpoint: String,
}

impl HttpIconSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.to_string(),
        }
    }

    fn url(&self, remote: &str) -> String {
        if self.endpoint.ends_with('/') {
            format!("{}{remote}.svg", self.endpoint)
        } else {
            format!("{}/{remote}.svg", self.endpoint)
        }
    }
}

impl IconSource for HttpIconSource {
    fn fetch(&self, remote: &str) -> Result<String, IconErrorKind> {
        let response = self
            .agent
            .get(&self.url(remote))
            .call()
            .map_err(|e| IconErrorKind::Http(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(IconErrorKind::Status(status));
        }

        response
            .into_body()
            .read_to_string()
            .map_err(|e| IconErrorKind::Http(e.to_string()))
    }
}

/// Never reaches the network; every cache miss fails.
pub struct OfflineSource;

impl IconSource for OfflineSource {
    fn fetch(&self, _remote: &str) -> Result<String, IconErrorKind> {
        Err(IconErrorKind::Offline)
    }
}

/// Icon names become file names; reject anything that could escape the
/// cache directory.
pub fn validate_name(name: &str) -> Result<(), IconErrorKind> {
    let bad = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains(['/', '\\', '\0']);
    if bad { Err(IconErrorKind::InvalidName) } else { Ok(()) }
}

/// Loose check that a body is SVG markup rather than an error page.
pub fn looks_like_svg(markup: &str) -> bool {
    markup.contains("<svg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("sun").is_ok());
        assert!(validate_name("arrow-big-up").is_ok());
        for bad in ["", ".", "..", "../etc", "a/b", "a\\b"] {
            assert!(validate_name(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_url_join() {
        let source = HttpIconSource::new("https://icons.test/icons/", Duration::from_secs(1));
        assert_eq!(source.url("sun"), "https://icons.test/icons/sun.svg");

        let source = HttpIconSource::new("https://icons.test/icons", Duration::from_secs(1));
        assert_eq!(source.url("sun"), "https://icons.test/icons/sun.svg");
    }

    #[test]
    fn test_offline_never_resolves() {
        assert!(matches!(OfflineSource.fetch("sun"), Err(IconErrorKind::Offline)));
    }

    #[test]
    fn test_looks_like_svg() {
        assert!(looks_like_svg("<svg xmlns=\"http://www.w3.org/2000/svg\"></svg>"));
        assert!(!looks_like_svg("404: Not Found"));
    }
}
