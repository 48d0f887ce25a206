//! Instance identifiers.

use serde::Serialize;
use std::fmt;
use url::Url;

/// Error returned when user input does not name a usable instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceError {
    /// Nothing but whitespace was supplied.
    #[error("instance URL is empty")]
    Empty,
    /// Input does not parse as a URL.
    #[error("'{0}' is not a valid URL")]
    Invalid(String),
    /// Scheme other than http or https.
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    /// URL without a host.
    #[error("'{0}' has no host")]
    MissingHost(String),
}

/// Origin URL of a remote server, e.g. `https://example.social`.
///
/// Always scheme + host (+ non-default port), never a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Instance(String);

impl Instance {
    /// Parse and normalise user input.
    ///
    /// A missing scheme defaults to `https`. Any path, query or fragment is
    /// dropped.
    pub fn parse(input: &str) -> Result<Self, InstanceError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InstanceError::Empty);
        }

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        let url =
            Url::parse(&candidate).map_err(|_| InstanceError::Invalid(trimmed.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(InstanceError::UnsupportedScheme(other.to_string())),
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(InstanceError::MissingHost(trimmed.to_string()));
        }

        Ok(Self(url.origin().ascii_serialization()))
    }

    /// The normalised origin.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host part, used for logging.
    #[must_use]
    pub fn host(&self) -> &str {
        self.0
            .split_once("://")
            .map_or(self.0.as_str(), |(_, host)| host)
    }

    /// Build an endpoint URL from path segments.
    ///
    /// Each segment is percent-encoded, so caller-supplied ids cannot escape
    /// their position in the path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.0)?;
        url.path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .clear()
            .extend(segments);
        Ok(url)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
