//! Backend address and network timeouts.
//!
//! One [`ClientConfig`] is shared by the REST client and the live channel so
//! that both talk to the same backend. Paths are always joined relative to
//! the base URL, which keeps deployments under a path prefix working.

use std::time::Duration;

use huddle_proto::GroupId;
use thiserror::Error;
use url::Url;

use crate::credential::Credential;

/// Backend used when nothing else is configured.
pub const DEFAULT_SERVER: &str = "http://localhost:8000";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Base URL or derived URL failed to parse.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Base URL uses a scheme other than http or https.
    #[error("unsupported scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
}

/// Backend address and timeouts.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL. Always ends with `/`.
    pub base_url: Url,
    /// Upper bound for a whole REST request.
    pub request_timeout: Duration,
    /// Upper bound for establishing a REST or live connection.
    pub connect_timeout: Duration,
}

impl ClientConfig {
    /// Default REST request timeout.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Parse a base URL with default timeouts.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let mut url = Url::parse(base_url)?;
        match url.scheme() {
            "http" | "https" => {},
            other => return Err(ConfigError::UnsupportedScheme(other.to_owned())),
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            base_url: url,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Override the timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, request_timeout: Duration, connect_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self.connect_timeout = connect_timeout;
        self
    }

    /// REST endpoint for `path`, relative to the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Live channel address for a group.
    ///
    /// Same host and prefix as the REST base, with `http` mapped to `ws` and
    /// `https` to `wss`. The bearer token travels as the `token` query
    /// parameter.
    pub fn ws_url(&self, group_id: GroupId, credential: &Credential) -> Result<Url, ConfigError> {
        let mut url = self.endpoint(&format!("chat/ws/{group_id}"))?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(url.scheme().to_owned()))?;
        url.query_pairs_mut().append_pair("token", credential.expose());
        Ok(url)
    }

    /// Absolute address of a stored file.
    ///
    /// The backend returns either absolute URLs or server-relative paths.
    pub fn resolve_file_url(&self, file_url: &str) -> Result<Url, ConfigError> {
        match Url::parse(file_url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self.endpoint(file_url),
            Err(e) => Err(e.into()),
        }
    }
}
