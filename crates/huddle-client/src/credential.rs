//! Bearer credential and its persistence.
//!
//! The credential is an opaque token. It is read once at startup, attached to
//! every REST request and to the live channel address, and cleared when the
//! backend rejects it.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credential storage errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Reading or writing the credential file failed.
    #[error("credential file {path}: {source}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Credential file exists but is not valid JSON with a `token` key.
    #[error("credential file {path} is malformed: {reason}")]
    Malformed {
        /// File involved.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// No platform configuration directory to place the file in.
    #[error("no configuration directory available; pass a token file path")]
    NoConfigDir,
}

/// Opaque bearer token.
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building requests.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Where the credential lives between runs.
pub trait CredentialStore: Send + Sync {
    /// Stored credential, if any.
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    /// Replace the stored credential.
    fn save(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Forget the stored credential. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), CredentialError>;
}

#[derive(Serialize, Deserialize)]
struct CredentialFile {
    token: String,
}

/// JSON file store: `{"token": "..."}`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform configuration directory.
    pub fn in_config_dir() -> Result<Self, CredentialError> {
        Self::default_path().map(Self::new).ok_or(CredentialError::NoConfigDir)
    }

    /// `<config dir>/huddle/credentials.json`, when a config dir exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("huddle").join("credentials.json"))
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> CredentialError {
        CredentialError::Io { path: self.path.clone(), source }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let file: CredentialFile = serde_json::from_str(&raw).map_err(|e| {
            CredentialError::Malformed { path: self.path.clone(), reason: e.to_string() }
        })?;

        if file.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Credential::new(file.token)))
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_string_pretty(&CredentialFile {
            token: credential.expose().to_owned(),
        })
        .map_err(|e| CredentialError::Malformed { path: self.path.clone(), reason: e.to_string() })?;

        // Previous file stays intact until the new one is complete
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        restrict_permissions(&tmp).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;

        tracing::debug!(path = %self.path.display(), "credential saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "credential cleared");
                Ok(())
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// In-process store for tests and `--token` style overrides.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Store pre-loaded with `credential`.
    pub fn with(credential: Credential) -> Self {
        Self { inner: Mutex::new(Some(credential)) }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self.slot().clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialError> {
        *self.slot() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.slot() = None;
        Ok(())
    }
}
