use std::fs;
use std::path::Path;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote references are not allowed")]
    Disallowed,

    #[error("bad HTTP code {0}")]
    BadStatus(u16),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("read {path:?}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown scheme {0:?}")]
    UnknownScheme(String),

    #[error("relative paths are not allowed")]
    RelativePath,

    #[error("invalid locator {0:?}")]
    InvalidLocator(String),

    #[error("{0}")]
    Other(String),
}

/// Fetches the bytes of a remote schema document.
///
/// Invoked with a fragment-less locator. No retries and no caching are
/// expected here; the compiler caches the parsed document per locator.
/// Timeouts and cancellation are likewise the implementation's business.
pub trait RemoteResolver {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, RemoteError>;
}

impl<R: RemoteResolver + ?Sized> RemoteResolver for &R {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, RemoteError> {
        (**self).fetch(locator)
    }
}

/// Refuses every remote reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteResolver for NoRemote {
    fn fetch(&self, _locator: &str) -> Result<Vec<u8>, RemoteError> {
        Err(RemoteError::Disallowed)
    }
}

/// Built-in resolver: HTTP(S) GET, or a filesystem read for `file` and
/// scheme-less locators.
#[derive(Debug, Clone, Default)]
pub struct Remote {
    /// Preconfigured client, for timeouts or proxies. A default client is
    /// built when unset.
    pub client: Option<reqwest::blocking::Client>,
    /// Permit reading relative filesystem paths.
    pub allow_relative: bool,
}

impl Remote {
    fn get_http(&self, url: &Url) -> Result<Vec<u8>, RemoteError> {
        let client = self.client.clone().unwrap_or_default();
        let mut request = client.get(url.as_str());
        if let Some(password) = url.password() {
            request = request.basic_auth(url.username(), Some(password));
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        if status >= 299 {
            return Err(RemoteError::BadStatus(status));
        }
        Ok(response.bytes()?.to_vec())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, RemoteError> {
        if Path::new(path).is_relative() && !self.allow_relative {
            return Err(RemoteError::RelativePath);
        }
        fs::read(path).map_err(|source| RemoteError::Io {
            path: path.to_owned(),
            source,
        })
    }
}

impl RemoteResolver for Remote {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, RemoteError> {
        match Url::parse(locator) {
            Ok(url) => match url.scheme() {
                "http" | "https" => self.get_http(&url),
                "file" => self.read_file(url.path()),
                other => Err(RemoteError::UnknownScheme(other.to_owned())),
            },
            // A scheme-less locator is a filesystem path.
            Err(url::ParseError::RelativeUrlWithoutBase) => self.read_file(locator),
            Err(_) => Err(RemoteError::InvalidLocator(locator.to_owned())),
        }
    }
}
