//! Settings supplied by whatever hosts the signing core.
//!
//! Both sides take plain strings and paths; how a surrounding tool obtains
//! them (flags, environment, a config file) is its own business.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::client::ResponseStatusPolicy;
use crate::error::{KeylessError, KeylessResult};

/// Deadline for one signing round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Idle connections kept per signing host.
pub const DEFAULT_MAX_IDLE_PER_HOST: usize = 10;

/// TLS-terminator side: where to send digests and which chain to serve.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Absolute URL of the sign endpoint.
    pub sign_endpoint: String,
    /// Absolute URL of the decrypt endpoint. Recorded but never called.
    pub decrypt_endpoint: String,
    /// PEM certificate chain, leaf first.
    pub certificate: PathBuf,
    pub timeout: Duration,
    pub max_idle_per_host: usize,
    pub status_policy: ResponseStatusPolicy,
}

impl ClientConfig {
    pub fn new(
        sign_endpoint: impl Into<String>,
        decrypt_endpoint: impl Into<String>,
        certificate: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sign_endpoint: sign_endpoint.into(),
            decrypt_endpoint: decrypt_endpoint.into(),
            certificate: certificate.into(),
            timeout: DEFAULT_TIMEOUT,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            status_policy: ResponseStatusPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_status_policy(mut self, policy: ResponseStatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    pub fn validate(&self) -> KeylessResult<()> {
        if self.certificate.as_os_str().is_empty() {
            return Err(KeylessError::Config("certificate can not be empty".to_string()));
        }
        let url = reqwest::Url::parse(&self.sign_endpoint).map_err(|e| {
            KeylessError::Config(format!("sign_endpoint {:?}: {e}", self.sign_endpoint))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(KeylessError::Config(format!(
                "sign_endpoint must be an http or https URL, got {:?}",
                self.sign_endpoint
            )));
        }
        if self.timeout.is_zero() {
            return Err(KeylessError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// Signing-service side: which paths to intercept and which key to use.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Request path of the sign endpoint, e.g. `/keyless/sign`.
    pub sign_endpoint: String,
    /// Request path of the decrypt endpoint.
    pub decrypt_endpoint: String,
    /// PKCS#1 `RSA PRIVATE KEY` PEM file.
    pub private_key: PathBuf,
}

impl ServerConfig {
    pub fn validate(&self) -> KeylessResult<()> {
        if self.sign_endpoint.is_empty()
            || self.decrypt_endpoint.is_empty()
            || self.private_key.as_os_str().is_empty()
        {
            return Err(KeylessError::Config(
                "decrypt_endpoint, sign_endpoint, private_key can not be empty".to_string(),
            ));
        }
        for (name, path) in [
            ("sign_endpoint", &self.sign_endpoint),
            ("decrypt_endpoint", &self.decrypt_endpoint),
        ] {
            if !path.starts_with('/') {
                return Err(KeylessError::Config(format!(
                    "{name} must be a request path starting with '/', got {path:?}"
                )));
            }
        }
        if self.sign_endpoint == self.decrypt_endpoint {
            return Err(KeylessError::Config(
                "sign_endpoint and decrypt_endpoint must differ".to_string(),
            ));
        }
        Ok(())
    }
}
