//! Configuration for the xsacert certificate tool
//!
//! Configuration is optional. Every field has a default matching the on-disk
//! layout that earlier releases wrote, so a missing file behaves exactly like
//! an empty one.
//!
//! # Example
//!
//! ```toml
//! [storage]
//! dir = "/var/lib/xsacert"
//! naming = "hashed"
//! user-key-label = "legacy"
//!
//! [trust]
//! anchor = "dst-root-ca-x3"
//! # anchor-file = "/etc/xsacert/root.pem"
//!
//! [dns]
//! api-server = "api.name.com"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

mod error;

pub use error::ConfigError;

/// Storage directory used when none is configured, relative to the working directory
pub const DEFAULT_STORAGE_DIR: &str = ".xsacert";

/// Built-in trust anchor appended to assembled chains by default
pub const DEFAULT_TRUST_ANCHOR: &str = "dst-root-ca-x3";

/// Default DNS provider API host
pub const DEFAULT_API_SERVER: &str = "api.name.com";

/// How logical names map onto file names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingPolicy {
    /// Names that need escaping get a short digest of the original appended,
    /// so two different inputs never share a file
    #[default]
    Hashed,
    /// Plain sanitization. Distinct inputs may map to the same file and
    /// silently overwrite each other.
    Legacy,
}

/// PEM label written on freshly generated account keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserKeyLabel {
    /// `RSA PRIVATE KEY` around a PKCS#8 body, as earlier releases wrote it
    #[default]
    Legacy,
    /// `PRIVATE KEY`, which matches the PKCS#8 body
    Pkcs8,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub storage: StorageConfig,
    pub trust: TrustConfig,
    pub dns: DnsConfig,
}

/// Artifact storage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct StorageConfig {
    /// Storage root; relative paths resolve against the working directory
    pub dir: PathBuf,
    pub naming: NamingPolicy,
    pub user_key_label: UserKeyLabel,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            naming: NamingPolicy::default(),
            user_key_label: UserKeyLabel::default(),
        }
    }
}

/// Root certificate appended when assembling a full chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct TrustConfig {
    /// Identifier of a built-in anchor
    pub anchor: String,
    /// PEM file that replaces the built-in anchor when set
    pub anchor_file: Option<PathBuf>,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_TRUST_ANCHOR.to_string(),
            anchor_file: None,
        }
    }
}

/// DNS provider defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct DnsConfig {
    pub api_server: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            api_server: DEFAULT_API_SERVER.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        debug!(?config, "Parsed configuration");
        Ok(config)
    }

    /// Check field values that the type system cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid("storage.dir", "must not be empty"));
        }

        if self.trust.anchor_file.is_none() && self.trust.anchor.trim().is_empty() {
            return Err(ConfigError::invalid(
                "trust.anchor",
                "must name a built-in anchor when trust.anchor-file is unset",
            ));
        }

        if let Some(ref file) = self.trust.anchor_file {
            if file.as_os_str().is_empty() {
                return Err(ConfigError::invalid("trust.anchor-file", "must not be empty"));
            }
        }

        let host = self.dns.api_server.trim();
        if host.is_empty() {
            return Err(ConfigError::invalid("dns.api-server", "must not be empty"));
        }
        if host.contains("://") || host.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid(
                "dns.api-server",
                format!("expected a bare host name, got '{}'", host),
            ));
        }

        Ok(())
    }

    /// Storage root resolved against `cwd` when configured as a relative path
    pub fn storage_root(&self, cwd: &Path) -> PathBuf {
        if self.storage.dir.is_absolute() {
            self.storage.dir.clone()
        } else {
            cwd.join(&self.storage.dir)
        }
    }
}
