//! Error types for key handling, artifact storage and provisioning

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::ArtifactKind;

/// Errors raised while generating, encoding or decoding key material
#[derive(Debug, Error)]
pub enum KeyError {
    /// The random source or the RSA routine failed
    #[error("Failed to generate RSA key: {0}")]
    Generation(String),

    /// Input carried no PEM block
    #[error("Malformed PEM: {0}")]
    MalformedPem(String),

    /// ASN.1 parsing of the key failed
    #[error("Malformed private key: {0}")]
    MalformedKey(String),

    /// The PKCS#8 wrapper names an algorithm other than RSA
    #[error("Unsupported key algorithm {oid}, expected RSA")]
    UnsupportedKeyType { oid: String },

    /// DER serialization failed
    #[error("Failed to encode key: {0}")]
    Encoding(String),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl KeyError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { path, source }
    }
}

/// Errors raised by the artifact store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Logical name cannot be mapped to a file name
    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    /// The operation does not apply to this artifact type
    #[error("Operation not supported for {0} artifacts")]
    UnsupportedKind(ArtifactKind),

    /// A prerequisite artifact has not been stored yet
    #[error("Missing {kind} artifact at {}", .path.display())]
    MissingArtifact { kind: ArtifactKind, path: PathBuf },
}

impl StoreError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { path, source }
    }
}

/// Errors raised while loading a trust anchor
#[derive(Debug, Error)]
pub enum AnchorError {
    #[error("Unknown trust anchor '{id}' (built-in anchors: {known})")]
    Unknown { id: String, known: String },

    #[error("Invalid trust anchor '{id}': {message}")]
    Invalid { id: String, message: String },

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure reported by the external certificate issuer
#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("Challenge rejected for '{domain}': {message}")]
    ChallengeRejected { domain: String, message: String },

    #[error("Rate limited by certificate authority: {0}")]
    RateLimited(String),

    #[error("Certificate authority refused domain '{0}'")]
    InvalidDomain(String),

    #[error("Issuance failed: {0}")]
    Other(String),
}

/// Errors raised by the provisioning flow
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("Invalid domain: '{0}'")]
    InvalidDomain(String),

    #[error("Failed to compile validation pattern: {0}")]
    Pattern(String),

    #[error(transparent)]
    Issuer(#[from] IssuerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
