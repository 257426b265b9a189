//! Mapping of logical names and artifact tags onto file names

use std::fmt;

use sha2::{Digest, Sha256};
use xsacert_config::NamingPolicy;

use crate::error::StoreError;

/// Longest sanitized name kept verbatim; longer names are cut and hashed
const MAX_NAME_LEN: usize = 200;

/// Hex digits of the SHA-256 digest appended to escaped names
const DIGEST_LEN: usize = 8;

/// The artifact types the store manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactKind {
    /// ACME account key, keyed by email
    UserPrivateKey,
    /// Domain private key
    PrivateKey,
    /// Domain leaf certificate
    Certificate,
    /// Certificate of the CA that issued the leaf
    IssuerCertificate,
    /// Leaf, issuer and trust anchor concatenated
    FullChain,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::UserPrivateKey,
        ArtifactKind::PrivateKey,
        ArtifactKind::Certificate,
        ArtifactKind::IssuerCertificate,
        ArtifactKind::FullChain,
    ];

    /// File extension used on disk
    pub fn tag(&self) -> &'static str {
        match self {
            ArtifactKind::UserPrivateKey => "user-private-key",
            ArtifactKind::PrivateKey => "private-key",
            ArtifactKind::Certificate => "certificate",
            ArtifactKind::IssuerCertificate => "issuer-certificate",
            ArtifactKind::FullChain => "full-chain",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Reduce `input` to characters that are safe in a single path component
///
/// Keeps ASCII alphanumerics and `@ + _ - .`; every run of other characters
/// becomes one `_`. Dot runs collapse to a single dot and leading or trailing
/// dots are stripped, so the result can never be `.`, `..` or a hidden file.
pub fn sanitize_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut replacing = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '@' | '+' | '_' | '-' | '.') {
            replacing = false;
            if c == '.' && out.ends_with('.') {
                continue;
            }
            out.push(c);
        } else if !replacing {
            replacing = true;
            out.push('_');
        }
    }

    let trimmed = out.trim_matches('.');
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name for the artifact `(name, tag)` under `policy`
///
/// The name and tag are joined with `.`. Under [`NamingPolicy::Hashed`] a pair
/// whose name or tag does not survive sanitization unchanged gets a
/// `~<digest>` suffix on the name, computed over both parts. A tag holding a
/// `.` counts as lossy since it would move the separator. `~` never survives
/// sanitization, so a hashed file name cannot equal a clean one.
pub(crate) fn file_name(name: &str, tag: &str, policy: NamingPolicy) -> Result<String, StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidName("name must not be empty".to_string()));
    }
    if tag.trim().is_empty() {
        return Err(StoreError::InvalidName("tag must not be empty".to_string()));
    }

    let mut stem = sanitize_component(name);
    let clean_tag = sanitize_component(tag);
    let lossy = stem != name
        || stem.len() > MAX_NAME_LEN
        || clean_tag != tag
        || clean_tag.contains('.');
    stem.truncate(MAX_NAME_LEN);

    if lossy && policy == NamingPolicy::Hashed {
        let digest = pair_digest(name, tag);
        stem.push('~');
        stem.push_str(&digest[..DIGEST_LEN]);
    }

    Ok(format!("{}.{}", stem, clean_tag))
}

/// Hex SHA-256 over `name`, a NUL separator and `tag`
fn pair_digest(name: &str, tag: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update([0u8]);
    hasher.update(tag.as_bytes());
    hex::encode(hasher.finalize())
}
