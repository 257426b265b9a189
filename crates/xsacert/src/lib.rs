//! XSACert - ACME certificate provisioning with a local key store
//!
//! Obtains publicly trusted certificates through DNS-01 validation and keeps
//! the resulting key material as PEM files under a storage root.
//!
//! This library provides:
//!
//! - **Key codec**: RSA-2048 generation and PKCS#1 / PKCS#8 / PEM conversion
//! - **Artifact store**: sanitized, collision-safe file naming, crash-safe
//!   writes and full-chain assembly
//! - **Trust anchors**: a versioned table of roots plus file-based overrides
//! - **Provisioning**: the account → issue → store sequence around an
//!   external ACME issuer
//!
//! # Example
//!
//! ```no_run
//! use xsacert::{ArtifactKind, ArtifactStore, TrustAnchor};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let anchor = TrustAnchor::builtin("dst-root-ca-x3")?;
//! let store = ArtifactStore::new(".xsacert", anchor);
//!
//! let account_key = store.get_or_create_user_key("admin@example.com")?;
//! println!("account key: {} bits", account_key.bits());
//!
//! let leaf = std::fs::read("leaf.pem")?;
//! let issuer = std::fs::read("issuer.pem")?;
//! store.store_certificate("example.com", &leaf, ArtifactKind::Certificate)?;
//! store.store_certificate("example.com", &issuer, ArtifactKind::IssuerCertificate)?;
//! store.assemble_full_chain("example.com")?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod anchor;
pub mod error;
pub mod key;
pub mod provision;
pub mod store;

mod atomic;

// ============================================================================
// Public API Re-exports
// ============================================================================

pub use anchor::TrustAnchor;
pub use error::{AnchorError, IssuerError, KeyError, ProvisionError, StoreError};
pub use key::KeyPair;
pub use provision::{
    Account, CertificateIssuer, DnsCredentials, IssueRequest, IssuedCertificate, ProvisionReport,
    Provisioner,
};
pub use store::{ArtifactKind, ArtifactStore, StoredArtifact};

pub use xsacert_config::{Config, NamingPolicy, UserKeyLabel};
