//! Certificate provisioning flow
//!
//! The ACME protocol and the DNS provider API live outside this crate. They
//! are reached through [`CertificateIssuer`], which receives the account and
//! the DNS credentials and hands back PEM buffers. [`Provisioner`] drives the
//! sequence around it:
//!
//! 1. Validate the email address and domain
//! 2. Load or create the account key
//! 3. Ask the issuer for a certificate
//! 4. Store the domain key, leaf and issuer certificates
//! 5. Assemble the full chain

use std::fmt;
use std::path::PathBuf;

use regex::Regex;
use tracing::{debug, info};
use xsacert_config::{DnsConfig, DEFAULT_API_SERVER};

use crate::error::{IssuerError, ProvisionError};
use crate::key::KeyPair;
use crate::store::{ArtifactKind, ArtifactStore};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$";

const DOMAIN_PATTERN: &str = r"^(?:\*\.)?(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?$";

/// Longest domain name DNS allows
const MAX_DOMAIN_LEN: usize = 253;

/// An ACME account: contact email plus the key that signs its requests
#[derive(Debug, Clone)]
pub struct Account {
    email: String,
    key: KeyPair,
}

impl Account {
    pub fn new(email: impl Into<String>, key: KeyPair) -> Self {
        Self {
            email: email.into(),
            key,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }
}

/// Credentials for the DNS provider that publishes DNS-01 TXT records
#[derive(Clone, PartialEq, Eq)]
pub struct DnsCredentials {
    pub api_host: String,
    pub api_user: String,
    pub api_key: String,
}

impl DnsCredentials {
    /// Credentials against the default API host
    pub fn new(api_user: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_host: DEFAULT_API_SERVER.to_string(),
            api_user: api_user.into(),
            api_key: api_key.into(),
        }
    }

    /// Credentials against the API host named in the `[dns]` config table
    pub fn from_config(
        config: &DnsConfig,
        api_user: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::new(api_user, api_key).with_host(config.api_server.clone())
    }

    pub fn with_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self
    }
}

impl fmt::Debug for DnsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsCredentials")
            .field("api_host", &self.api_host)
            .field("api_user", &self.api_user)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// A request for a single-domain certificate
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub domain: String,
    pub dns: DnsCredentials,
}

/// PEM buffers returned by the issuer
#[derive(Clone)]
pub struct IssuedCertificate {
    pub private_key_pem: Vec<u8>,
    pub certificate_pem: Vec<u8>,
    pub issuer_certificate_pem: Vec<u8>,
}

impl fmt::Debug for IssuedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedCertificate")
            .field("private_key_pem", &"<redacted>")
            .field("certificate_pem", &self.certificate_pem.len())
            .field("issuer_certificate_pem", &self.issuer_certificate_pem.len())
            .finish()
    }
}

/// Obtains a certificate from a CA using DNS-01 validation
pub trait CertificateIssuer {
    fn obtain(
        &self,
        account: &Account,
        request: &IssueRequest,
    ) -> Result<IssuedCertificate, IssuerError>;
}

/// Files written by a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub domain: String,
    pub account_key: PathBuf,
    pub private_key: PathBuf,
    pub certificate: PathBuf,
    pub issuer_certificate: PathBuf,
    pub full_chain: PathBuf,
}

/// Runs the provisioning sequence against a store and an issuer
pub struct Provisioner<'a, I> {
    store: &'a ArtifactStore,
    issuer: I,
    email_pattern: Regex,
    domain_pattern: Regex,
}

impl<'a, I: CertificateIssuer> Provisioner<'a, I> {
    pub fn new(store: &'a ArtifactStore, issuer: I) -> Result<Self, ProvisionError> {
        let email_pattern =
            Regex::new(EMAIL_PATTERN).map_err(|e| ProvisionError::Pattern(e.to_string()))?;
        let domain_pattern =
            Regex::new(DOMAIN_PATTERN).map_err(|e| ProvisionError::Pattern(e.to_string()))?;

        Ok(Self {
            store,
            issuer,
            email_pattern,
            domain_pattern,
        })
    }

    pub fn validate_email(&self, email: &str) -> Result<(), ProvisionError> {
        if self.email_pattern.is_match(email) {
            Ok(())
        } else {
            Err(ProvisionError::InvalidEmail(email.to_string()))
        }
    }

    /// Accepts host names and `*.`-prefixed wildcards
    pub fn validate_domain(&self, domain: &str) -> Result<(), ProvisionError> {
        if domain.len() <= MAX_DOMAIN_LEN && self.domain_pattern.is_match(domain) {
            Ok(())
        } else {
            Err(ProvisionError::InvalidDomain(domain.to_string()))
        }
    }

    /// Obtain a certificate for `request.domain` and persist every artifact
    ///
    /// Any failure ends the run; artifacts already written stay in place.
    pub fn provision(
        &self,
        email: &str,
        request: &IssueRequest,
    ) -> Result<ProvisionReport, ProvisionError> {
        self.validate_email(email)?;
        self.validate_domain(&request.domain)?;

        let domain = request.domain.as_str();
        let key = self.store.get_or_create_user_key(email)?;
        let account_key = self.store.path_for(email, ArtifactKind::UserPrivateKey)?;
        let account = Account::new(email, key);

        info!(
            domain = %domain,
            email = %email,
            api_host = %request.dns.api_host,
            "Requesting certificate"
        );
        let issued = self.issuer.obtain(&account, request)?;
        debug!(domain = %domain, ?issued, "Certificate issued");

        let private_key = self
            .store
            .store_domain_private_key(domain, &issued.private_key_pem)?;
        let certificate = self.store.store_certificate(
            domain,
            &issued.certificate_pem,
            ArtifactKind::Certificate,
        )?;
        let issuer_certificate = self.store.store_certificate(
            domain,
            &issued.issuer_certificate_pem,
            ArtifactKind::IssuerCertificate,
        )?;
        let full_chain = self.store.assemble_full_chain(domain)?;

        info!(domain = %domain, full_chain = %full_chain.display(), "Certificate provisioned");

        Ok(ProvisionReport {
            domain: domain.to_string(),
            account_key,
            private_key,
            certificate,
            issuer_certificate,
            full_chain,
        })
    }
}
