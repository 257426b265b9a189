//! Trust anchors appended to assembled certificate chains
//!
//! The anchor is injected into the store rather than hardcoded in chain
//! assembly so a rotated root can be swapped in through configuration.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::AnchorError;
use crate::key::{decode_pem, LABEL_CERTIFICATE};

/// DST Root CA X3, the root shipped by earlier releases
const DST_ROOT_CA_X3: &str = "\
-----BEGIN CERTIFICATE-----
MIIDSjCCAjKgAwIBAgIQRK+wgNajJ7qJMDmGLvhAazANBgkqhkiG9w0BAQUFADA/
MSQwIgYDVQQKExtEaWdpdGFsIFNpZ25hdHVyZSBUcnVzdCBDby4xFzAVBgNVBAMT
DkRTVCBSb290IENBIFgzMB4XDTAwMDkzMDIxMTIxOVoXDTIxMDkzMDE0MDExNVow
PzEkMCIGA1UEChMbRGlnaXRhbCBTaWduYXR1cmUgVHJ1c3QgQ28uMRcwFQYDVQQD
Ew5EU1QgUm9vdCBDQSBYMzCCASIwDQYJKoZIhvcNAQEBBQADggEPADCCAQoCggEB
AN+v6ZdQCINXtMxiZfaQguzH0yxrMMpb7NnDfcdAwRgUi+DoM3ZJKuM/IUmTrE4O
rz5Iy2Xu/NMhD2XSKtkyj4zl93ewEnu1lcCJo6m67XMuegwGMoOifooUMM0RoOEq
OLl5CjH9UL2AZd+3UWODyOKIYepLYYHsUmu5ouJLGiifSKOeDNoJjj4XLh7dIN9b
xiqKqy69cK3FCxolkHRyxXtqqzTWMIn/5WgTe1QLyNau7Fqckh49ZLOMxt+/yUFw
7BZy1SbsOFU5Q9D8/RhcQPGX69Wam40dutolucbY38EVAjqr2m7xPi71XAicPNaD
aeQQmxkqtilX4+U9m5/wAl0CAwEAAaNCMEAwDwYDVR0TAQH/BAUwAwEB/zAOBgNV
HQ8BAf8EBAMCAQYwHQYDVR0OBBYEFMSnsaR7LHH62+FLkHX/xBVghYkQMA0GCSqG
SIb3DQEBBQUAA4IBAQCjGiybFwBcqR7uKGY3Or+Dxz9LwwmglSBd49lZRNI+DT69
ikugdB/OEIKcdBodfpga3csTS7MgROSR6cz8faXbauX+5v3gTt23ADq1cEmv8uXr
AvHRAosZy5Q6XkjEGB5YGV8eAlrwDPGxrancWYaLbumR9YbK+rlmM6pZW87ipxZz
R8srzJmwN0jP41ZL9c8PDHIyh8bwRLtTcm1D9SZImlJnt1ir/md2cXjbDaJWFBM5
JDGFoqgCWjBH4d1QB7wCCZAA62RjYJsWvIjJEubSfZGL+T0yjWW06XyxV3bqxbYo
Ob8VZRzI9neWagqNdwvYkQsEjgfbKbYK7p2CNTUQ
-----END CERTIFICATE-----
";

/// Built-in anchors, keyed by a stable identifier
const BUILTIN_ANCHORS: &[(&str, &str)] = &[("dst-root-ca-x3", DST_ROOT_CA_X3)];

/// A root certificate in PEM form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustAnchor {
    id: String,
    pem: String,
}

impl TrustAnchor {
    /// Look up a built-in anchor
    pub fn builtin(id: &str) -> Result<Self, AnchorError> {
        let (id, pem) = BUILTIN_ANCHORS
            .iter()
            .find(|(known, _)| *known == id)
            .ok_or_else(|| AnchorError::Unknown {
                id: id.to_string(),
                known: builtin_ids().join(", "),
            })?;
        Self::from_pem(*id, *pem)
    }

    /// Load an anchor from a PEM file; the file name becomes its identifier
    pub fn from_file(path: &Path) -> Result<Self, AnchorError> {
        let text = fs::read_to_string(path).map_err(|source| AnchorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let anchor = Self::from_pem(path.display().to_string(), text)?;
        debug!(path = %path.display(), "Loaded trust anchor from file");
        Ok(anchor)
    }

    /// Wrap PEM text, checking it holds exactly one certificate block
    pub fn from_pem(id: impl Into<String>, pem: impl Into<String>) -> Result<Self, AnchorError> {
        let id = id.into();
        let mut pem = pem.into();

        let blocks = pem::parse_many(pem.as_bytes()).map_err(|e| AnchorError::Invalid {
            id: id.clone(),
            message: e.to_string(),
        })?;
        if blocks.len() != 1 {
            return Err(AnchorError::Invalid {
                id,
                message: format!("expected one PEM block, found {}", blocks.len()),
            });
        }

        let block = decode_pem(pem.as_bytes()).map_err(|e| AnchorError::Invalid {
            id: id.clone(),
            message: e.to_string(),
        })?;
        if block.label != LABEL_CERTIFICATE {
            return Err(AnchorError::Invalid {
                id,
                message: format!("expected a {} block, found {}", LABEL_CERTIFICATE, block.label),
            });
        }

        if !pem.ends_with('\n') {
            pem.push('\n');
        }
        Ok(Self { id, pem })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// PEM text, always newline-terminated
    pub fn pem(&self) -> &str {
        &self.pem
    }
}

/// Identifiers of every built-in anchor
pub fn builtin_ids() -> Vec<&'static str> {
    BUILTIN_ANCHORS.iter().map(|(id, _)| *id).collect()
}
