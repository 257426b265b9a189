//! RSA key generation and PKCS#1 / PKCS#8 / PEM conversions
//!
//! Keys are always RSA-2048. On disk they are stored as PKCS#8 DER inside a
//! PEM block. The PEM label is chosen by the caller: account keys written by
//! earlier releases use `RSA PRIVATE KEY` even though the body is PKCS#8, so
//! decoding never trusts the label and instead inspects the DER itself.

use std::fmt;
use std::fs;
use std::path::Path;

use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::{EncodePrivateKey, ObjectIdentifier, PrivateKeyInfo};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::atomic;
use crate::error::KeyError;

/// Modulus size of every generated key
pub const RSA_KEY_BITS: usize = 2048;

/// rsaEncryption
pub const RSA_ALGORITHM_OID: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// PEM label conventionally reserved for PKCS#1 bodies
pub const LABEL_RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";

/// PEM label for PKCS#8 bodies
pub const LABEL_PRIVATE_KEY: &str = "PRIVATE KEY";

/// PEM label for X.509 certificates
pub const LABEL_CERTIFICATE: &str = "CERTIFICATE";

/// An RSA private key owned by a single account or domain
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair(RsaPrivateKey);

impl KeyPair {
    /// Generate a fresh RSA-2048 key from the thread-local CSPRNG
    pub fn generate() -> Result<Self, KeyError> {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| KeyError::Generation(e.to_string()))?;
        let key = Self(key);

        debug!(
            bits = RSA_KEY_BITS,
            fingerprint = %key.public_fingerprint()?,
            "Generated RSA key"
        );
        Ok(key)
    }

    /// Wrap a key produced elsewhere, e.g. by a [`CertificateIssuer`]
    ///
    /// [`CertificateIssuer`]: crate::provision::CertificateIssuer
    pub fn from_rsa(key: RsaPrivateKey) -> Self {
        Self(key)
    }

    /// Parse a raw PKCS#1 `RSAPrivateKey` structure
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self, KeyError> {
        RsaPrivateKey::from_pkcs1_der(der)
            .map(Self)
            .map_err(|e| KeyError::MalformedKey(format!("invalid PKCS#1 structure: {}", e)))
    }

    /// Raw PKCS#1 encoding of the private key
    pub fn to_pkcs1_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = self
            .0
            .to_pkcs1_der()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Ok(doc.as_bytes().to_vec())
    }

    /// PKCS#8 DER armored as PEM under `label`
    pub fn to_pem(&self, label: &str) -> Result<String, KeyError> {
        let der = encode_pkcs8(self)?;
        Ok(encode_pem(label, &der))
    }

    /// Modulus size in bits
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }

    /// Hex SHA-256 of the PKCS#1 public key, safe to log
    pub fn public_fingerprint(&self) -> Result<String, KeyError> {
        let public = self
            .0
            .to_public_key()
            .to_pkcs1_der()
            .map_err(|e| KeyError::Encoding(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(public.as_bytes())))
    }

    /// The underlying key, for issuers that sign ACME requests with it
    pub fn as_rsa(&self) -> &RsaPrivateKey {
        &self.0
    }

    /// Hand the underlying key to an issuer that takes ownership
    pub fn into_rsa(self) -> RsaPrivateKey {
        self.0
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// A PEM block split into its label and DER payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPem {
    pub label: String,
    pub der: Vec<u8>,
}

/// Wrap the key's PKCS#1 encoding in a version 0 PKCS#8 `PrivateKeyInfo`
/// with the RSA algorithm identifier
pub fn encode_pkcs8(key: &KeyPair) -> Result<Vec<u8>, KeyError> {
    let doc = key
        .0
        .to_pkcs8_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(doc.as_bytes().to_vec())
}

/// Armor arbitrary DER bytes as PEM with LF line endings
pub fn encode_pem(label: &str, der: &[u8]) -> String {
    let block = pem::Pem::new(label, der);
    pem::encode_config(
        &block,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Strip the framing of the first PEM block in `input`
///
/// The label is returned but not checked.
pub fn decode_pem(input: &[u8]) -> Result<DecodedPem, KeyError> {
    let block = pem::parse(input).map_err(|e| KeyError::MalformedPem(e.to_string()))?;
    Ok(DecodedPem {
        label: block.tag().to_string(),
        der: block.into_contents(),
    })
}

/// Parse a PKCS#8 `PrivateKeyInfo` holding an RSA key
///
/// The algorithm parameters may be NULL or absent; both forms exist on disk.
pub fn decode_pkcs8(der: &[u8]) -> Result<KeyPair, KeyError> {
    let info = PrivateKeyInfo::try_from(der)
        .map_err(|e| KeyError::MalformedKey(format!("invalid PKCS#8 structure: {}", e)))?;

    if info.algorithm.oid != RSA_ALGORITHM_OID {
        return Err(KeyError::UnsupportedKeyType {
            oid: info.algorithm.oid.to_string(),
        });
    }

    KeyPair::from_pkcs1_der(info.private_key)
}

/// Decode a private key from PEM or bare DER, PKCS#8 or PKCS#1
pub fn decode_private_key(input: &[u8]) -> Result<KeyPair, KeyError> {
    if is_pem(input) {
        let block = decode_pem(input)?;
        trace!(label = %block.label, "Decoding PEM private key");
        decode_private_key_der(&block.der)
    } else {
        decode_private_key_der(input)
    }
}

fn decode_private_key_der(der: &[u8]) -> Result<KeyPair, KeyError> {
    match decode_pkcs8(der) {
        Err(KeyError::MalformedKey(pkcs8_err)) => KeyPair::from_pkcs1_der(der).map_err(|_| {
            KeyError::MalformedKey(format!("neither PKCS#8 nor PKCS#1 ({})", pkcs8_err))
        }),
        other => other,
    }
}

fn is_pem(input: &[u8]) -> bool {
    input.windows(11).any(|w| w == b"-----BEGIN ")
}

/// Write `key` as PKCS#8 PEM under `label`, replacing any existing file
pub fn save_to_file(path: &Path, key: &KeyPair, label: &str) -> Result<(), KeyError> {
    let pem = key.to_pem(label)?;
    atomic::write_atomic(path, pem.as_bytes(), atomic::PRIVATE_MODE).map_err(KeyError::io(path))?;
    debug!(path = %path.display(), label, "Saved private key");
    Ok(())
}

/// Read a key written by [`save_to_file`], or any PEM/DER RSA private key
pub fn load_from_file(path: &Path) -> Result<KeyPair, KeyError> {
    let bytes = fs::read(path).map_err(KeyError::io(path))?;
    let key = decode_private_key(&bytes)?;
    debug!(path = %path.display(), "Loaded private key");
    Ok(key)
}
