//! Caller identity and attribute certificates
//!
//! This module provides:
//! - Ed25519 key pair generation and signing for certificate issuers
//! - Attribute certificates binding a subject to a set of claims
//! - Resolution of attributes for the invoking identity, after checking the
//!   certificate signature against the trusted issuer set

use crate::{stub::AttributeResolver, types::Signature, Error, Result};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Ed25519 key pair for signing certificates
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from a hex-encoded 32 byte seed
    pub fn from_seed_hex(seed: &str) -> Result<Self> {
        let bytes = hex::decode(seed)
            .map_err(|e| Error::Identity(format!("Invalid seed hex: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Identity("Seed must be 32 bytes".to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Get public key bytes
    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Sign a message
    pub fn sign(&self, message: &[u8]) -> Signature {
        let signature = self.signing_key.sign(message);
        Signature::from_bytes(signature.to_bytes())
    }

    /// Issue a certificate for `subject` carrying `attributes`
    pub fn issue(
        &self,
        subject: impl Into<String>,
        attributes: BTreeMap<String, String>,
    ) -> Certificate {
        let mut certificate = Certificate {
            subject: subject.into(),
            attributes,
            issuer: hex::encode(self.public_key()),
            signature: Signature::from_bytes([0u8; 64]),
        };
        certificate.signature = self.sign(&certificate.digest());
        certificate
    }
}

/// Verify a signature with a public key
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &[u8; 32]) -> bool {
    let dalek_sig = DalekSignature::from_bytes(signature.as_bytes());

    let verifying_key = match VerifyingKey::from_bytes(public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };

    verifying_key.verify(message, &dalek_sig).is_ok()
}

/// Attribute certificate presented by the invoking identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Enrollment id of the holder
    pub subject: String,

    /// Verified claims, e.g. `username`, `role`
    pub attributes: BTreeMap<String, String>,

    /// Hex-encoded public key of the issuer
    pub issuer: String,

    /// Issuer signature over [`Certificate::digest`]
    pub signature: Signature,
}

impl Certificate {
    /// SHA-256 over the length-prefixed subject, attributes and issuer
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        };

        field(self.subject.as_bytes());
        for (name, value) in &self.attributes {
            field(name.as_bytes());
            field(value.as_bytes());
        }
        field(self.issuer.as_bytes());

        hasher.finalize().into()
    }

    /// Issuer public key bytes
    pub fn issuer_key(&self) -> Result<[u8; 32]> {
        decode_key(&self.issuer)
    }

    /// Parse from JSON
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::Identity(format!("Malformed certificate: {}", e)))
    }

    /// Check the signature and that the issuer is trusted
    pub fn verify(&self, trusted: &TrustedIssuers) -> Result<()> {
        let issuer = self.issuer_key()?;
        if !trusted.contains(&issuer) {
            return Err(Error::Identity(format!(
                "Issuer {} is not trusted",
                self.issuer
            )));
        }

        if !verify_signature(&self.digest(), &self.signature, &issuer) {
            return Err(Error::SignatureError(format!(
                "Certificate for {} has an invalid signature",
                self.subject
            )));
        }

        Ok(())
    }
}

fn decode_key(key: &str) -> Result<[u8; 32]> {
    let bytes =
        hex::decode(key).map_err(|e| Error::Identity(format!("Invalid key hex: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| Error::Identity("Public key must be 32 bytes".to_string()))
}

/// Public keys whose certificates are accepted
#[derive(Debug, Clone, Default)]
pub struct TrustedIssuers {
    keys: Vec<[u8; 32]>,
}

impl TrustedIssuers {
    /// Build from raw keys
    pub fn new(keys: Vec<[u8; 32]>) -> Self {
        Self { keys }
    }

    /// Build from hex-encoded keys
    pub fn from_hex<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        let keys = keys
            .iter()
            .map(|k| decode_key(k.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    /// Whether `key` is trusted
    pub fn contains(&self, key: &[u8; 32]) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Number of trusted issuers
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no issuer is trusted
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Resolves attributes from the invoking identity's certificate
#[derive(Debug)]
pub struct CertificateResolver<'a> {
    certificate: &'a Certificate,
    trusted: &'a TrustedIssuers,
}

impl<'a> CertificateResolver<'a> {
    /// Bind a resolver to one invocation's certificate
    pub fn new(certificate: &'a Certificate, trusted: &'a TrustedIssuers) -> Self {
        Self {
            certificate,
            trusted,
        }
    }
}

impl AttributeResolver for CertificateResolver<'_> {
    fn resolve(&self, attribute: &str) -> Result<String> {
        self.certificate.verify(self.trusted)?;

        self.certificate
            .attributes
            .get(attribute)
            .cloned()
            .ok_or_else(|| {
                Error::Identity(format!(
                    "Attribute {} not present in certificate for {}",
                    attribute, self.certificate.subject
                ))
            })
    }
}
