#![forbid(unsafe_code)]

//! Key types and data structures.

use sigtuna_core::algorithm;

/// Usage flags for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    Sign,
    Verify,
    Encrypt,
    Decrypt,
    Any,
}

/// The underlying key data.
pub enum KeyData {
    Rsa {
        private: Option<rsa::RsaPrivateKey>,
        public: rsa::RsaPublicKey,
    },
    EcP256 {
        private: Option<p256::ecdsa::SigningKey>,
        public: p256::ecdsa::VerifyingKey,
    },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { private, .. } => {
                if private.is_some() {
                    write!(f, "RSA private+public key")
                } else {
                    write!(f, "RSA public key")
                }
            }
            Self::EcP256 { private, .. } => {
                if private.is_some() {
                    write!(f, "EC P-256 private+public key")
                } else {
                    write!(f, "EC P-256 public key")
                }
            }
        }
    }
}

/// A named key with associated data.
#[derive(Debug)]
pub struct Key {
    /// Optional name for key lookup.
    pub name: Option<String>,
    /// The key data.
    pub data: KeyData,
    /// The intended usage.
    pub usage: KeyUsage,
    /// Optional X.509 certificate chain (DER-encoded).
    pub x509_chain: Vec<Vec<u8>>,
}

impl Key {
    /// Create a new key.
    pub fn new(data: KeyData, usage: KeyUsage) -> Self {
        Self {
            name: None,
            data,
            usage,
            x509_chain: Vec::new(),
        }
    }

    /// Set the key name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Convert to a `SigningKey` for use with signature algorithms.
    pub fn to_signing_key(&self) -> sigtuna_crypto::sign::SigningKey {
        match &self.data {
            KeyData::Rsa {
                private: Some(pk), ..
            } => sigtuna_crypto::sign::SigningKey::Rsa(pk.clone()),
            KeyData::Rsa { public, .. } => {
                sigtuna_crypto::sign::SigningKey::RsaPublic(public.clone())
            }
            KeyData::EcP256 {
                private: Some(sk), ..
            } => sigtuna_crypto::sign::SigningKey::EcP256(sk.clone()),
            KeyData::EcP256 { public, .. } => {
                sigtuna_crypto::sign::SigningKey::EcP256Public(*public)
            }
        }
    }

    /// The default signature method URI for this key type.
    pub fn signature_algorithm(&self) -> &'static str {
        match &self.data {
            KeyData::Rsa { .. } => algorithm::RSA_SHA256,
            KeyData::EcP256 { .. } => algorithm::ECDSA_SHA256,
        }
    }

    /// Get the RSA public key if available.
    pub fn rsa_public_key(&self) -> Option<&rsa::RsaPublicKey> {
        match &self.data {
            KeyData::Rsa { public, .. } => Some(public),
            _ => None,
        }
    }

    /// Get the RSA private key if available.
    pub fn rsa_private_key(&self) -> Option<&rsa::RsaPrivateKey> {
        match &self.data {
            KeyData::Rsa {
                private: Some(pk), ..
            } => Some(pk),
            _ => None,
        }
    }

    /// Whether this key carries private material.
    pub fn has_private(&self) -> bool {
        match &self.data {
            KeyData::Rsa { private, .. } => private.is_some(),
            KeyData::EcP256 { private, .. } => private.is_some(),
        }
    }
}
