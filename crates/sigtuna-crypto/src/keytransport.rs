#![forbid(unsafe_code)]

//! RSA key transport (PKCS#1 v1.5 and OAEP) for wrapping session keys.

use sigtuna_core::{algorithm, Error};

/// Trait for key transport algorithms.
pub trait KeyTransportAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn encrypt(&self, public_key: &rsa::RsaPublicKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error>;
}

/// Create a key transport algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn KeyTransportAlgorithm>, Error> {
    match uri {
        algorithm::RSA_PKCS1 => Ok(Box::new(RsaPkcs1)),
        algorithm::RSA_OAEP => Ok(Box::new(RsaOaepSha1)),
        _ => Err(Error::UnsupportedAlgorithm(format!("key transport: {uri}"))),
    }
}

struct RsaPkcs1;

impl KeyTransportAlgorithm for RsaPkcs1 {
    fn uri(&self) -> &'static str {
        algorithm::RSA_PKCS1
    }

    fn encrypt(&self, public_key: &rsa::RsaPublicKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        public_key
            .encrypt(&mut rand::thread_rng(), rsa::Pkcs1v15Encrypt, data)
            .map_err(|e| Error::Crypto(format!("RSA PKCS#1 encrypt: {e}")))
    }

    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        private_key
            .decrypt(rsa::Pkcs1v15Encrypt, data)
            .map_err(|e| Error::Crypto(format!("RSA PKCS#1 decrypt: {e}")))
    }
}

/// RSA-OAEP with MGF1/SHA-1, the `rsa-oaep-mgf1p` profile.
struct RsaOaepSha1;

impl KeyTransportAlgorithm for RsaOaepSha1 {
    fn uri(&self) -> &'static str {
        algorithm::RSA_OAEP
    }

    fn encrypt(&self, public_key: &rsa::RsaPublicKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        public_key
            .encrypt(&mut rand::thread_rng(), rsa::Oaep::new::<sha1::Sha1>(), data)
            .map_err(|e| Error::Crypto(format!("RSA-OAEP encrypt: {e}")))
    }

    fn decrypt(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        private_key
            .decrypt(rsa::Oaep::new::<sha1::Sha1>(), data)
            .map_err(|e| Error::Crypto(format!("RSA-OAEP decrypt: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oaep_wrap_unwrap_roundtrip() {
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let public = private.to_public_key();
        let transport = from_uri(algorithm::RSA_OAEP).unwrap();
        let session_key = [0x42u8; 32];
        let wrapped = transport.encrypt(&public, &session_key).unwrap();
        assert_eq!(transport.decrypt(&private, &wrapped).unwrap(), session_key);
    }

    #[test]
    fn unwrap_with_wrong_key_fails() {
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let other = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let transport = from_uri(algorithm::RSA_OAEP).unwrap();
        let wrapped = transport.encrypt(&private.to_public_key(), &[1u8; 16]).unwrap();
        assert!(transport.decrypt(&other, &wrapped).is_err());
    }

    #[test]
    fn pkcs1_wrap_unwrap_roundtrip() {
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let transport = from_uri(algorithm::RSA_PKCS1).unwrap();
        let wrapped = transport.encrypt(&private.to_public_key(), &[7u8; 24]).unwrap();
        assert_eq!(transport.decrypt(&private, &wrapped).unwrap(), [7u8; 24]);
    }
}
