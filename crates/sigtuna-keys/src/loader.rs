#![forbid(unsafe_code)]

//! Key and certificate loading from PEM, plus the helpers that bridge
//! `<ds:X509Certificate>` base64 contents and PEM bodies.

use crate::key::{Key, KeyData, KeyUsage};
use sigtuna_core::Error;

/// Load a private key from PEM text (RSA PKCS#8, RSA PKCS#1, or EC P-256).
pub fn load_private_key_pem(pem_str: &str) -> Result<Key, Error> {
    use pkcs8::DecodePrivateKey;

    // RSA PKCS#8 first
    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_pem(pem_str) {
        let public = pk.to_public_key();
        return Ok(Key::new(
            KeyData::Rsa {
                private: Some(pk),
                public,
            },
            KeyUsage::Any,
        ));
    }

    // RSA PKCS#1
    use pkcs1::DecodeRsaPrivateKey;
    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs1_pem(pem_str) {
        let public = pk.to_public_key();
        return Ok(Key::new(
            KeyData::Rsa {
                private: Some(pk),
                public,
            },
            KeyUsage::Any,
        ));
    }

    // EC P-256 PKCS#8
    if let Ok(sk) = p256::ecdsa::SigningKey::from_pkcs8_pem(pem_str) {
        let vk = *sk.verifying_key();
        return Ok(Key::new(
            KeyData::EcP256 {
                private: Some(sk),
                public: vk,
            },
            KeyUsage::Any,
        ));
    }

    Err(Error::Key("unrecognized private key PEM".into()))
}

/// Load a public key from PEM text: an X.509 certificate or a bare SPKI
/// public key.
pub fn load_public_key_pem(pem_str: &str) -> Result<Key, Error> {
    let block = pem::parse(pem_str).map_err(|e| Error::Key(format!("invalid PEM: {e}")))?;
    match block.tag() {
        "CERTIFICATE" => load_certificate_der(block.contents()),
        "PUBLIC KEY" => load_spki_der(block.contents()),
        tag => Err(Error::Key(format!("unsupported PEM block: {tag}"))),
    }
}

/// Load a public key from a DER-encoded X.509 certificate.
///
/// The certificate itself is retained on the key's `x509_chain` so it can
/// be embedded into `<ds:KeyInfo>` when signing.
pub fn load_certificate_der(der: &[u8]) -> Result<Key, Error> {
    use der::{Decode, Encode};
    use x509_cert::Certificate;

    let cert = Certificate::from_der(der)
        .map_err(|e| Error::Certificate(format!("failed to parse certificate: {e}")))?;

    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;

    let mut key = load_spki_der(&spki_der)?;
    key.x509_chain = vec![der.to_vec()];
    Ok(key)
}

/// Load a public key from DER-encoded SubjectPublicKeyInfo.
pub fn load_spki_der(spki_der: &[u8]) -> Result<Key, Error> {
    use spki::DecodePublicKey;

    if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(spki_der) {
        return Ok(Key::new(
            KeyData::Rsa {
                private: None,
                public: pk,
            },
            KeyUsage::Verify,
        ));
    }
    if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(Key::new(
            KeyData::EcP256 {
                private: None,
                public: vk,
            },
            KeyUsage::Verify,
        ));
    }
    Err(Error::Key("unsupported public key type in SPKI".into()))
}

/// Normalize certificate material to the base64 body carried inside
/// `<ds:X509Certificate>`: strips PEM armor and whitespace.
pub fn certificate_body(pem_or_base64: &str) -> String {
    pem_or_base64
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .flat_map(|line| line.chars())
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsa_pkcs8_private_key_roundtrip() {
        use pkcs8::EncodePrivateKey;
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let pem = private
            .to_pkcs8_pem(pkcs8::LineEnding::LF)
            .unwrap()
            .to_string();
        let key = load_private_key_pem(&pem).unwrap();
        assert_eq!(key.rsa_private_key(), Some(&private));
        assert!(key.has_private());
    }

    #[test]
    fn ec_p256_private_key_loads() {
        use pkcs8::EncodePrivateKey;
        let sk = p256::SecretKey::random(&mut rand::thread_rng());
        let pem = sk.to_pkcs8_pem(pkcs8::LineEnding::LF).unwrap().to_string();
        let key = load_private_key_pem(&pem).unwrap();
        assert!(matches!(key.data, KeyData::EcP256 { private: Some(_), .. }));
    }

    #[test]
    fn spki_public_key_roundtrip() {
        use spki::EncodePublicKey;
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let public = private.to_public_key();
        let pem = public
            .to_public_key_pem(pkcs8::LineEnding::LF)
            .unwrap();
        let key = load_public_key_pem(&pem).unwrap();
        assert_eq!(key.rsa_public_key(), Some(&public));
        assert!(!key.has_private());
    }

    #[test]
    fn certificate_body_strips_armor() {
        let pem = "-----BEGIN CERTIFICATE-----\nAAAA\nBBBB\n-----END CERTIFICATE-----\n";
        assert_eq!(certificate_body(pem), "AAAABBBB");
        assert_eq!(certificate_body("AAAA BBBB"), "AAAABBBB");
    }

    #[test]
    fn garbage_pem_is_rejected() {
        assert!(load_private_key_pem("not a key").is_err());
        assert!(load_public_key_pem("not a key").is_err());
    }
}
