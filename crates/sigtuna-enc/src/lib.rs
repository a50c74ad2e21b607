#![forbid(unsafe_code)]

//! XML Encryption engine for SAML encrypted attributes: element-level
//! encryption and decryption per XML-Enc, with RSA key transport of a
//! per-element AES session key.

pub mod decrypt;
pub mod encrypt;

pub use decrypt::decrypt_element;
pub use encrypt::encrypt_element;

#[cfg(test)]
mod tests {
    use super::*;
    use sigtuna_core::Error;
    use sigtuna_keys::{Key, KeyData, KeyUsage};

    fn rsa_keypair() -> (Key, Key) {
        let private = rsa::RsaPrivateKey::new(&mut rand::thread_rng(), 2048).unwrap();
        let public = private.to_public_key();
        let private_key = Key::new(
            KeyData::Rsa {
                private: Some(private),
                public: public.clone(),
            },
            KeyUsage::Decrypt,
        );
        let public_key = Key::new(
            KeyData::Rsa {
                private: None,
                public,
            },
            KeyUsage::Encrypt,
        );
        (public_key, private_key)
    }

    const ATTRIBUTE: &str = concat!(
        r#"<saml:Attribute xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" "#,
        r#"Name="urn:some:string">"#,
        r#"<saml:AttributeValue>value</saml:AttributeValue>"#,
        r#"</saml:Attribute>"#
    );

    #[test]
    fn element_roundtrip() {
        let (public_key, private_key) = rsa_keypair();
        let encrypted = encrypt_element(ATTRIBUTE, &public_key).unwrap();
        assert!(encrypted.starts_with("<xenc:EncryptedData"));
        assert!(!encrypted.contains("value"));
        let decrypted = decrypt_element(&encrypted, &private_key).unwrap();
        assert_eq!(decrypted, ATTRIBUTE);
    }

    #[test]
    fn wrong_key_is_a_decryption_error() {
        let (public_key, _) = rsa_keypair();
        let (_, other_private) = rsa_keypair();
        let encrypted = encrypt_element(ATTRIBUTE, &public_key).unwrap();
        assert!(matches!(
            decrypt_element(&encrypted, &other_private),
            Err(Error::Decryption(_))
        ));
    }

    #[test]
    fn corrupted_ciphertext_is_a_decryption_error() {
        let (public_key, private_key) = rsa_keypair();
        let encrypted = encrypt_element(ATTRIBUTE, &public_key).unwrap();
        // Flip a chunk of the content CipherValue.
        let corrupted = encrypted.replacen("</xenc:CipherValue></xenc:CipherData></xenc:EncryptedData>", "AAAA</xenc:CipherValue></xenc:CipherData></xenc:EncryptedData>", 1);
        assert_ne!(encrypted, corrupted);
        assert!(matches!(
            decrypt_element(&corrupted, &private_key),
            Err(Error::Decryption(_))
        ));
    }

    #[test]
    fn encrypting_without_rsa_material_fails() {
        let sk = p256::ecdsa::SigningKey::random(&mut rand::thread_rng());
        let vk = *sk.verifying_key();
        let ec_key = Key::new(
            KeyData::EcP256 {
                private: Some(sk),
                public: vk,
            },
            KeyUsage::Any,
        );
        assert!(matches!(
            encrypt_element(ATTRIBUTE, &ec_key),
            Err(Error::Key(_))
        ));
    }
}
