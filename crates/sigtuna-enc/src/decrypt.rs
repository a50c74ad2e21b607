#![forbid(unsafe_code)]

//! XML-Enc element decryption.
//!
//! Processing order:
//! 1. Parse `<xenc:EncryptedData>`
//! 2. Read `<xenc:EncryptionMethod>` to select the content cipher
//! 3. Unwrap the session key from `<xenc:EncryptedKey>` inside
//!    `<ds:KeyInfo>` using the recipient's RSA private key
//! 4. Decrypt `<xenc:CipherData>/<xenc:CipherValue>`
//!
//! Every failure path — wrong key, corrupted ciphertext, unsupported
//! algorithm — surfaces as `Error::Decryption`.

use base64::Engine;
use sigtuna_core::{algorithm, ns, Error};
use sigtuna_keys::Key;
use sigtuna_xml::{find_child, find_element};
use tracing::debug;

/// Decrypt a serialized `<xenc:EncryptedData>` element.
///
/// Returns the serialized plaintext subtree.
pub fn decrypt_element(cipher_xml: &str, key: &Key) -> Result<String, Error> {
    decrypt_inner(cipher_xml, key).map_err(|e| match e {
        Error::Decryption(_) => e,
        other => Error::Decryption(other.to_string()),
    })
}

fn decrypt_inner(cipher_xml: &str, key: &Key) -> Result<String, Error> {
    let doc = roxmltree::Document::parse_with_options(cipher_xml, sigtuna_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;

    let enc_data = find_element(&doc, ns::ENC, ns::node::ENCRYPTED_DATA)
        .ok_or_else(|| Error::MissingElement("EncryptedData".into()))?;

    let enc_method = find_child(enc_data, ns::ENC, ns::node::ENCRYPTION_METHOD)
        .ok_or_else(|| Error::MissingElement("EncryptionMethod".into()))?;
    let enc_uri = enc_method
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on EncryptionMethod".into()))?;
    let cipher = sigtuna_crypto::cipher::from_uri(enc_uri)?;

    let mut session_key = unwrap_session_key(enc_data, key)?;
    // A wrapped key larger than the content cipher needs is truncated to
    // the cipher's key size.
    if session_key.len() > cipher.key_size() {
        session_key.truncate(cipher.key_size());
    }

    let cipher_data = find_child(enc_data, ns::ENC, ns::node::CIPHER_DATA)
        .ok_or_else(|| Error::MissingElement("CipherData".into()))?;
    let cipher_bytes = read_cipher_value(cipher_data)?;

    let plaintext = cipher.decrypt(&session_key, &cipher_bytes)?;
    debug!(algorithm = enc_uri, "element decrypted");
    String::from_utf8(plaintext)
        .map_err(|e| Error::Decryption(format!("plaintext is not valid UTF-8: {e}")))
}

/// Unwrap the session key from the `<xenc:EncryptedKey>` in KeyInfo.
fn unwrap_session_key(
    enc_data: roxmltree::Node<'_, '_>,
    key: &Key,
) -> Result<Vec<u8>, Error> {
    let key_info = find_child(enc_data, ns::DSIG, ns::node::KEY_INFO)
        .ok_or_else(|| Error::MissingElement("KeyInfo on EncryptedData".into()))?;
    let enc_key = find_child(key_info, ns::ENC, ns::node::ENCRYPTED_KEY)
        .ok_or_else(|| Error::MissingElement("EncryptedKey".into()))?;

    let enc_method = find_child(enc_key, ns::ENC, ns::node::ENCRYPTION_METHOD)
        .ok_or_else(|| Error::MissingElement("EncryptionMethod on EncryptedKey".into()))?;
    let transport_uri = enc_method
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on EncryptedKey".into()))?;

    match transport_uri {
        algorithm::RSA_PKCS1 | algorithm::RSA_OAEP => {
            let transport = sigtuna_crypto::keytransport::from_uri(transport_uri)?;
            let private_key = key
                .rsa_private_key()
                .ok_or_else(|| Error::Key("RSA private key required for decryption".into()))?;
            let cipher_data = find_child(enc_key, ns::ENC, ns::node::CIPHER_DATA)
                .ok_or_else(|| Error::MissingElement("CipherData on EncryptedKey".into()))?;
            let wrapped = read_cipher_value(cipher_data)?;
            transport.decrypt(private_key, &wrapped)
        }
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "EncryptedKey method: {transport_uri}"
        ))),
    }
}

/// Read and decode `<xenc:CipherValue>` from a CipherData element.
fn read_cipher_value(cipher_data: roxmltree::Node<'_, '_>) -> Result<Vec<u8>, Error> {
    let cipher_value = find_child(cipher_data, ns::ENC, ns::node::CIPHER_VALUE)
        .ok_or_else(|| Error::MissingElement("CipherValue".into()))?;
    let clean: String = cipher_value
        .text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(&clean)
        .map_err(|e| Error::Base64(format!("CipherValue: {e}")))
}
