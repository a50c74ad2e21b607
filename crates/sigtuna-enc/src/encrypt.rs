#![forbid(unsafe_code)]

//! XML-Enc element encryption.
//!
//! Produces an `<xenc:EncryptedData>` block of Type `Element`: the
//! plaintext subtree is encrypted with a fresh AES-256-CBC session key,
//! and the session key is wrapped for the recipient with RSA-OAEP inside
//! `<xenc:EncryptedKey>`.

use base64::Engine;
use rand::RngCore;
use sigtuna_core::{algorithm, ns, Error};
use sigtuna_keys::Key;
use sigtuna_xml::XmlWriter;
use tracing::debug;

/// Encrypt a serialized XML element for the given recipient key.
///
/// Returns the serialized `<xenc:EncryptedData>` element.
pub fn encrypt_element(plain_xml: &str, key: &Key) -> Result<String, Error> {
    let public_key = key
        .rsa_public_key()
        .ok_or_else(|| Error::Key("RSA public key required for encryption".into()))?;

    let cipher = sigtuna_crypto::cipher::from_uri(algorithm::AES256_CBC)?;
    let mut session_key = vec![0u8; cipher.key_size()];
    rand::thread_rng().fill_bytes(&mut session_key);

    let ciphertext = cipher.encrypt(&session_key, plain_xml.as_bytes())?;

    let transport = sigtuna_crypto::keytransport::from_uri(algorithm::RSA_OAEP)?;
    let wrapped_key = transport.encrypt(public_key, &session_key)?;

    let engine = base64::engine::general_purpose::STANDARD;
    let cipher_b64 = engine.encode(&ciphertext);
    let wrapped_b64 = engine.encode(&wrapped_key);

    let mut w = XmlWriter::new();
    w.start_element(
        "xenc:EncryptedData",
        &[
            ("xmlns:xenc", ns::ENC),
            ("Type", ns::ENC_TYPE_ELEMENT),
        ],
    );
    w.start_element(
        "xenc:EncryptionMethod",
        &[("Algorithm", algorithm::AES256_CBC)],
    );
    w.end_element("xenc:EncryptionMethod");
    w.start_element("ds:KeyInfo", &[("xmlns:ds", ns::DSIG)]);
    w.start_element("xenc:EncryptedKey", &[]);
    w.start_element(
        "xenc:EncryptionMethod",
        &[("Algorithm", algorithm::RSA_OAEP)],
    );
    w.end_element("xenc:EncryptionMethod");
    w.start_element("xenc:CipherData", &[]);
    w.text_element("xenc:CipherValue", &[], &wrapped_b64);
    w.end_element("xenc:CipherData");
    w.end_element("xenc:EncryptedKey");
    w.end_element("ds:KeyInfo");
    w.start_element("xenc:CipherData", &[]);
    w.text_element("xenc:CipherValue", &[], &cipher_b64);
    w.end_element("xenc:CipherData");
    w.end_element("xenc:EncryptedData");

    debug!(bytes = plain_xml.len(), "element encrypted");
    Ok(w.into_string())
}
