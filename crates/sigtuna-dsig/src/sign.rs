#![forbid(unsafe_code)]

//! XML-DSig enveloped signature creation.
//!
//! The assertion is signed in its serialized form: the canonical digest is
//! computed over the unsigned document, a `<ds:SignedInfo>` is built and
//! signed in its exclusive-canonical form, and the finished
//! `<ds:Signature>` is spliced in directly after `<saml:Issuer>` (the
//! schema position for an assertion signature).

use base64::Engine;
use sigtuna_c14n::C14nMode;
use sigtuna_core::{algorithm, ns, Error};
use sigtuna_keys::Key;
use sigtuna_xml::{find_child, NodeSet, XmlWriter};
use tracing::debug;

/// Sign a serialized assertion element with the given key.
///
/// `reference_id` is the assertion's `ID` attribute value; `certificates`
/// are base64 DER bodies (or PEM) embedded into `<ds:KeyInfo>`.
/// Returns the signed document.
pub fn sign_assertion(
    xml: &str,
    reference_id: &str,
    key: &Key,
    certificates: &[String],
) -> Result<String, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, sigtuna_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    let root = doc.root_element();

    let issuer = find_child(root, ns::SAML, ns::node::ISSUER)
        .ok_or_else(|| Error::MissingElement("Issuer".into()))?;
    let insert_at = issuer.range().end;

    let sig_alg_uri = key.signature_algorithm();
    let digest_uri = digest_for_signature(sig_alg_uri)?;

    // Digest over the exclusive-canonical form of the unsigned document.
    let node_set = NodeSet::tree_without_comments(root);
    let canonical = sigtuna_c14n::canonicalize_doc(
        &doc,
        C14nMode::Exclusive,
        Some(&node_set),
        &[],
    )?;
    let digest = sigtuna_crypto::digest::digest(digest_uri, &canonical)?;
    let engine = base64::engine::general_purpose::STANDARD;
    let digest_b64 = engine.encode(&digest);

    let signed_info = build_signed_info(sig_alg_uri, digest_uri, reference_id, &digest_b64);

    // The signature covers the exclusive-canonical form of SignedInfo.
    let canonical_signed_info =
        sigtuna_c14n::canonicalize(&signed_info, C14nMode::Exclusive, None, &[])?;

    let alg = sigtuna_crypto::sign::from_uri(sig_alg_uri)?;
    let signature_value = alg.sign(&key.to_signing_key(), &canonical_signed_info)?;
    let sig_b64 = engine.encode(&signature_value);

    let mut w = XmlWriter::new();
    w.start_element("ds:Signature", &[("xmlns:ds", ns::DSIG)]);
    w.raw(&signed_info);
    w.text_element("ds:SignatureValue", &[], &sig_b64);
    if !certificates.is_empty() {
        w.start_element("ds:KeyInfo", &[]);
        w.start_element("ds:X509Data", &[]);
        for cert in certificates {
            let body = sigtuna_keys::loader::certificate_body(cert);
            w.text_element("ds:X509Certificate", &[], &body);
        }
        w.end_element("ds:X509Data");
        w.end_element("ds:KeyInfo");
    }
    w.end_element("ds:Signature");
    let signature_block = w.into_string();

    debug!(algorithm = sig_alg_uri, reference = reference_id, "assertion signed");

    let mut result = String::with_capacity(xml.len() + signature_block.len());
    result.push_str(&xml[..insert_at]);
    result.push_str(&signature_block);
    result.push_str(&xml[insert_at..]);
    Ok(result)
}

/// Build the `<ds:SignedInfo>` element. Written compactly so its
/// serialized and canonical forms stay aligned.
fn build_signed_info(
    sig_alg_uri: &str,
    digest_uri: &str,
    reference_id: &str,
    digest_b64: &str,
) -> String {
    let mut w = XmlWriter::new();
    w.start_element("ds:SignedInfo", &[("xmlns:ds", ns::DSIG)]);
    w.start_element(
        "ds:CanonicalizationMethod",
        &[("Algorithm", algorithm::EXC_C14N)],
    );
    w.end_element("ds:CanonicalizationMethod");
    w.start_element("ds:SignatureMethod", &[("Algorithm", sig_alg_uri)]);
    w.end_element("ds:SignatureMethod");
    w.start_element("ds:Reference", &[("URI", &format!("#{reference_id}"))]);
    w.start_element("ds:Transforms", &[]);
    w.start_element(
        "ds:Transform",
        &[("Algorithm", algorithm::ENVELOPED_SIGNATURE)],
    );
    w.end_element("ds:Transform");
    w.start_element("ds:Transform", &[("Algorithm", algorithm::EXC_C14N)]);
    w.end_element("ds:Transform");
    w.end_element("ds:Transforms");
    w.start_element("ds:DigestMethod", &[("Algorithm", digest_uri)]);
    w.end_element("ds:DigestMethod");
    w.text_element("ds:DigestValue", &[], digest_b64);
    w.end_element("ds:Reference");
    w.end_element("ds:SignedInfo");
    w.into_string()
}

/// The digest algorithm paired with a signature method.
fn digest_for_signature(sig_alg_uri: &str) -> Result<&'static str, Error> {
    match sig_alg_uri {
        algorithm::RSA_SHA1 => Ok(algorithm::SHA1),
        algorithm::RSA_SHA256 | algorithm::ECDSA_SHA256 => Ok(algorithm::SHA256),
        algorithm::RSA_SHA384 => Ok(algorithm::SHA384),
        algorithm::RSA_SHA512 => Ok(algorithm::SHA512),
        _ => Err(Error::UnsupportedAlgorithm(format!(
            "signature algorithm: {sig_alg_uri}"
        ))),
    }
}
