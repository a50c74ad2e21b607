#![forbid(unsafe_code)]

//! XML-DSig verification, split in two stages:
//!
//! 1. `verify_reference` — pure integrity: for each `<Reference>`, resolve
//!    the URI, apply transforms, and compare digests.  No key required.
//! 2. `read_signature` + `verify_signature` — extract the signature block
//!    (method, canonical SignedInfo, value, certificates) and check it
//!    cryptographically against a caller-supplied key.

use base64::Engine;
use sigtuna_c14n::C14nMode;
use sigtuna_core::{algorithm, ns, Error};
use sigtuna_keys::Key;
use sigtuna_xml::{find_child, find_children, NodeSet};
use std::collections::HashMap;
use tracing::debug;

/// An extracted `<ds:Signature>` block, ready for key-based verification.
#[derive(Debug, Clone)]
pub struct SignatureBlock {
    /// The SignatureMethod algorithm URI.
    pub algorithm: String,
    /// Exclusive-canonical form of `<ds:SignedInfo>`.
    pub canonical_signed_info: Vec<u8>,
    /// The decoded SignatureValue.
    pub signature_value: Vec<u8>,
    /// Base64 DER bodies of the embedded X509 certificates, in order.
    pub certificates: Vec<String>,
}

/// Validate every `<Reference>` digest of the document's signature.
///
/// A digest mismatch raises [`Error::ReferenceValidation`].  A document
/// without a `<ds:Signature>` passes trivially.
pub fn verify_reference(xml: &str) -> Result<(), Error> {
    let doc = roxmltree::Document::parse_with_options(xml, sigtuna_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    let root = doc.root_element();

    let sig_node = match find_child(root, ns::DSIG, ns::node::SIGNATURE) {
        Some(n) => n,
        None => return Ok(()),
    };
    let signed_info = find_child(sig_node, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

    let id_map = sigtuna_xml::build_id_map(&doc);
    let references = find_children(signed_info, ns::DSIG, ns::node::REFERENCE);
    if references.is_empty() {
        return Err(Error::MissingElement("Reference".into()));
    }

    for reference in &references {
        verify_one_reference(*reference, &doc, &id_map, root, sig_node)?;
    }
    debug!(references = references.len(), "reference digests validated");
    Ok(())
}

fn verify_one_reference(
    reference: roxmltree::Node<'_, '_>,
    doc: &roxmltree::Document<'_>,
    id_map: &HashMap<String, roxmltree::NodeId>,
    root: roxmltree::Node<'_, '_>,
    sig_node: roxmltree::Node<'_, '_>,
) -> Result<(), Error> {
    let uri = reference.attribute(ns::attr::URI).unwrap_or("");

    let digest_method = find_child(reference, ns::DSIG, ns::node::DIGEST_METHOD)
        .ok_or_else(|| Error::MissingElement("DigestMethod".into()))?;
    let digest_uri = digest_method
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on DigestMethod".into()))?;

    let digest_value = find_child(reference, ns::DSIG, ns::node::DIGEST_VALUE)
        .ok_or_else(|| Error::MissingElement("DigestValue".into()))?;
    let expected = decode_base64(digest_value.text().unwrap_or(""))
        .map_err(|e| Error::Base64(format!("DigestValue: {e}")))?;

    // Resolve the reference target.
    let target = if uri.is_empty() {
        root
    } else if let Some(id) = uri.strip_prefix('#') {
        let node_id = id_map
            .get(id)
            .ok_or_else(|| Error::XmlStructure(format!("cannot resolve reference URI #{id}")))?;
        doc.get_node(*node_id)
            .ok_or_else(|| Error::XmlStructure(format!("cannot resolve reference URI #{id}")))?
    } else {
        return Err(Error::XmlStructure(format!(
            "external reference URI not supported: {uri}"
        )));
    };

    // Apply transforms: enveloped-signature subtracts the signature
    // subtree; a canonicalization transform selects mode and prefix list.
    let mut node_set = NodeSet::tree_without_comments(target);
    let mut mode = C14nMode::Exclusive;
    let mut prefixes: Vec<String> = Vec::new();

    if let Some(transforms) = find_child(reference, ns::DSIG, ns::node::TRANSFORMS) {
        for transform in find_children(transforms, ns::DSIG, ns::node::TRANSFORM) {
            let t_uri = transform.attribute(ns::attr::ALGORITHM).unwrap_or("");
            match t_uri {
                algorithm::ENVELOPED_SIGNATURE => node_set.subtract_tree(sig_node),
                _ => {
                    mode = C14nMode::from_uri(t_uri)
                        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("transform: {t_uri}")))?;
                    prefixes = read_inclusive_prefixes(transform);
                }
            }
        }
    }

    let canonical = sigtuna_c14n::canonicalize_doc(doc, mode, Some(&node_set), &prefixes)?;
    let computed = sigtuna_crypto::digest::digest(digest_uri, &canonical)?;

    if computed != expected {
        return Err(Error::ReferenceValidation(format!(
            "digest mismatch for URI=\"{uri}\""
        )));
    }
    Ok(())
}

/// Extract the document's `<ds:Signature>` block, if present.
pub fn read_signature(xml: &str) -> Result<Option<SignatureBlock>, Error> {
    let doc = roxmltree::Document::parse_with_options(xml, sigtuna_xml::parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    let root = doc.root_element();

    let sig_node = match find_child(root, ns::DSIG, ns::node::SIGNATURE) {
        Some(n) => n,
        None => return Ok(None),
    };
    let signed_info = find_child(sig_node, ns::DSIG, ns::node::SIGNED_INFO)
        .ok_or_else(|| Error::MissingElement("SignedInfo".into()))?;

    let c14n_method = find_child(signed_info, ns::DSIG, ns::node::CANONICALIZATION_METHOD)
        .ok_or_else(|| Error::MissingElement("CanonicalizationMethod".into()))?;
    let c14n_uri = c14n_method
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on CanonicalizationMethod".into()))?;
    let mode = C14nMode::from_uri(c14n_uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
    let prefixes = read_inclusive_prefixes(c14n_method);

    let sig_method = find_child(signed_info, ns::DSIG, ns::node::SIGNATURE_METHOD)
        .ok_or_else(|| Error::MissingElement("SignatureMethod".into()))?;
    let sig_method_uri = sig_method
        .attribute(ns::attr::ALGORITHM)
        .ok_or_else(|| Error::MissingAttribute("Algorithm on SignatureMethod".into()))?;

    let signed_info_set = NodeSet::tree_without_comments(signed_info);
    let canonical_signed_info =
        sigtuna_c14n::canonicalize_doc(&doc, mode, Some(&signed_info_set), &prefixes)?;

    let sig_value_node = find_child(sig_node, ns::DSIG, ns::node::SIGNATURE_VALUE)
        .ok_or_else(|| Error::MissingElement("SignatureValue".into()))?;
    let signature_value = decode_base64(sig_value_node.text().unwrap_or(""))
        .map_err(|e| Error::Base64(format!("SignatureValue: {e}")))?;

    let certificates = extract_certificates(sig_node);

    Ok(Some(SignatureBlock {
        algorithm: sig_method_uri.to_owned(),
        canonical_signed_info,
        signature_value,
        certificates,
    }))
}

/// The base64 DER bodies of all `<ds:X509Certificate>` elements inside the
/// signature's `<ds:KeyInfo>`, in document order.
pub fn extract_certificates(sig_node: roxmltree::Node<'_, '_>) -> Vec<String> {
    let mut certs = Vec::new();
    if let Some(key_info) = find_child(sig_node, ns::DSIG, ns::node::KEY_INFO) {
        for x509_data in find_children(key_info, ns::DSIG, ns::node::X509_DATA) {
            for cert in find_children(x509_data, ns::DSIG, ns::node::X509_CERTIFICATE) {
                let body: String = cert
                    .text()
                    .unwrap_or("")
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect();
                if !body.is_empty() {
                    certs.push(body);
                }
            }
        }
    }
    certs
}

/// Cryptographically verify an extracted signature block against a key.
///
/// Any failure — wrong key, malformed value, key-type mismatch — surfaces
/// as [`Error::SignatureValidation`].
pub fn verify_signature(block: &SignatureBlock, key: &Key) -> Result<(), Error> {
    let alg = sigtuna_crypto::sign::from_uri(&block.algorithm)?;
    let valid = alg
        .verify(
            &key.to_signing_key(),
            &block.canonical_signed_info,
            &block.signature_value,
        )
        .map_err(|e| Error::SignatureValidation(e.to_string()))?;
    if valid {
        debug!(algorithm = %block.algorithm, "signature verified");
        Ok(())
    } else {
        Err(Error::SignatureValidation(
            "signature does not match the given key".into(),
        ))
    }
}

pub(crate) fn read_inclusive_prefixes(node: roxmltree::Node<'_, '_>) -> Vec<String> {
    for child in node.children() {
        if child.is_element() && child.tag_name().name() == ns::node::INCLUSIVE_NAMESPACES {
            if let Some(prefix_list) = child.attribute(ns::attr::PREFIX_LIST) {
                return prefix_list
                    .split_whitespace()
                    .map(|s| s.to_owned())
                    .collect();
            }
        }
    }
    Vec::new()
}

pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let clean: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(clean)
}
