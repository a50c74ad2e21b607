#![forbid(unsafe_code)]

//! XML helpers for the Sigtuna SAML assertion library.
//!
//! Provides element lookup over `roxmltree`, ID attribute registration,
//! `NodeSet` operations needed for canonicalization and the
//! enveloped-signature transform, and a small writer for serialization.

pub mod nodeset;
pub mod writer;

pub use nodeset::NodeSet;
pub use writer::XmlWriter;

use std::collections::HashMap;

/// Return roxmltree parsing options that allow DTD.
///
/// DTD is allowed because roxmltree does not expand external entities or
/// perform entity substitution beyond the five predefined XML entities.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Find the first descendant element with the given namespace and local name.
pub fn find_element<'a>(
    doc: &'a roxmltree::Document<'a>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    doc.descendants().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns_uri
    })
}

/// Find the first child element with the given namespace and local name.
pub fn find_child<'a>(
    parent: roxmltree::Node<'a, 'a>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    parent.children().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns_uri
    })
}

/// Find all child elements with the given namespace and local name.
pub fn find_children<'a>(
    parent: roxmltree::Node<'a, 'a>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'a>> {
    parent
        .children()
        .filter(|n| {
            n.is_element()
                && n.tag_name().name() == local_name
                && n.tag_name().namespace().unwrap_or("") == ns_uri
        })
        .collect()
}

/// Trimmed text content of an element, if any.
pub fn element_text<'a>(node: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    let text = node.text()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Build the ID → NodeId mapping for a parsed document.
///
/// Registers the default ID attribute names (`Id`, `ID`, `id`).
pub fn build_id_map(doc: &roxmltree::Document<'_>) -> HashMap<String, roxmltree::NodeId> {
    let attr_names = ["Id", "ID", "id"];
    let mut map = HashMap::new();
    for node in doc.descendants() {
        if node.is_element() {
            for attr_name in &attr_names {
                if let Some(val) = node.attribute(*attr_name) {
                    map.insert(val.to_owned(), node.id());
                }
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_helpers_respect_namespace() {
        let xml = r#"<a xmlns="urn:x" xmlns:y="urn:y"><b/><y:b/><y:b/></a>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        assert!(find_child(root, "urn:x", "b").is_some());
        assert_eq!(find_children(root, "urn:y", "b").len(), 2);
        assert!(find_child(root, "urn:z", "b").is_none());
    }

    #[test]
    fn id_map_registers_default_attrs() {
        let xml = r#"<a ID="one"><b Id="two"><c id="three"/></b></a>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let map = build_id_map(&doc);
        assert_eq!(map.len(), 3);
        let node = doc.get_node(*map.get("two").unwrap()).unwrap();
        assert_eq!(node.tag_name().name(), "b");
    }
}
