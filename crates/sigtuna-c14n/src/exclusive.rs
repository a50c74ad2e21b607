#![forbid(unsafe_code)]

//! Exclusive Canonical XML 1.0 (exc-C14N).
//!
//! Algorithm URI: `http://www.w3.org/2001/10/xml-exc-c14n#`
//! With comments: `http://www.w3.org/2001/10/xml-exc-c14n#WithComments`
//!
//! Only "visibly utilized" namespace declarations are output.  A namespace
//! is visibly utilized on an element if:
//! 1. Its prefix is used by the element's tag name, OR
//! 2. Its prefix is used by one of the element's attributes, OR
//! 3. The prefix appears in the InclusiveNamespaces PrefixList.

use crate::escape;
use crate::render::{Attr, NsDecl};
use sigtuna_core::{ns, Error};
use sigtuna_xml::NodeSet;
use std::collections::{BTreeMap, HashSet};

/// Canonicalize a parsed document (or a document subset) using
/// Exclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
    inclusive_prefixes: &[String],
) -> Result<Vec<u8>, Error> {
    let prefix_set: HashSet<String> = inclusive_prefixes.iter().cloned().collect();
    let mut output = Vec::new();
    let ctx = ExcC14nContext {
        with_comments,
        node_set,
        inclusive_prefixes: prefix_set,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct ExcC14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
    inclusive_prefixes: HashSet<String>,
}

impl ExcC14nContext<'_> {
    fn is_visible(&self, node: roxmltree::Node<'_, '_>) -> bool {
        match self.node_set {
            None => true,
            Some(set) => set.contains(node),
        }
    }

    fn process_node(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if node.is_root() {
            for child in node.children() {
                self.process_node(child, output, rendered_ns)?;
            }
        } else if node.is_element() {
            self.process_element(node, output, rendered_ns)?;
        } else if node.is_text() {
            if self.is_visible(node) {
                let text = node.text().unwrap_or("");
                output.extend_from_slice(escape::escape_text(text).as_bytes());
            }
        } else if node.is_comment() {
            if self.with_comments && self.is_visible(node) {
                let text = node.text().unwrap_or("");
                let at_root = node.parent().is_some_and(|p| p.is_root());
                if at_root && has_preceding_element(node) {
                    output.push(b'\n');
                }
                output.extend_from_slice(b"<!--");
                output.extend_from_slice(text.as_bytes());
                output.extend_from_slice(b"-->");
                if at_root && has_following_element(node) {
                    output.push(b'\n');
                }
            }
        } else if node.is_pi() {
            if self.is_visible(node) {
                let pi = node.pi().ok_or_else(|| {
                    Error::Canonicalization("processing instruction without data".into())
                })?;
                output.extend_from_slice(b"<?");
                output.extend_from_slice(pi.target.as_bytes());
                if let Some(value) = pi.value {
                    if !value.is_empty() {
                        output.push(b' ');
                        output.extend_from_slice(value.replace('\r', "&#xD;").as_bytes());
                    }
                }
                output.extend_from_slice(b"?>");
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: roxmltree::Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered_ns: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(node) {
            // Invisible elements render nothing themselves; exclusive C14N
            // renders namespace declarations only on visible start tags.
            for child in node.children() {
                self.process_node(child, output, rendered_ns)?;
            }
            return Ok(());
        }

        let elem_prefix = element_prefix(node);

        // Visibly utilized namespace prefixes for this element.
        let mut utilized: HashSet<String> = HashSet::new();
        utilized.insert(elem_prefix.clone());
        for attr in node.attributes() {
            if let Some(uri) = attr.namespace() {
                if uri == ns::XML {
                    continue;
                }
                if let Some(prefix) = node.lookup_prefix(uri) {
                    utilized.insert(prefix.to_owned());
                }
            }
        }
        for p in &self.inclusive_prefixes {
            if p == "#default" {
                utilized.insert(String::new());
            } else {
                utilized.insert(p.clone());
            }
        }

        // Namespace declarations that must be output here.
        let mut ns_decls: Vec<NsDecl> = Vec::new();
        for prefix in &utilized {
            if prefix == "xml" {
                continue;
            }
            let lookup = if prefix.is_empty() {
                node.lookup_namespace_uri(None)
            } else {
                node.lookup_namespace_uri(Some(prefix.as_str()))
            };
            match lookup {
                Some(uri) => {
                    if rendered_ns.get(prefix.as_str()).map(String::as_str) != Some(uri) {
                        ns_decls.push(NsDecl {
                            prefix: prefix.clone(),
                            uri: uri.to_owned(),
                        });
                    }
                }
                None => {
                    // Default namespace undeclared here but previously
                    // rendered non-empty: emit xmlns="".
                    if prefix.is_empty()
                        && rendered_ns.get("").is_some_and(|u| !u.is_empty())
                    {
                        ns_decls.push(NsDecl {
                            prefix: String::new(),
                            uri: String::new(),
                        });
                    }
                }
            }
        }
        ns_decls.sort();

        // Attributes in canonical order.
        let mut attrs: Vec<Attr> = Vec::new();
        for attr in node.attributes() {
            let ns_uri = attr.namespace().unwrap_or("");
            let qname = if ns_uri.is_empty() {
                attr.name().to_owned()
            } else if ns_uri == ns::XML {
                format!("xml:{}", attr.name())
            } else {
                match node.lookup_prefix(ns_uri) {
                    Some(prefix) if !prefix.is_empty() => {
                        format!("{}:{}", prefix, attr.name())
                    }
                    _ => attr.name().to_owned(),
                }
            };
            attrs.push(Attr {
                ns_uri: ns_uri.to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name: qname,
                value: attr.value().to_owned(),
            });
        }
        attrs.sort();

        let elem_name = if elem_prefix.is_empty() {
            node.tag_name().name().to_owned()
        } else {
            format!("{}:{}", elem_prefix, node.tag_name().name())
        };

        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for decl in &ns_decls {
            output.extend_from_slice(decl.render().as_bytes());
        }
        for attr in &attrs {
            output.extend_from_slice(attr.render().as_bytes());
        }
        output.push(b'>');

        let mut child_rendered_ns = rendered_ns.clone();
        for decl in &ns_decls {
            child_rendered_ns.insert(decl.prefix.clone(), decl.uri.clone());
        }

        for child in node.children() {
            self.process_node(child, output, &child_rendered_ns)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// The prefix of an element's tag name ("" when unprefixed).
fn element_prefix(node: roxmltree::Node<'_, '_>) -> String {
    node.tag_name()
        .namespace()
        .and_then(|uri| node.lookup_prefix(uri))
        .unwrap_or("")
        .to_owned()
}

fn has_preceding_element(node: roxmltree::Node<'_, '_>) -> bool {
    let mut sib = node.prev_sibling();
    while let Some(s) = sib {
        if s.is_element() {
            return true;
        }
        sib = s.prev_sibling();
    }
    false
}

fn has_following_element(node: roxmltree::Node<'_, '_>) -> bool {
    let mut sib = node.next_sibling();
    while let Some(s) = sib {
        if s.is_element() {
            return true;
        }
        sib = s.next_sibling();
    }
    false
}
