#![forbid(unsafe_code)]

//! NodeSet type for document-subset canonicalization.
//!
//! A `NodeSet` is the set of nodes of a parsed document that are visible
//! to the canonicalizer.  The enveloped-signature transform is expressed
//! as subtracting the `<ds:Signature>` subtree from the set.
//!
//! Nodes are keyed by their byte offset in the source text, which is
//! stable for the lifetime of the parsed document.

use std::collections::HashSet;

/// A set of visible XML document nodes.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<usize>,
}

fn node_key(node: roxmltree::Node<'_, '_>) -> usize {
    node.range().start
}

impl NodeSet {
    /// Create an empty node set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node set for the subtree rooted at the given node,
    /// excluding comment nodes.
    pub fn tree_without_comments(root: roxmltree::Node<'_, '_>) -> Self {
        let mut set = Self::new();
        collect_subtree(root, &mut set.nodes, false);
        set
    }

    /// Create a node set for the subtree rooted at the given node,
    /// including comment nodes.
    pub fn tree_with_comments(root: roxmltree::Node<'_, '_>) -> Self {
        let mut set = Self::new();
        collect_subtree(root, &mut set.nodes, true);
        set
    }

    /// Remove the subtree rooted at the given node from this set.
    pub fn subtract_tree(&mut self, root: roxmltree::Node<'_, '_>) {
        self.nodes.remove(&node_key(root));
        for descendant in root.descendants().skip(1) {
            self.nodes.remove(&node_key(descendant));
        }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, node: roxmltree::Node<'_, '_>) -> bool {
        self.nodes.contains(&node_key(node))
    }

    /// Check if this set is empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the set.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn collect_subtree(
    node: roxmltree::Node<'_, '_>,
    set: &mut HashSet<usize>,
    include_comments: bool,
) {
    if !include_comments && node.is_comment() {
        return;
    }
    set.insert(node_key(node));
    for child in node.children() {
        collect_subtree(child, set, include_comments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtree_collection_skips_comments() {
        let xml = "<a><b>t</b><!-- c --><d/></a>";
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        let set = NodeSet::tree_without_comments(root);
        // a, b, text, d — the comment is excluded
        assert_eq!(set.len(), 4);
        let comment = root.children().find(|n| n.is_comment()).unwrap();
        assert!(!set.contains(comment));
    }

    #[test]
    fn subtract_tree_removes_descendants() {
        let xml = "<a><b><c>t</c></b><d/></a>";
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        let mut set = NodeSet::tree_without_comments(root);
        let b = root.first_element_child().unwrap();
        set.subtract_tree(b);
        assert!(!set.contains(b));
        let c = b.first_element_child().unwrap();
        assert!(!set.contains(c));
        let d = root.last_element_child().unwrap();
        assert!(set.contains(d));
    }
}
