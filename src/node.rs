//! Document tree model shared by the pipeline and the page-break engine.
//!
//! Nodes are plain owned values. Every transform in this crate consumes a
//! tree and returns a new one, so callers can keep the input around for
//! before/after comparisons.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Resolved box geometry for one node.
///
/// Offsets are relative to the parent's content origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxModel {
    /// Offset from the parent's top edge.
    pub top: f32,
    /// Offset from the parent's left edge.
    pub left: f32,
    /// Border-box width.
    pub width: f32,
    /// Border-box height; `None` while the height is unresolved.
    pub height: Option<f32>,
    /// Own top padding.
    pub padding_top: f32,
    /// Own bottom padding.
    pub padding_bottom: f32,
}

impl BoxModel {
    /// Height, treating an unresolved height as zero.
    pub fn resolved_height(&self) -> f32 {
        self.height.unwrap_or(0.0)
    }

    /// Bottom edge in parent coordinates.
    pub fn bottom(&self) -> f32 {
        self.top + self.resolved_height()
    }

    /// Combined vertical padding.
    pub fn vertical_padding(&self) -> f32 {
        self.padding_top + self.padding_bottom
    }
}

/// Node directives.
///
/// Only `break_before`, `wrap`, and `min_presence_ahead` are read by the
/// page-break machinery. Everything else rides along in `attributes`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Props {
    /// Forced break before this node.
    #[serde(rename = "break")]
    pub break_before: bool,
    /// `Some(false)` marks the node as unbreakable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
    /// Minimum height of this node that must fit on the current page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_presence_ahead: Option<f32>,
    /// Opaque directives owned by upstream stages.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Props {
    /// Whether the node may be split across pages.
    pub fn is_wrappable(&self) -> bool {
        self.wrap.unwrap_or(true)
    }
}

/// One content unit: geometry, directives, and ordered children.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    /// Resolved geometry.
    #[serde(rename = "box")]
    pub layout: BoxModel,
    /// Directives.
    pub props: Props,
    /// Children in render and break order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty node with the given resolved height.
    pub fn new(height: f32) -> Self {
        Self {
            layout: BoxModel {
                height: Some(height),
                ..BoxModel::default()
            },
            ..Self::default()
        }
    }

    /// Build a container from children.
    pub fn container(children: Vec<Node>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn with_top(mut self, top: f32) -> Self {
        self.layout.top = top;
        self
    }

    pub fn with_left(mut self, left: f32) -> Self {
        self.layout.left = left;
        self
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.layout.width = width;
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.layout.height = Some(height);
        self
    }

    /// Mark the height as unresolved.
    pub fn with_unresolved_height(mut self) -> Self {
        self.layout.height = None;
        self
    }

    pub fn with_padding(mut self, top: f32, bottom: f32) -> Self {
        self.layout.padding_top = top;
        self.layout.padding_bottom = bottom;
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_break(mut self, break_before: bool) -> Self {
        self.props.break_before = break_before;
        self
    }

    /// Mark the node as unbreakable.
    pub fn unbreakable(mut self) -> Self {
        self.props.wrap = Some(false);
        self
    }

    pub fn with_min_presence_ahead(mut self, height: f32) -> Self {
        self.props.min_presence_ahead = Some(height);
        self
    }

    /// Attach an opaque attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.attributes.insert(key.into(), value);
        self
    }

    pub fn top(&self) -> f32 {
        self.layout.top
    }

    /// Height, treating an unresolved height as zero.
    pub fn height(&self) -> f32 {
        self.layout.resolved_height()
    }

    pub fn bottom(&self) -> f32 {
        self.layout.bottom()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.props.attributes.get(key)
    }

    /// Lowest child bottom edge, or zero for leaves.
    pub fn content_extent(&self) -> f32 {
        self.children
            .iter()
            .map(Node::bottom)
            .fold(0.0_f32, f32::max)
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            return 1;
        }
        self.children.iter().map(Node::leaf_count).sum()
    }

    /// Visit leaves depth-first in document order.
    pub fn visit_leaves<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a Node),
    {
        if self.children.is_empty() {
            f(self);
            return;
        }
        for child in &self.children {
            child.visit_leaves(f);
        }
    }

    /// Apply `f` to every node, parents before children.
    pub fn map_tree<F>(self, f: &mut F) -> Node
    where
        F: FnMut(Node) -> Node,
    {
        let mut node = f(self);
        node.children = std::mem::take(&mut node.children)
            .into_iter()
            .map(|child| child.map_tree(f))
            .collect();
        node
    }

    /// Fallible variant of [`map_tree`](Self::map_tree).
    pub fn try_map_tree<F, E>(self, f: &mut F) -> Result<Node, E>
    where
        F: FnMut(Node) -> Result<Node, E>,
    {
        let mut node = f(self)?;
        let children = std::mem::take(&mut node.children);
        node.children = children
            .into_iter()
            .map(|child| child.try_map_tree(f))
            .collect::<Result<Vec<_>, E>>()?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_original_field_names() {
        let json = r#"{
            "box": { "top": 10, "height": 40, "paddingTop": 4, "paddingBottom": 6 },
            "props": { "break": true, "wrap": false, "id": "intro" },
            "children": [ { "box": { "height": 12 } } ]
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.top(), 10.0);
        assert_eq!(node.layout.height, Some(40.0));
        assert_eq!(node.layout.vertical_padding(), 10.0);
        assert!(node.props.break_before);
        assert!(!node.props.is_wrappable());
        assert_eq!(node.attribute("id"), Some(&serde_json::json!("intro")));
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn missing_height_stays_unresolved() {
        let node: Node = serde_json::from_str(r#"{ "box": { "top": 3 } }"#).unwrap();
        assert_eq!(node.layout.height, None);
        assert_eq!(node.height(), 0.0);
        assert_eq!(node.bottom(), 3.0);
    }

    #[test]
    fn content_extent_uses_lowest_child_edge() {
        let node = Node::new(100.0).with_children(vec![
            Node::new(30.0).with_top(50.0),
            Node::new(20.0).with_top(0.0),
        ]);
        assert_eq!(node.content_extent(), 80.0);
        assert_eq!(Node::new(5.0).content_extent(), 0.0);
    }

    #[test]
    fn leaves_are_visited_in_document_order() {
        let tree = Node::container(vec![
            Node::new(1.0).with_attribute("id", "a".into()),
            Node::container(vec![
                Node::new(1.0).with_attribute("id", "b".into()),
                Node::new(1.0).with_attribute("id", "c".into()),
            ]),
        ]);
        let mut ids = Vec::new();
        tree.visit_leaves(&mut |leaf| {
            ids.push(leaf.attribute("id").and_then(|v| v.as_str()).unwrap_or(""));
        });
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(tree.leaf_count(), 3);
    }

    #[test]
    fn try_map_tree_stops_on_first_error() {
        let tree = Node::container(vec![Node::new(1.0), Node::new(2.0), Node::new(3.0)]);
        let mut visited = 0;
        let result: Result<Node, &str> = tree.try_map_tree(&mut |node| {
            visited += 1;
            if node.height() == 2.0 {
                Err("boom")
            } else {
                Ok(node)
            }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(visited, 3);
    }
}
