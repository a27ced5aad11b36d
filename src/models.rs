//! Core models for the navedit library
//!
//! This module contains the navigation tree types and the pure, identity-keyed
//! operations that read and rewrite them. Every operation returns a new tree
//! and leaves its argument untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wire name of the top-level sibling group
pub const TOP_LEVEL_GROUP: &str = "navigation-list";

const CHILDREN_PREFIX: &str = "children-";

/// Errors raised for trees or keys that break the data contract
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("node '{id}' nests deeper than two levels")]
    TooDeep { id: String },

    #[error("invalid group key '{0}'")]
    InvalidGroupKey(String),
}

/// A single entry in the navigation menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavNode {
    id: String,
    title: String,
    #[serde(rename = "url")]
    target: String,
    visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<NavNode>>,
}

impl NavNode {
    /// Creates a visible leaf node
    pub fn leaf(id: impl Into<String>, title: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            target: target.into(),
            visible: true,
            children: None,
        }
    }

    /// Creates a visible parent node. An empty `children` still makes a parent.
    pub fn parent(
        id: impl Into<String>,
        title: impl Into<String>,
        target: impl Into<String>,
        children: Vec<NavNode>,
    ) -> Self {
        Self {
            children: Some(children),
            ..Self::leaf(id, title, target)
        }
    }

    /// Returns a copy of this node with the given visibility
    pub fn with_visible(self, visible: bool) -> Self {
        Self { visible, ..self }
    }

    /// Returns a copy of this node marked hidden
    pub fn hidden(self) -> Self {
        self.with_visible(false)
    }

    /// Returns a copy of this node with the given title
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The opaque link reference (`url` on the wire)
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Children of a parent node, `None` for leaves
    pub fn children(&self) -> Option<&[NavNode]> {
        self.children.as_deref()
    }

    pub fn is_parent(&self) -> bool {
        self.children.is_some()
    }
}

/// Identifies one sibling group: the top-level sequence or one parent's children
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GroupKey {
    TopLevel,
    ChildrenOf(String),
}

impl GroupKey {
    pub fn children_of(parent_id: impl Into<String>) -> Self {
        GroupKey::ChildrenOf(parent_id.into())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::TopLevel => f.write_str(TOP_LEVEL_GROUP),
            GroupKey::ChildrenOf(parent_id) => write!(f, "{}{}", CHILDREN_PREFIX, parent_id),
        }
    }
}

impl FromStr for GroupKey {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == TOP_LEVEL_GROUP {
            return Ok(GroupKey::TopLevel);
        }
        match s.strip_prefix(CHILDREN_PREFIX) {
            Some(parent_id) if !parent_id.is_empty() => Ok(GroupKey::children_of(parent_id)),
            _ => Err(TreeError::InvalidGroupKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for GroupKey {
    type Error = TreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupKey> for String {
    fn from(key: GroupKey) -> Self {
        key.to_string()
    }
}

/// Analytics payload describing one successful reorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    #[serde(rename = "id")]
    pub item_id: String,
    #[serde(rename = "from")]
    pub from_index: usize,
    #[serde(rename = "to")]
    pub to_index: usize,
}

/// The ordered forest of navigation entries, at most two levels deep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavTree(Vec<NavNode>);

impl NavTree {
    pub fn new(nodes: Vec<NavNode>) -> Self {
        Self(nodes)
    }

    /// Top-level nodes in order
    pub fn nodes(&self) -> &[NavNode] {
        &self.0
    }

    pub fn into_nodes(self) -> Vec<NavNode> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every id in depth-first order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for node in &self.0 {
            ids.push(node.id());
            for child in node.children().unwrap_or_default() {
                ids.push(child.id());
            }
        }
        ids
    }

    /// Finds a node by id, searching the top level and one level below it
    pub fn find_node(&self, id: &str) -> Option<&NavNode> {
        for node in &self.0 {
            if node.id == id {
                return Some(node);
            }
            if let Some(child) = node.children().and_then(|c| c.iter().find(|c| c.id == id)) {
                return Some(child);
            }
        }
        None
    }

    /// Returns a new tree where the node matching `id` is replaced by `f(node)`.
    ///
    /// An unknown id yields a tree equal to `self`.
    pub fn update_node<F>(&self, id: &str, f: F) -> NavTree
    where
        F: Fn(&NavNode) -> NavNode,
    {
        NavTree(rewrite(&self.0, id, &f, 0))
    }

    /// Resolves a group key to its concrete sibling sequence.
    ///
    /// `None` when the named parent does not exist at the top level or is a leaf.
    pub fn sibling_group(&self, group: &GroupKey) -> Option<&[NavNode]> {
        match group {
            GroupKey::TopLevel => Some(&self.0),
            GroupKey::ChildrenOf(parent_id) => self
                .0
                .iter()
                .find(|node| node.id == *parent_id)
                .and_then(|node| node.children()),
        }
    }

    /// Returns a new tree with one sibling group replaced
    pub fn replace_sibling_group(&self, group: &GroupKey, siblings: Vec<NavNode>) -> NavTree {
        match group {
            GroupKey::TopLevel => NavTree(siblings),
            GroupKey::ChildrenOf(parent_id) => NavTree(
                self.0
                    .iter()
                    .map(|node| {
                        if node.id == *parent_id && node.is_parent() {
                            NavNode {
                                children: Some(siblings.clone()),
                                ..node.clone()
                            }
                        } else {
                            node.clone()
                        }
                    })
                    .collect(),
            ),
        }
    }

    /// Checks the two-level depth invariant
    pub fn validate(&self) -> Result<(), TreeError> {
        for node in &self.0 {
            if let Some(nested) = node
                .children()
                .unwrap_or_default()
                .iter()
                .find(|child| child.is_parent())
            {
                return Err(TreeError::TooDeep {
                    id: nested.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Sets visibility on the node matching `id`
    pub fn set_visibility(&self, id: &str, visible: bool) -> NavTree {
        self.update_node(id, |node| node.clone().with_visible(visible))
    }

    /// Flips visibility on the node matching `id`
    pub fn toggle_visibility(&self, id: &str) -> NavTree {
        self.update_node(id, |node| node.clone().with_visible(!node.visible))
    }

    /// Renames the node matching `id`. Empty titles pass through.
    pub fn set_title(&self, id: &str, title: &str) -> NavTree {
        self.update_node(id, |node| node.clone().with_title(title))
    }
}

// depth 0 is the top level; children are visited only from there
fn rewrite<F>(nodes: &[NavNode], id: &str, f: &F, depth: usize) -> Vec<NavNode>
where
    F: Fn(&NavNode) -> NavNode,
{
    nodes
        .iter()
        .map(|node| {
            if node.id == id {
                return f(node);
            }
            match &node.children {
                Some(children) if depth == 0 => NavNode {
                    children: Some(rewrite(children, id, f, depth + 1)),
                    ..node.clone()
                },
                _ => node.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_tree() -> NavTree {
        NavTree::new(vec![
            NavNode::leaf("1", "Dashboard", "/"),
            NavNode::parent(
                "2",
                "Apps",
                "/apps",
                vec![
                    NavNode::leaf("2-1", "A", "/apps/a"),
                    NavNode::leaf("2-2", "B", "/apps/b").hidden(),
                ],
            ),
        ])
    }

    #[test]
    fn test_find_node_at_both_levels() {
        let tree = sample_tree();

        assert_eq!(tree.find_node("1").map(NavNode::title), Some("Dashboard"));
        assert_eq!(tree.find_node("2-2").map(NavNode::title), Some("B"));
        assert!(tree.find_node("missing").is_none());
    }

    #[test]
    fn test_update_node_unknown_id_is_noop() {
        let tree = sample_tree();
        let updated = tree.update_node("nope", |node| node.clone().with_title("changed"));

        assert_eq!(updated, tree);
    }

    #[test]
    fn test_update_node_leaves_argument_untouched() {
        let tree = sample_tree();
        let updated = tree.set_title("2-1", "Renamed");

        assert_eq!(tree.find_node("2-1").unwrap().title(), "A");
        assert_eq!(updated.find_node("2-1").unwrap().title(), "Renamed");
    }

    #[test]
    fn test_set_visibility_touches_only_target() {
        let tree = sample_tree();
        let updated = tree.set_visibility("2-2", true);

        assert!(updated.find_node("2-2").unwrap().is_visible());
        assert_eq!(updated.find_node("1"), tree.find_node("1"));
        assert_eq!(updated.find_node("2-1"), tree.find_node("2-1"));

        let parent_before = tree.find_node("2").unwrap();
        let parent_after = updated.find_node("2").unwrap();
        assert_eq!(parent_after.title(), parent_before.title());
        assert_eq!(parent_after.is_visible(), parent_before.is_visible());
    }

    #[test]
    fn test_toggle_visibility_twice_restores() {
        let tree = sample_tree();
        let twice = tree.toggle_visibility("2-2").toggle_visibility("2-2");

        assert_eq!(twice, tree);
        assert!(tree.toggle_visibility("2-2").find_node("2-2").unwrap().is_visible());
    }

    #[test]
    fn test_set_title_accepts_empty() {
        let updated = sample_tree().set_title("1", "");
        assert_eq!(updated.find_node("1").unwrap().title(), "");
    }

    #[test]
    fn test_sibling_group_resolution() {
        let tree = sample_tree();

        assert_eq!(tree.sibling_group(&GroupKey::TopLevel).unwrap().len(), 2);
        assert_eq!(
            tree.sibling_group(&GroupKey::children_of("2")).unwrap().len(),
            2
        );
        // leaves and unknown parents have no group
        assert!(tree.sibling_group(&GroupKey::children_of("1")).is_none());
        assert!(tree.sibling_group(&GroupKey::children_of("9")).is_none());
    }

    #[test]
    fn test_replace_sibling_group_children() {
        let tree = sample_tree();
        let reversed: Vec<NavNode> = tree
            .sibling_group(&GroupKey::children_of("2"))
            .unwrap()
            .iter()
            .rev()
            .cloned()
            .collect();
        let updated = tree.replace_sibling_group(&GroupKey::children_of("2"), reversed);

        assert_eq!(updated.ids(), vec!["1", "2", "2-2", "2-1"]);
        // a leaf never gains children
        let untouched = tree.replace_sibling_group(&GroupKey::children_of("1"), vec![]);
        assert_eq!(untouched, tree);
    }

    #[test]
    fn test_validate_rejects_third_level() {
        assert!(sample_tree().validate().is_ok());

        let deep = NavTree::new(vec![NavNode::parent(
            "a",
            "A",
            "/a",
            vec![NavNode::parent("a-1", "A1", "/a/1", vec![])],
        )]);
        assert_eq!(
            deep.validate(),
            Err(TreeError::TooDeep {
                id: "a-1".to_string()
            })
        );
    }

    #[test]
    fn test_group_key_wire_names() {
        assert_eq!("navigation-list".parse::<GroupKey>(), Ok(GroupKey::TopLevel));
        assert_eq!(
            "children-2".parse::<GroupKey>(),
            Ok(GroupKey::children_of("2"))
        );
        assert_eq!(GroupKey::children_of("2-1").to_string(), "children-2-1");
        assert!("children-".parse::<GroupKey>().is_err());
        assert!("sidebar".parse::<GroupKey>().is_err());
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(sample_tree()).unwrap();

        assert_eq!(json[0]["url"], "/");
        assert!(json[0].get("children").is_none());
        assert_eq!(json[1]["children"][1]["visible"], false);

        let record = MoveRecord {
            item_id: "2".to_string(),
            from_index: 1,
            to_index: 0,
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({ "id": "2", "from": 1, "to": 0 })
        );
    }

    #[test]
    fn test_empty_children_stay_present() {
        let raw = r#"[{"id":"p","title":"P","url":"/p","visible":true,"children":[]}]"#;
        let tree: NavTree = serde_json::from_str(raw).unwrap();

        assert!(tree.find_node("p").unwrap().is_parent());
        assert_eq!(serde_json::to_string(&tree).unwrap(), raw);
    }
}
