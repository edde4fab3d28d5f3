//! Core domain types for the topicloom synthesis pipeline.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Terminal placeholder substituted when synthesis cannot be completed for a
/// topic. A fixed, non-error marker that preserves document completeness.
pub const PLACEHOLDER_TEXT: &str = "*Content for this topic could not be generated.*";

/// Separator between node names when a [`TopicPath`] is rendered as a
/// search query or map key.
pub const PATH_SEPARATOR: &str = " > ";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper tagging one pipeline invocation (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TopicNode
// ---------------------------------------------------------------------------

/// A node in the input topic hierarchy.
///
/// Supplied once per pipeline invocation as nested JSON records and never
/// mutated by the pipeline. The tree is finite and acyclic by construction;
/// depth is caller-defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicNode {
    /// Display name, also a segment of every descendant's [`TopicPath`].
    pub name: String,
    /// Ordered child topics.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TopicNode>,
}

impl TopicNode {
    /// Create a leaf node.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Create a node with children.
    pub fn branch(name: impl Into<String>, children: Vec<TopicNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in the subtree rooted here (including self).
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TopicNode::node_count).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// TopicPath
// ---------------------------------------------------------------------------

/// Ordered sequence of node names from the tree root to a node, inclusive.
///
/// Encodes full ancestry, so two distinct nodes never collide as map keys
/// even when their names match. Doubles as the human-readable search query
/// via [`TopicPath::as_query`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicPath(Vec<String>);

impl TopicPath {
    /// Path containing only the root node's name.
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Extend this path with a child node's name.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// The node names, root first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Depth of the addressed node (root = 1).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Render as the joined query string, e.g. `"Root > A > B"`.
    pub fn as_query(&self) -> String {
        self.0.join(PATH_SEPARATOR)
    }
}

impl std::fmt::Display for TopicPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_query())
    }
}

// ---------------------------------------------------------------------------
// SourceCandidate
// ---------------------------------------------------------------------------

/// One externally discovered locator considered as supporting material for a
/// topic's synthesized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCandidate {
    /// Opaque locator (URL) returned by the search backend.
    pub url: String,
    /// 0-based position in the backend's relevance ordering.
    pub rank: usize,
}

// ---------------------------------------------------------------------------
// TopicSummary
// ---------------------------------------------------------------------------

/// The settled result for one topic: either a synthesized paragraph or the
/// terminal placeholder. Exactly one of these per topic once its task has
/// completed — never both, never absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicSummary {
    /// A polished paragraph accepted from the generation backend.
    Generated(String),
    /// Synthesis could not be completed; rendered as [`PLACEHOLDER_TEXT`].
    Unavailable,
}

impl TopicSummary {
    /// The text to render into the document.
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) => text,
            Self::Unavailable => PLACEHOLDER_TEXT,
        }
    }

    /// Whether this summary carries generated content.
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_path_query_joins_ancestry() {
        let path = TopicPath::root("Root").child("History").child("Antiquity");
        assert_eq!(path.as_query(), "Root > History > Antiquity");
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn topic_paths_distinguish_same_name_at_different_places() {
        let root = TopicPath::root("Root");
        let a = root.child("A").child("Intro");
        let b = root.child("B").child("Intro");
        assert_ne!(a, b);
    }

    #[test]
    fn tree_deserializes_from_nested_records() {
        let json = r#"{"name":"Root","children":[{"name":"A"},{"name":"B","children":[{"name":"C"}]}]}"#;
        let tree: TopicNode = serde_json::from_str(json).expect("deserialize tree");
        assert_eq!(tree.name, "Root");
        assert_eq!(tree.children.len(), 2);
        assert!(tree.children[0].is_leaf());
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn summary_text_falls_back_to_placeholder() {
        assert_eq!(TopicSummary::Unavailable.text(), PLACEHOLDER_TEXT);
        assert_eq!(TopicSummary::Generated("body".into()).text(), "body");
        assert!(!TopicSummary::Unavailable.is_generated());
    }

    #[test]
    fn run_id_is_displayable() {
        let id = RunId::new();
        assert_eq!(id.to_string().len(), 36);
    }
}
