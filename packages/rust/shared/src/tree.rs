//! Topic path enumeration.
//!
//! Walks an input tree and yields one `(TopicPath, &TopicNode)` pair per
//! node in stable pre-order: parent before children, children in their
//! given order. The walk is lazy, finite, and restartable, and uses an
//! explicit stack rather than recursion so arbitrarily deep trees cannot
//! overflow.

use crate::types::{TopicNode, TopicPath};

/// Start a pre-order walk over `root`.
pub fn walk(root: &TopicNode) -> TopicWalk<'_> {
    TopicWalk {
        stack: vec![(root, TopicPath::root(&root.name))],
    }
}

/// Lazy pre-order iterator over a topic tree. Created by [`walk`].
pub struct TopicWalk<'a> {
    stack: Vec<(&'a TopicNode, TopicPath)>,
}

impl<'a> Iterator for TopicWalk<'a> {
    type Item = (TopicPath, &'a TopicNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, path) = self.stack.pop()?;

        // Push children in reverse so the first child is popped next.
        for child in node.children.iter().rev() {
            self.stack.push((child, path.child(&child.name)));
        }

        Some((path, node))
    }
}
