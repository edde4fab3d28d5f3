//! Hierarchical document assembler.
//!
//! Renders the original topic tree plus the completed summary map into one
//! Markdown document: a heading per node at its depth-derived level,
//! followed by that node's summary where the policy says so. The rendering
//! mirrors the tree's shape and order exactly, so the output is
//! byte-identical for value-equal maps no matter in which order the
//! concurrent tasks populated them.

use std::collections::HashMap;

use topicloom_shared::{PLACEHOLDER_TEXT, Result, TopicLoomError, TopicNode, TopicPath, TopicSummary};

/// Which nodes contribute a text block to the document.
///
/// The policy is fixed per pipeline invocation and applied uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyMode {
    /// Summaries render under leaf nodes only; branch nodes are headings.
    LeavesOnly,
    /// Every node renders its summary, branches included.
    EveryNode,
}

impl AssemblyMode {
    /// Parse the config/CLI mode string: "leaf" or "all".
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "leaf" => Ok(Self::LeavesOnly),
            "all" => Ok(Self::EveryNode),
            other => Err(TopicLoomError::validation(format!(
                "unknown assembly mode '{other}' (expected \"leaf\" or \"all\")"
            ))),
        }
    }
}

/// Render the tree and its summary map into the final document.
///
/// A topic missing from the map renders as the terminal placeholder — the
/// map should be complete, but assembly must not fail if a topic was
/// skipped.
pub fn assemble(
    root: &TopicNode,
    summaries: &HashMap<TopicPath, TopicSummary>,
    mode: AssemblyMode,
) -> String {
    let mut out = String::new();
    render_node(&mut out, root, &TopicPath::root(&root.name), 1, summaries, mode);
    format!("{}\n", out.trim_end())
}

fn render_node(
    out: &mut String,
    node: &TopicNode,
    path: &TopicPath,
    depth: usize,
    summaries: &HashMap<TopicPath, TopicSummary>,
    mode: AssemblyMode,
) {
    out.push_str(&"#".repeat(depth));
    out.push(' ');
    out.push_str(&node.name);
    out.push_str("\n\n");

    let renders_text = match mode {
        AssemblyMode::LeavesOnly => node.is_leaf(),
        AssemblyMode::EveryNode => true,
    };

    if renders_text {
        let text = summaries
            .get(path)
            .map(TopicSummary::text)
            .unwrap_or(PLACEHOLDER_TEXT);
        out.push_str(text);
        out.push_str("\n\n");
    }

    for child in &node.children {
        render_node(out, child, &path.child(&child.name), depth + 1, summaries, mode);
    }
}
