//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use generational_arena::Index;
use termtree::Tree;

use crate::config::DisplayConfig;
use crate::domain::{DecisionTree, NodeData, NodeId, NodeType, PropagationReport};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Tell the user that probabilities must be fixed, naming the offending parents.
pub fn advisory(tree: &DecisionTree, report: &PropagationReport) {
    if !report.advisory() {
        return;
    }
    warning(&"probabilities must be fixed before expected cost is available");
    for id in &report.invalid_groups {
        let name = tree
            .node(id)
            .map(|n| n.data.to_string())
            .unwrap_or_else(|| id.to_string());
        failure(&format!("children of {} ({})", name, id.short()));
    }
}

/// Name and short id of the parent of `id`, if it has one.
pub fn parent_label(tree: &DecisionTree, id: &NodeId) -> Option<String> {
    tree.parent_of(id)
        .map(|p| format!("{} ({})", p.data, p.data.id.short()))
}

/// One-line label for a node with its derived fields.
pub fn node_label(data: &NodeData, display: &DisplayConfig) -> String {
    let p = display.precision;
    let mut label = data.to_string();
    if display.show_ids {
        label.push_str(&format!(" ({})", data.id.short()).dimmed().to_string());
    }

    let mut parts = Vec::new();
    if !matches!(data.node_type, NodeType::Start | NodeType::Decision) {
        parts.push(format!("p={:.*}", p, data.probability));
    }
    if data.node_type != NodeType::Exit {
        parts.push(format!("cost={:.*}", p, data.cost));
        parts.push(format!("time={:.*}", p, data.time));
    }
    parts.push(format!("t={:.*}", p, data.cumulative_time));
    parts.push(format!("E={:.*}", p, data.expected_cost));
    label.push_str("  ");
    label.push_str(&parts.join(" "));

    if data.valid_prob {
        label
    } else {
        format!("{} {}", label.red(), "(!)".red().bold())
    }
}

/// Build a printable tree rooted at the START node.
pub fn render_tree(tree: &DecisionTree, display: &DisplayConfig) -> Tree<String> {
    render_subtree(tree, tree.root(), display)
}

fn render_subtree(tree: &DecisionTree, idx: Index, display: &DisplayConfig) -> Tree<String> {
    let label = tree
        .get_node(idx)
        .map(|n| node_label(&n.data, display))
        .unwrap_or_default();
    let leaves = tree
        .get_node(idx)
        .map(|n| n.children.clone())
        .unwrap_or_default()
        .into_iter()
        .map(|child| render_subtree(tree, child, display));
    Tree::new(label).with_leaves(leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_tree, propagate, NodeDocument, NodeFields};

    fn plain() -> DisplayConfig {
        colored::control::set_override(false);
        DisplayConfig {
            precision: 1,
            show_ids: false,
        }
    }

    #[test]
    fn given_action_when_labelling_then_shows_probability_and_derived_fields() {
        let display = plain();
        let mut data = NodeData::new(
            NodeType::Action,
            NodeFields {
                name: "Build".into(),
                probability: 0.5,
                cost: 10.0,
                time: 2.0,
            },
        );
        data.cumulative_time = 3.0;
        data.expected_cost = crate::domain::ExpectedCost::Available(10.0);

        let label = node_label(&data, &display);

        assert_eq!(label, "[A] Build  p=0.5 cost=10.0 time=2.0 t=3.0 E=10.0");
    }

    #[test]
    fn given_default_tree_when_rendering_then_single_start_line() {
        let display = plain();
        let mut tree = DecisionTree::new();
        propagate(&mut tree);

        let rendered = render_tree(&tree, &display).to_string();

        assert_eq!(rendered.trim_end(), "[S] Start  cost=0.0 time=0.0 t=0.0 E=0.0");
    }

    #[test]
    fn given_child_when_labelling_parent_then_names_parent_and_root_has_none() {
        let doc: NodeDocument = serde_json::from_str(
            r#"{"id": "s0", "name": "Start", "nodeType": "start", "children": [
                {"id": "d1abcdef", "name": "Choose", "nodeType": "decision"}
            ]}"#,
        )
        .unwrap();
        let tree = build_tree(&doc).unwrap();

        let label = parent_label(&tree, &NodeId::from("d1abcdef"));

        assert_eq!(label.as_deref(), Some("[S] Start (s0)"));
        assert_eq!(parent_label(&tree, &NodeId::from("s0")), None);
    }
}
