//! Derived-field propagation
//!
//! Two passes over the whole tree, always from the root:
//! - time (pre-order): `cumulative_time = parent.cumulative_time + time`
//! - cost (post-order): `expected_cost = cost + Σ child.expected_cost × child.probability`
//!
//! A sibling group whose probabilities do not sum to 1 (within
//! [`PROBABILITY_TOLERANCE`]) marks its members `valid_prob = false` and makes
//! the parent's expected cost unavailable. Unavailability propagates to every
//! ancestor.

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::domain::arena::DecisionTree;
use crate::domain::entities::{ExpectedCost, NodeId};

pub const PROBABILITY_TOLERANCE: f64 = 1e-4;

/// Summary of one propagation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationReport {
    /// Parents whose children's probabilities do not sum to 1
    pub invalid_groups: Vec<NodeId>,
    /// Expected cost at the root after propagation
    pub root_expected_cost: ExpectedCost,
    /// Cumulative time at the deepest point of the tree
    pub max_cumulative_time: f64,
}

impl Default for PropagationReport {
    fn default() -> Self {
        Self {
            invalid_groups: Vec::new(),
            root_expected_cost: ExpectedCost::Available(0.0),
            max_cumulative_time: 0.0,
        }
    }
}

impl PropagationReport {
    /// True when the user should be told to fix probabilities.
    pub fn advisory(&self) -> bool {
        !self.invalid_groups.is_empty()
    }
}

/// Recompute every derived field of `tree`.
#[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
pub fn propagate(tree: &mut DecisionTree) -> PropagationReport {
    let max_cumulative_time = propagate_time(tree);
    let mut report = propagate_cost(tree);
    report.max_cumulative_time = max_cumulative_time;
    debug!(
        invalid_groups = report.invalid_groups.len(),
        root_expected_cost = %report.root_expected_cost,
        "propagation complete"
    );
    report
}

fn propagate_time(tree: &mut DecisionTree) -> f64 {
    let order: Vec<(Index, Option<Index>)> = tree.iter().map(|(idx, n)| (idx, n.parent)).collect();
    let mut max_time: f64 = 0.0;

    for (idx, parent) in order {
        let base = parent
            .and_then(|p| tree.get_node(p))
            .map(|p| p.data.cumulative_time)
            .unwrap_or(0.0);
        if let Some(node) = tree.get_node_mut(idx) {
            let time = if node.data.time.is_finite() {
                node.data.time
            } else {
                0.0
            };
            node.data.cumulative_time = base + time;
            max_time = max_time.max(node.data.cumulative_time);
        }
    }
    max_time
}

fn propagate_cost(tree: &mut DecisionTree) -> PropagationReport {
    let mut report = PropagationReport::default();
    let order: Vec<Index> = tree.iter_postorder().map(|(idx, _)| idx).collect();

    for idx in order {
        let (cost, children) = match tree.get_node(idx) {
            Some(node) => (node.data.cost, node.children.clone()),
            None => continue,
        };

        if children.is_empty() {
            if let Some(node) = tree.get_node_mut(idx) {
                node.data.expected_cost = ExpectedCost::Available(cost);
            }
            continue;
        }

        let total: f64 = children
            .iter()
            .filter_map(|&c| tree.get_node(c))
            .map(|c| c.data.probability)
            .sum();
        let valid = (total - 1.0).abs() <= PROBABILITY_TOLERANCE;

        let expected = if valid {
            children
                .iter()
                .filter_map(|&c| tree.get_node(c))
                .try_fold(cost, |acc, c| {
                    c.data
                        .expected_cost
                        .value()
                        .map(|v| acc + v * c.data.probability)
                })
                .map_or(ExpectedCost::Unavailable, ExpectedCost::Available)
        } else {
            ExpectedCost::Unavailable
        };

        for &c in &children {
            if let Some(child) = tree.get_node_mut(c) {
                child.data.valid_prob = valid;
            }
        }
        if let Some(node) = tree.get_node_mut(idx) {
            node.data.expected_cost = expected;
            if !valid {
                trace!(id = %node.data.id, total, "probabilities do not sum to 1");
                report.invalid_groups.push(node.data.id.clone());
            }
        }
    }

    let root = tree.root();
    if let Some(node) = tree.get_node_mut(root) {
        node.data.valid_prob = true;
        report.root_expected_cost = node.data.expected_cost;
    }
    report
}
