//! Serialized tree document
//!
//! The JSON exchange format: one object per node, nested via `children`,
//! rooted at a START node. Derived fields are written for inspection but
//! never trusted on load.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{DecisionTree, TreeNode};
use crate::domain::constraints::can_add_child;
use crate::domain::entities::{NodeData, NodeId, NodeType};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::fields::{NodeFields, RawFields, RawNumber};

/// File name used when exporting without an explicit target.
pub const DEFAULT_EXPORT_FILE: &str = "decision_tree.json";

/// One node of the exchange document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "nodeType")]
    pub node_type: NodeType,
    #[serde(default, with = "lenient_number")]
    pub probability: Option<f64>,
    #[serde(default, with = "lenient_number")]
    pub cost: Option<f64>,
    #[serde(default, with = "lenient_number")]
    pub time: Option<f64>,
    #[serde(default, with = "lenient_number")]
    pub cumulative_time: Option<f64>,
    #[serde(default)]
    pub valid_prob: Option<bool>,
    #[serde(default, with = "lenient_number")]
    pub expected_cost: Option<f64>,
    #[serde(default)]
    pub children: Vec<NodeDocument>,
}

impl NodeDocument {
    /// Render `tree` verbatim, derived fields included.
    #[instrument(level = "debug", skip(tree), fields(nodes = tree.len()))]
    pub fn from_tree(tree: &DecisionTree) -> Self {
        Self::from_node(tree, tree.root_node())
    }

    fn from_node(tree: &DecisionTree, node: &TreeNode) -> Self {
        let data = &node.data;
        Self {
            id: Some(data.id.to_string()),
            name: Some(data.name.clone()),
            node_type: data.node_type,
            probability: Some(data.probability),
            cost: Some(data.cost),
            time: Some(data.time),
            cumulative_time: Some(data.cumulative_time),
            valid_prob: Some(data.valid_prob),
            expected_cost: data.expected_cost.value(),
            children: node
                .children
                .iter()
                .filter_map(|&c| tree.get_node(c))
                .map(|child| Self::from_node(tree, child))
                .collect(),
        }
    }

    /// The user-supplied part of this node as raw input.
    fn raw_fields(&self) -> RawFields {
        RawFields {
            name: self.name.clone(),
            probability: self.probability.map(RawNumber::Number),
            cost: self.cost.map(RawNumber::Number),
            time: self.time.map(RawNumber::Number),
        }
    }

    /// Number of nodes in this document.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(NodeDocument::count).sum::<usize>()
    }

    /// Copy with every derived field cleared, for structural comparison.
    pub fn without_derived(&self) -> Self {
        Self {
            cumulative_time: None,
            valid_prob: None,
            expected_cost: None,
            children: self.children.iter().map(Self::without_derived).collect(),
            ..self.clone()
        }
    }
}

/// Build a tree from a parsed document.
///
/// Nothing is built unless the whole document is valid: the root must be
/// START, no other node may be START, ids must be unique, every edge obeys
/// the adjacency table and every node passes field validation. Forced values
/// are re-applied; derived fields are left for propagation.
#[instrument(level = "debug", skip(doc), fields(nodes = doc.count()))]
pub fn build_tree(doc: &NodeDocument) -> DomainResult<DecisionTree> {
    if doc.node_type != NodeType::Start {
        return Err(DomainError::InvalidDocument {
            location: "root".to_string(),
            reason: format!("root must be a start node, found {}", doc.node_type),
        });
    }

    let mut seen = HashSet::new();
    let root = node_data(doc, "root", false, &mut seen)?;
    let mut tree = DecisionTree::with_root(root);

    let mut stack: Vec<(&NodeDocument, generational_arena::Index, String)> =
        vec![(doc, tree.root(), "root".to_string())];
    while let Some((parent_doc, parent_idx, location)) = stack.pop() {
        for (i, child_doc) in parent_doc.children.iter().enumerate() {
            let child_location = format!("{}.children[{}]", location, i);
            if !can_add_child(parent_doc.node_type, child_doc.node_type) {
                return Err(DomainError::InvalidDocument {
                    location: child_location,
                    reason: format!(
                        "a {} node cannot have a {} child",
                        parent_doc.node_type, child_doc.node_type
                    ),
                });
            }
            let data = node_data(child_doc, &child_location, i > 0, &mut seen)?;
            let child_idx = tree.insert_child(parent_idx, data).map_err(|e| match e {
                DomainError::TooDeep { .. } => DomainError::InvalidDocument {
                    location: child_location.clone(),
                    reason: e.to_string(),
                },
                other => other,
            })?;
            stack.push((child_doc, child_idx, child_location));
        }
    }

    debug!(nodes = tree.len(), "document accepted");
    Ok(tree)
}

fn node_data(
    doc: &NodeDocument,
    location: &str,
    has_siblings: bool,
    seen: &mut HashSet<NodeId>,
) -> DomainResult<NodeData> {
    let id = match doc.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => NodeId::from(id),
        _ => NodeId::generate(),
    };
    if !seen.insert(id.clone()) {
        return Err(DomainError::InvalidDocument {
            location: location.to_string(),
            reason: format!("duplicate node id {}", id),
        });
    }

    let base = NodeFields::defaults_for(doc.node_type, has_siblings);
    let fields = doc
        .raw_fields()
        .resolve(doc.node_type, &base)
        .map_err(|e| DomainError::InvalidDocument {
            location: location.to_string(),
            reason: e.to_string(),
        })?;
    Ok(NodeData::with_id(id, doc.node_type, fields))
}

/// Numbers that may arrive as JSON numbers, numeric strings or null.
mod lenient_number {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<f64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) if v.is_finite() => s.serialize_f64(*v),
            _ => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Value::deserialize(d)? {
            Value::Null => Ok(None),
            Value::Number(n) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("number out of range: {}", n))),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("not a number: {:?}", s))),
            other => Err(D::Error::custom(format!("expected a number, found {}", other))),
        }
    }
}
