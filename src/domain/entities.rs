//! Domain entities: core data structures

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::fields::NodeFields;

/// Kind of a decision tree node. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// The single root; cannot be deleted.
    Start,
    /// A point where the decision maker picks one action.
    Decision,
    /// Something the decision maker does; leads to outcomes or further decisions.
    Action,
    /// A chance result of an action.
    Outcome,
    /// Terminal node; never has children.
    Exit,
}

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Start,
        NodeType::Decision,
        NodeType::Action,
        NodeType::Outcome,
        NodeType::Exit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Start => "start",
            NodeType::Decision => "decision",
            NodeType::Action => "action",
            NodeType::Outcome => "outcome",
            NodeType::Exit => "exit",
        }
    }

    /// Single-letter tag used in compact displays.
    pub fn symbol(&self) -> char {
        match self {
            NodeType::Start => 'S',
            NodeType::Decision => 'D',
            NodeType::Action => 'A',
            NodeType::Outcome => 'O',
            NodeType::Exit => 'E',
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| DomainError::UnknownNodeType(s.to_string()))
    }
}

/// Opaque node identifier, unique across a tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, enough to address a node interactively.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Expected cost of a subtree, or the sentinel for "cannot be computed".
///
/// Serialized as a JSON number, or `null` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum ExpectedCost {
    Available(f64),
    Unavailable,
}

impl ExpectedCost {
    pub fn is_available(&self) -> bool {
        matches!(self, ExpectedCost::Available(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            ExpectedCost::Available(v) => Some(*v),
            ExpectedCost::Unavailable => None,
        }
    }
}

impl From<Option<f64>> for ExpectedCost {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => ExpectedCost::Available(v),
            _ => ExpectedCost::Unavailable,
        }
    }
}

impl From<ExpectedCost> for Option<f64> {
    fn from(value: ExpectedCost) -> Self {
        value.value()
    }
}

impl fmt::Display for ExpectedCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedCost::Available(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            ExpectedCost::Unavailable => f.write_str("n/a"),
        }
    }
}

/// Data payload for a decision tree node.
///
/// `cumulative_time`, `valid_prob` and `expected_cost` are derived and only
/// written by the propagation pass. Identity is by `id`.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: NodeId,
    pub name: String,
    pub node_type: NodeType,
    /// Likelihood this node occurs given its parent occurred
    pub probability: f64,
    pub cost: f64,
    pub time: f64,
    pub cumulative_time: f64,
    pub valid_prob: bool,
    pub expected_cost: ExpectedCost,
}

impl NodeData {
    /// The default root of every fresh tree.
    pub fn start() -> Self {
        Self::with_id(
            NodeId::generate(),
            NodeType::Start,
            NodeFields {
                name: "Start".to_string(),
                probability: 1.0,
                cost: 0.0,
                time: 0.0,
            },
        )
    }

    /// Create a node with a fresh id from already validated and forced fields.
    pub fn new(node_type: NodeType, fields: NodeFields) -> Self {
        Self::with_id(NodeId::generate(), node_type, fields)
    }

    pub fn with_id(id: NodeId, node_type: NodeType, fields: NodeFields) -> Self {
        Self {
            id,
            name: fields.name,
            node_type,
            probability: fields.probability,
            cost: fields.cost,
            time: fields.time,
            cumulative_time: 0.0,
            valid_prob: true,
            expected_cost: ExpectedCost::Available(fields.cost),
        }
    }

    /// Snapshot of the user-editable fields.
    pub fn fields(&self) -> NodeFields {
        NodeFields {
            name: self.name.clone(),
            probability: self.probability,
            cost: self.cost,
            time: self.time,
        }
    }

    /// Overwrite the user-editable fields; id and type stay untouched.
    pub fn apply_fields(&mut self, fields: NodeFields) {
        self.name = fields.name;
        self.probability = fields.probability;
        self.cost = fields.cost;
        self.time = fields.time;
    }
}

impl PartialEq for NodeData {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for NodeData {}

impl Hash for NodeData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.node_type.symbol(), self.name)
    }
}
