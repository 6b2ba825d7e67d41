//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{NodeId, NodeType};
use crate::domain::fields::FieldErrors;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("ambiguous node id prefix {prefix:?}: matches {matches} nodes")]
    AmbiguousId { prefix: String, matches: usize },

    #[error("a {parent} node cannot have a {child} child")]
    ChildTypeNotAllowed { parent: NodeType, child: NodeType },

    #[error("tree cannot grow past {max} levels")]
    TooDeep { max: usize },

    #[error("cannot delete start node")]
    CannotDeleteStart,

    #[error("{node_type} node is not editable: {id}")]
    NotEditable { id: NodeId, node_type: NodeType },

    #[error("unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("invalid fields: {0}")]
    InvalidFields(#[from] FieldErrors),

    #[error("invalid tree document at {location}: {reason}")]
    InvalidDocument { location: String, reason: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
