//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod constraints;
pub mod document;
pub mod entities;
pub mod error;
pub mod fields;
pub mod propagation;

pub use arena::{DecisionTree, TreeNode, MAX_TREE_DEPTH};
pub use constraints::{allowed_child_types, can_add_child, can_delete, can_edit};
pub use document::{build_tree, NodeDocument, DEFAULT_EXPORT_FILE};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use fields::{FieldError, FieldErrors, NodeFields, RawFields, RawNumber};
pub use propagation::{propagate, PropagationReport, PROBABILITY_TOLERANCE};
