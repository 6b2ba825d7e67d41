//! Caller-held editor session state
//!
//! Selection, pending validation errors and the one-shot advisory live here,
//! outside the tree. A front end owns one session and feeds it the results
//! of service calls.

use crate::application::services::MutationOutcome;
use crate::application::ApplicationResult;
use crate::domain::{FieldErrors, NodeId, NodeType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSession {
    selected: Option<NodeId>,
    allowed_children: Vec<NodeType>,
    field_errors: FieldErrors,
    advisory: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `id`; clears pending field errors from a previous attempt.
    pub fn select(&mut self, id: NodeId, allowed_children: Vec<NodeType>) {
        self.selected = Some(id);
        self.allowed_children = allowed_children;
        self.field_errors = FieldErrors::default();
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.allowed_children.clear();
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.selected.as_ref()
    }

    pub fn allowed_children(&self) -> &[NodeType] {
        &self.allowed_children
    }

    /// Whether any "add child" action applies to the selection.
    pub fn can_add(&self) -> bool {
        !self.allowed_children.is_empty()
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    /// Consume the "probabilities must be fixed" advisory.
    pub fn take_advisory(&mut self) -> bool {
        std::mem::take(&mut self.advisory)
    }

    /// Fold the result of a mutation into the session.
    ///
    /// Success clears errors and the selection; a field validation failure
    /// keeps the selection so the user can correct the input.
    pub fn record(&mut self, result: &ApplicationResult<MutationOutcome>) {
        match result {
            Ok(outcome) => {
                self.field_errors = FieldErrors::default();
                self.advisory = outcome.report.advisory();
                self.deselect();
            }
            Err(e) => {
                if let Some(errors) = e.field_errors() {
                    self.field_errors = errors.clone();
                }
            }
        }
    }

    /// Drop all transient state, as after import or reset.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
