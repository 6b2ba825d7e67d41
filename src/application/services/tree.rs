//! Decision tree mutation service
//!
//! Owns the single in-memory tree. Every mutation is validated completely
//! before the arena is touched and always ends with a full propagation run,
//! so callers only ever observe consistent derived fields.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{samples, ApplicationResult, EditorSession, IoResultExt};
use crate::domain::{
    allowed_child_types, build_tree, can_add_child, propagate, DecisionTree, DomainError,
    NodeData, NodeDocument, NodeFields, NodeId, NodeType, PropagationReport, RawFields,
};
use crate::infrastructure::traits::FileSystem;

/// Result of an accepted mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// Node that was added, edited or deleted
    pub node_id: NodeId,
    /// Propagation run that followed the mutation
    pub report: PropagationReport,
}

/// Service for building and evaluating one decision tree.
pub struct TreeService {
    fs: Arc<dyn FileSystem>,
    tree: DecisionTree,
    report: PropagationReport,
}

impl TreeService {
    /// Create a service holding the default single-START tree.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        let mut tree = DecisionTree::new();
        let report = propagate(&mut tree);
        Self { fs, tree, report }
    }

    /// Read-only view of the current tree.
    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    /// Report of the most recent propagation run.
    pub fn report(&self) -> &PropagationReport {
        &self.report
    }

    /// Child types that may be added under `id`.
    pub fn allowed_children(&self, id: &NodeId) -> ApplicationResult<Vec<NodeType>> {
        let (_, node) = self.tree.require(id)?;
        Ok(allowed_child_types(node.data.node_type).to_vec())
    }

    /// Record `id` as the session's selection together with its addable child types.
    pub fn select_node(&self, session: &mut EditorSession, id: &NodeId) -> ApplicationResult<()> {
        let allowed = self.allowed_children(id)?;
        session.select(id.clone(), allowed);
        Ok(())
    }

    /// Append a new `node_type` child under `parent_id`.
    #[instrument(level = "debug", skip(self, raw), fields(parent = %parent_id))]
    pub fn add_node(
        &mut self,
        parent_id: &NodeId,
        node_type: NodeType,
        raw: &RawFields,
    ) -> ApplicationResult<MutationOutcome> {
        let (parent_idx, parent) = self.tree.require(parent_id)?;
        let parent_type = parent.data.node_type;
        if !can_add_child(parent_type, node_type) {
            return Err(DomainError::ChildTypeNotAllowed {
                parent: parent_type,
                child: node_type,
            }
            .into());
        }

        let base = NodeFields::defaults_for(node_type, !parent.children.is_empty());
        let fields = raw
            .resolve(node_type, &base)
            .map_err(DomainError::InvalidFields)?;

        let data = NodeData::new(node_type, fields);
        let node_id = data.id.clone();
        self.tree.insert_child(parent_idx, data)?;
        info!(id = %node_id, %node_type, "node added");

        Ok(self.finish(node_id))
    }

    /// Overwrite the mutable fields of `id`. Type and id never change.
    #[instrument(level = "debug", skip(self, raw), fields(id = %id))]
    pub fn edit_node(&mut self, id: &NodeId, raw: &RawFields) -> ApplicationResult<MutationOutcome> {
        let (idx, node) = self.tree.require(id)?;
        let node_type = node.data.node_type;
        let fields = raw
            .resolve(node_type, &node.data.fields())
            .map_err(DomainError::InvalidFields)?;

        if let Some(node) = self.tree.get_node_mut(idx) {
            node.data.apply_fields(fields);
        }
        info!(%id, %node_type, "node edited");

        Ok(self.finish(id.clone()))
    }

    /// Remove `id` and its entire subtree. The START node is never removed.
    #[instrument(level = "debug", skip(self), fields(id = %id))]
    pub fn delete_node(&mut self, id: &NodeId) -> ApplicationResult<MutationOutcome> {
        let (idx, node) = self.tree.require(id)?;
        if node.data.node_type == NodeType::Start {
            warn!("refusing to delete start node");
            return Err(DomainError::CannotDeleteStart.into());
        }

        let removed = self.tree.remove_subtree(idx)?;
        info!(%id, removed, "subtree deleted");

        Ok(self.finish(id.clone()))
    }

    /// Discard the tree and start over with a single START node.
    #[instrument(level = "debug", skip(self))]
    pub fn reset_tree(&mut self) -> &PropagationReport {
        self.replace(DecisionTree::new())
    }

    /// Replace the tree with the built-in sample `name`.
    #[instrument(level = "debug", skip(self))]
    pub fn load_builtin_sample(&mut self, name: &str) -> ApplicationResult<&PropagationReport> {
        let doc = samples::document(name)?;
        let tree = build_tree(&doc)?;
        info!(sample = name, nodes = tree.len(), "sample loaded");
        Ok(self.replace(tree))
    }

    /// Replace the tree with the document in `json`.
    ///
    /// On any parse or shape failure the current tree is left untouched.
    #[instrument(level = "debug", skip(self, json), fields(bytes = json.len()))]
    pub fn import_str(&mut self, json: &str) -> ApplicationResult<&PropagationReport> {
        let doc: NodeDocument = serde_json::from_str(json)?;
        let tree = build_tree(&doc)?;
        Ok(self.replace(tree))
    }

    /// Like [`import_str`](Self::import_str), reading from `path`.
    #[instrument(level = "debug", skip(self))]
    pub fn import_file(&mut self, path: &Path) -> ApplicationResult<&PropagationReport> {
        let content = self
            .fs
            .read_to_string(path)
            .tree_file_context("read tree", path)?;
        self.import_str(&content)
    }

    /// Current tree as pretty JSON, derived fields included.
    pub fn export_string(&self) -> ApplicationResult<String> {
        let doc = NodeDocument::from_tree(&self.tree);
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn export_file(&self, path: &Path) -> ApplicationResult<()> {
        let json = self.export_string()?;
        self.fs
            .write(path, &json)
            .with_path_context("write tree", path)?;
        debug!(nodes = self.tree.len(), "tree exported");
        Ok(())
    }

    fn replace(&mut self, tree: DecisionTree) -> &PropagationReport {
        self.tree = tree;
        self.report = propagate(&mut self.tree);
        &self.report
    }

    fn finish(&mut self, node_id: NodeId) -> MutationOutcome {
        self.report = propagate(&mut self.tree);
        if self.report.advisory() {
            warn!(
                groups = self.report.invalid_groups.len(),
                "probabilities must be fixed before expected cost is available"
            );
        }
        MutationOutcome {
            node_id,
            report: self.report.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ApplicationError;
    use crate::domain::ExpectedCost;
    use crate::infrastructure::traits::MemoryFileSystem;

    fn service() -> TreeService {
        TreeService::new(Arc::new(MemoryFileSystem::new()))
    }

    fn root_id(service: &TreeService) -> NodeId {
        service.tree().root_node().data.id.clone()
    }

    #[test]
    fn given_new_service_when_created_then_holds_single_start_node() {
        let service = service();
        assert_eq!(service.tree().len(), 1);
        assert_eq!(
            service.tree().root_node().data.expected_cost,
            ExpectedCost::Available(0.0)
        );
    }

    #[test]
    fn given_start_parent_when_adding_action_then_rejects_without_mutation() {
        let mut service = service();
        let root = root_id(&service);

        let err = service
            .add_node(&root, NodeType::Action, &RawFields::new())
            .unwrap_err();

        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::ChildTypeNotAllowed { .. })
        ));
        assert_eq!(service.tree().len(), 1);
    }

    #[test]
    fn given_unknown_parent_when_adding_then_node_not_found() {
        let mut service = service();
        let err = service
            .add_node(&NodeId::from("ghost"), NodeType::Decision, &RawFields::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Domain(DomainError::NodeNotFound(_))
        ));
    }

    #[test]
    fn given_session_when_selecting_then_records_allowed_types() {
        let service = service();
        let mut session = EditorSession::new();

        service.select_node(&mut session, &root_id(&service)).unwrap();

        assert_eq!(session.allowed_children(), &[NodeType::Decision]);
        assert!(session.can_add());
    }

    #[test]
    fn given_edit_when_succeeding_then_keeps_id_and_type() {
        let mut service = service();
        let root = root_id(&service);
        let d = service
            .add_node(&root, NodeType::Decision, &RawFields::new().name("D"))
            .unwrap()
            .node_id;

        service
            .edit_node(&d, &RawFields::new().name("Choose").probability(0.3).time(5.0))
            .unwrap();

        let node = &service.tree().node(&d).unwrap().data;
        assert_eq!(node.name, "Choose");
        assert_eq!(node.node_type, NodeType::Decision);
        assert_eq!(node.probability, 1.0, "decision probability stays forced");
        assert_eq!(node.cumulative_time, 5.0);
    }
}
