use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{NodeData, NodeId, NodeType};
use crate::domain::error::{DomainError, DomainResult};

/// Deepest tree accepted, counted in levels with START as level 1.
///
/// Each level nests an object and a `children` array in the exchange
/// document, and `serde_json` refuses input nested past 128.
pub const MAX_TREE_DEPTH: usize = 60;

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Decision tree payload for this node
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in insertion order
    pub children: Vec<Index>,
}

/// Arena-based decision tree rooted at a single START node.
///
/// Uses generational arena for memory-safe node references and O(1) lookups,
/// plus an id index so that every operation addressed by `NodeId` avoids a walk.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    /// Arena storage for all tree nodes
    arena: Arena<TreeNode>,
    /// Index of the START node
    root: Index,
    /// Side index from node id to arena slot
    index: HashMap<NodeId, Index>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    /// A tree consisting of one default START node.
    pub fn new() -> Self {
        Self::with_root(NodeData::start())
    }

    /// A tree whose root is `data`. Callers guarantee it is a START node.
    pub(crate) fn with_root(data: NodeData) -> Self {
        let mut arena = Arena::new();
        let mut index = HashMap::new();
        let id = data.id.clone();
        let root = arena.insert(TreeNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        index.insert(id, root);
        Self { arena, root, index }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_node(&self) -> &TreeNode {
        // The root slot is never removed.
        &self.arena[self.root]
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    /// Arena slot of the node with `id`.
    pub fn find(&self, id: &NodeId) -> Option<Index> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &NodeId) -> Option<&TreeNode> {
        self.find(id).and_then(|idx| self.arena.get(idx))
    }

    /// Like [`node`](Self::node), failing with `NodeNotFound`.
    pub fn require(&self, id: &NodeId) -> DomainResult<(Index, &TreeNode)> {
        self.find(id)
            .and_then(|idx| self.arena.get(idx).map(|n| (idx, n)))
            .ok_or_else(|| DomainError::NodeNotFound(id.to_string()))
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&TreeNode> {
        self.node(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.arena.get(p))
    }

    pub fn children(&self, idx: Index) -> impl Iterator<Item = &TreeNode> {
        self.arena
            .get(idx)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(move |&c| self.arena.get(c))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Resolve a full id or a unique id prefix.
    pub fn resolve_id(&self, prefix: &str) -> DomainResult<NodeId> {
        let key = NodeId::from(prefix);
        if self.contains(&key) {
            return Ok(key);
        }
        let matches: Vec<&NodeId> = self
            .index
            .keys()
            .filter(|id| id.as_str().starts_with(prefix))
            .collect();
        match matches.as_slice() {
            [] => Err(DomainError::NodeNotFound(prefix.to_string())),
            [only] => Ok((*only).clone()),
            many => Err(DomainError::AmbiguousId {
                prefix: prefix.to_string(),
                matches: many.len(),
            }),
        }
    }

    /// Append `data` as last child of `parent`.
    ///
    /// Adjacency is enforced by the mutation service, not here; the arena
    /// only refuses unknown parents, duplicate ids and growth past
    /// [`MAX_TREE_DEPTH`].
    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub(crate) fn insert_child(&mut self, parent: Index, data: NodeData) -> DomainResult<Index> {
        if !self.arena.contains(parent) {
            return Err(DomainError::NodeNotFound(format!("{:?}", parent)));
        }
        if self.index.contains_key(&data.id) {
            return Err(DomainError::InvalidDocument {
                location: data.id.to_string(),
                reason: "duplicate node id".to_string(),
            });
        }
        if self.level(parent) >= MAX_TREE_DEPTH {
            return Err(DomainError::TooDeep {
                max: MAX_TREE_DEPTH,
            });
        }
        let id = data.id.clone();
        let node_idx = self.arena.insert(TreeNode {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.push(node_idx);
        }
        self.index.insert(id, node_idx);
        Ok(node_idx)
    }

    /// Detach `idx` from its parent and drop its whole subtree.
    ///
    /// Returns the number of nodes removed. The root cannot be removed.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn remove_subtree(&mut self, idx: Index) -> DomainResult<usize> {
        let parent = match self.arena.get(idx) {
            None => return Err(DomainError::NodeNotFound(format!("{:?}", idx))),
            Some(node) if node.data.node_type == NodeType::Start => {
                return Err(DomainError::CannotDeleteStart)
            }
            Some(node) => node.parent,
        };
        if let Some(p) = parent.and_then(|p| self.arena.get_mut(p)) {
            p.children.retain(|&c| c != idx);
        }

        let mut removed = 0;
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                self.index.remove(&node.data.id);
                stack.extend(node.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Always false: a tree holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Level of `idx`, the root being level 1. Unknown indices are level 0.
    pub fn level(&self, idx: Index) -> usize {
        std::iter::successors(self.arena.get(idx), |n| {
            n.parent.and_then(|p| self.arena.get(p))
        })
        .count()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Ids of all nodes without children, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.id.clone())
            .collect()
    }
}

/// Pre-order traversal: parents before children, siblings left to right.
pub struct TreeIterator<'a> {
    tree: &'a DecisionTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current_idx, node));
            }
        }
        None
    }
}

/// Post-order traversal: every child before its parent.
pub struct PostOrderIterator<'a> {
    tree: &'a DecisionTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a DecisionTree) -> Self {
        Self {
            tree,
            stack: vec![(tree.root, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
