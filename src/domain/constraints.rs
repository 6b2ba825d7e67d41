//! Node-type adjacency rules
//!
//! | parent   | allowed children          |
//! |----------|---------------------------|
//! | start    | decision                  |
//! | decision | action, exit              |
//! | action   | outcome, decision         |
//! | outcome  | action, decision, exit    |
//! | exit     | -                         |

use crate::domain::entities::{NodeData, NodeType};

/// Child types a node of `parent` may accept.
pub fn allowed_child_types(parent: NodeType) -> &'static [NodeType] {
    match parent {
        NodeType::Start => &[NodeType::Decision],
        NodeType::Decision => &[NodeType::Action, NodeType::Exit],
        NodeType::Action => &[NodeType::Outcome, NodeType::Decision],
        NodeType::Outcome => &[NodeType::Action, NodeType::Decision, NodeType::Exit],
        NodeType::Exit => &[],
    }
}

pub fn can_add_child(parent: NodeType, child: NodeType) -> bool {
    allowed_child_types(parent).contains(&child)
}

pub fn can_delete(node: &NodeData) -> bool {
    node.node_type != NodeType::Start
}

/// Whether name, cost, probability and time are user editable.
pub fn can_edit(node: &NodeData) -> bool {
    !matches!(node.node_type, NodeType::Start | NodeType::Exit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fields::NodeFields;
    use rstest::rstest;

    #[rstest]
    #[case(NodeType::Start, NodeType::Decision, true)]
    #[case(NodeType::Start, NodeType::Action, false)]
    #[case(NodeType::Decision, NodeType::Action, true)]
    #[case(NodeType::Decision, NodeType::Exit, true)]
    #[case(NodeType::Decision, NodeType::Outcome, false)]
    #[case(NodeType::Action, NodeType::Outcome, true)]
    #[case(NodeType::Action, NodeType::Decision, true)]
    #[case(NodeType::Action, NodeType::Exit, false)]
    #[case(NodeType::Outcome, NodeType::Action, true)]
    #[case(NodeType::Outcome, NodeType::Exit, true)]
    #[case(NodeType::Outcome, NodeType::Outcome, false)]
    #[case(NodeType::Exit, NodeType::Decision, false)]
    fn given_parent_and_child_types_when_checking_then_follows_adjacency_table(
        #[case] parent: NodeType,
        #[case] child: NodeType,
        #[case] allowed: bool,
    ) {
        assert_eq!(can_add_child(parent, child), allowed);
    }

    #[test]
    fn given_any_type_when_listing_children_then_start_is_never_allowed() {
        for parent in NodeType::ALL {
            assert!(!allowed_child_types(parent).contains(&NodeType::Start));
        }
    }

    #[rstest]
    #[case(NodeType::Start, false, false)]
    #[case(NodeType::Decision, true, true)]
    #[case(NodeType::Action, true, true)]
    #[case(NodeType::Outcome, true, true)]
    #[case(NodeType::Exit, true, false)]
    fn given_node_type_when_checking_permissions_then_start_and_exit_are_restricted(
        #[case] node_type: NodeType,
        #[case] deletable: bool,
        #[case] editable: bool,
    ) {
        let node = NodeData::new(node_type, NodeFields::defaults_for(node_type, false));
        assert_eq!(can_delete(&node), deletable);
        assert_eq!(can_edit(&node), editable);
    }
}
