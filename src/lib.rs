//! dtree: probabilistic decision trees
//!
//! Build a tree of decisions, actions, outcomes and exits, then evaluate
//! expected cost and cumulative time for every node.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
