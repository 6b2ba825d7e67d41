//! Built-in example trees.

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::NodeDocument;

/// A named built-in document.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub name: &'static str,
    pub description: &'static str,
    source: &'static str,
}

const SAMPLES: &[Sample] = &[
    Sample {
        name: "demo",
        description: "Product launch: launch now or delay, with a recovery decision",
        source: include_str!("../../samples/demo_tree.json"),
    },
    Sample {
        name: "demo-2",
        description: "Machine failure: repair in house or call the vendor",
        source: include_str!("../../samples/demo_tree_2.json"),
    },
];

pub fn all() -> &'static [Sample] {
    SAMPLES
}

pub fn names() -> Vec<&'static str> {
    SAMPLES.iter().map(|s| s.name).collect()
}

/// Parse the sample called `name`.
pub fn document(name: &str) -> ApplicationResult<NodeDocument> {
    let sample = SAMPLES
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| ApplicationError::UnknownSample {
            name: name.to_string(),
            available: names().join(", "),
        })?;
    Ok(serde_json::from_str(sample.source)?)
}
