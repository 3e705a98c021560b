use crate::richtext::functionality::{Functionality, NodeEntry};
use crate::richtext::schema::NodeSpec;

/// The document root: one or more blocks.
pub struct Doc;

impl Functionality for Doc {
    fn name(&self) -> &str {
        "doc"
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: "doc",
            spec: NodeSpec {
                content: Some("block+".to_string()),
                ..Default::default()
            },
        })
    }
}
