use crate::richtext::functionality::{Functionality, NodeEntry};
use crate::richtext::schema::NodeSpec;

pub struct Text;

impl Functionality for Text {
    fn name(&self) -> &str {
        "text"
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: "text",
            spec: NodeSpec {
                group: Some("inline".to_string()),
                inline: true,
                ..Default::default()
            },
        })
    }
}
