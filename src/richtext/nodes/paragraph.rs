use crate::richtext::functionality::{Functionality, NodeEntry};
use crate::richtext::schema::{DomOutput, NodeSpec, ParseRule};

pub struct Paragraph;

impl Functionality for Paragraph {
    fn name(&self) -> &str {
        "paragraph"
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: "paragraph",
            spec: NodeSpec {
                content: Some("inline*".to_string()),
                group: Some("block".to_string()),
                to_dom: Some(|_| DomOutput::wrap("p")),
                parse_dom: vec![ParseRule::tag("p")],
                ..Default::default()
            },
        })
    }
}
