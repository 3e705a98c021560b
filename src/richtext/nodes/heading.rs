use crate::richtext::commands::{CommandEntry, insert_block};
use crate::richtext::functionality::{Functionality, NodeEntry};
use crate::richtext::input_rules::{InputRule, textblock_type_rule};
use crate::richtext::model::{Attrs, attrs};
use crate::richtext::schema::{AttrSpec, DomOutput, NodeSpec, ParseRule, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use std::rc::Rc;

pub const MAX_LEVEL: u64 = 6;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s$").expect("valid heading regex"));

/// Headings of level 1 to 6. `# ` at the start of a paragraph makes a level 1
/// heading, `## ` a level 2 one, and so on.
pub struct Heading;

impl Functionality for Heading {
    fn name(&self) -> &str {
        "heading"
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: "heading",
            spec: NodeSpec {
                content: Some("inline*".to_string()),
                group: Some("block".to_string()),
                attrs: vec![AttrSpec::with_default("level", json!(1))],
                defining: true,
                to_dom: Some(|node| DomOutput::wrap(&format!("h{}", level_of(node.attrs())))),
                parse_dom: ["h1", "h2", "h3", "h4", "h5", "h6"]
                    .into_iter()
                    .zip(1..=MAX_LEVEL)
                    .map(|(tag, level)| ParseRule::tag(tag).with_attrs(attrs([("level", json!(level))])))
                    .collect(),
                ..Default::default()
            },
        })
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![textblock_type_rule(HEADING_RE.clone(), "heading", |m| {
            let hashes = m.group(1)?;
            Some(attrs([("level", json!(hashes.len()))]))
        })]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![(
            "insertHeader",
            CommandEntry::constructor(|args| {
                let level = level_of(args);
                insert_block("heading", Some(attrs([("level", json!(level))])))
            }),
        )]
    }
}

/// Heading level from attributes, clamped to 1..=6
fn level_of(attrs: &Attrs) -> u64 {
    attrs
        .get("level")
        .and_then(Value::as_u64)
        .unwrap_or(1)
        .clamp(1, MAX_LEVEL)
}
