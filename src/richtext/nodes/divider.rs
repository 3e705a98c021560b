use crate::richtext::commands::{CommandEntry, insert_block};
use crate::richtext::functionality::{Functionality, NodeEntry};
use crate::richtext::input_rules::InputRule;
use crate::richtext::model::Position;
use crate::richtext::schema::{DomOutput, NodeSpec, ParseRule, Schema, SchemaError};
use crate::richtext::state::split_path;
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static DIVIDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:---|___|\*\*\*)$").expect("valid divider regex"));

/// A horizontal rule, typed as `---`, `___` or `***` on its own line.
pub struct Divider;

impl Functionality for Divider {
    fn name(&self) -> &str {
        "divider"
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: "divider",
            spec: NodeSpec {
                group: Some("block".to_string()),
                to_dom: Some(|_| DomOutput::void("hr")),
                parse_dom: vec![ParseRule::tag("hr")],
                ..Default::default()
            },
        })
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![InputRule::new(DIVIDER_RE.clone(), |tr, m| {
            let schema = Rc::clone(tr.schema());
            let block = tr.textblock(&m.path)?;
            if block.text_len() != m.end || Some(block.type_name()) != schema.default_textblock() {
                return Ok(false);
            }
            let paragraph = schema
                .default_textblock()
                .ok_or(SchemaError::MissingRequiredNode("paragraph"))?;
            let replacement = vec![
                schema.node("divider", None, Vec::new())?,
                schema.node(paragraph, None, Vec::new())?,
            ];

            let (parent, index) = split_path(&m.path)?;
            tr.replace_child(parent, index, replacement)?;
            let mut cursor = parent.to_vec();
            cursor.push(index + 1);
            tr.set_cursor(Position::new(cursor, 0));
            Ok(true)
        })]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![("insertDivider", CommandEntry::Plain(insert_block("divider", None)))]
    }
}
