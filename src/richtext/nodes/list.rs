use crate::richtext::commands::{
    Command, CommandEntry, LIST, LIST_ITEM, extend_list_item, lift_list_item, sink_list_item,
    split_list_item, toggle_list, wrap_textblock_in_list,
};
use crate::richtext::functionality::{Functionality, NodeEntry};
use crate::richtext::input_rules::{InputRule, wrapping_rule};
use crate::richtext::schema::{DomOutput, NodeSpec, ParseRule, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static BULLET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-*])\s$").expect("valid bullet list regex"));

/// A bullet list. `- ` or `* ` at the start of a textblock wraps it in one.
pub struct List;

impl Functionality for List {
    fn name(&self) -> &str {
        LIST
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: LIST,
            spec: NodeSpec {
                content: Some("list_item+".to_string()),
                group: Some("block".to_string()),
                to_dom: Some(|_| DomOutput::wrap("ul")),
                parse_dom: vec![ParseRule::tag("ul")],
                ..Default::default()
            },
        })
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![wrapping_rule(BULLET_RE.clone(), wrap_textblock_in_list)]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![
            ("toggleList", CommandEntry::Plain(toggle_list())),
            ("indentListItem", CommandEntry::Plain(sink_list_item())),
            ("outdentListItem", CommandEntry::Plain(lift_list_item())),
        ]
    }
}

/// One entry of a list: a paragraph, optionally followed by more blocks
/// (further paragraphs or a nested list).
pub struct ListItem;

impl Functionality for ListItem {
    fn name(&self) -> &str {
        LIST_ITEM
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: LIST_ITEM,
            spec: NodeSpec {
                content: Some("paragraph block*".to_string()),
                defining: true,
                to_dom: Some(|_| DomOutput::wrap("li")),
                parse_dom: vec![ParseRule::tag("li")],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        vec![
            ("Enter", split_list_item()),
            ("Shift-Enter", extend_list_item()),
            ("Tab", sink_list_item()),
            ("Shift-Tab", lift_list_item()),
        ]
    }
}
