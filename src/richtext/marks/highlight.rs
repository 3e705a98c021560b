use crate::richtext::commands::{Command, CommandEntry, toggle_mark};
use crate::richtext::functionality::{Functionality, MarkEntry};
use crate::richtext::input_rules::{InputRule, mark_rule};
use crate::richtext::schema::{DomOutput, MarkSpec, ParseRule, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static HIGHLIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(==([^=]+)==)$").expect("valid highlight regex"));

/// Marker-pen highlight, `Mod-h` or `==text==`.
pub struct Highlight;

impl Functionality for Highlight {
    fn name(&self) -> &str {
        "highlight"
    }

    fn mark(&self) -> Option<MarkEntry> {
        Some(MarkEntry {
            name: "highlight",
            spec: MarkSpec {
                to_dom: Some(|_| DomOutput::wrap("mark")),
                parse_dom: vec![ParseRule::tag("mark")],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        vec![("Mod-h", toggle_mark("highlight", None))]
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![mark_rule(HIGHLIGHT_RE.clone(), "highlight", |_| None)]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![("toggleHighlight", CommandEntry::Plain(toggle_mark("highlight", None)))]
    }
}
