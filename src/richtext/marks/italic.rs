use crate::richtext::commands::{Command, CommandEntry, toggle_mark};
use crate::richtext::functionality::{Functionality, MarkEntry};
use crate::richtext::input_rules::{InputRule, mark_rule};
use crate::richtext::schema::{DomOutput, MarkSpec, ParseRule, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

// A leading `*` belongs to bold markup, so it must not start an italic match.
static ITALIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^*])(\*([^*]+)\*)$").expect("valid italic regex"));

pub struct Italic;

impl Functionality for Italic {
    fn name(&self) -> &str {
        "italic"
    }

    fn mark(&self) -> Option<MarkEntry> {
        Some(MarkEntry {
            name: "italic",
            spec: MarkSpec {
                to_dom: Some(|_| DomOutput::wrap("em")),
                parse_dom: vec![
                    ParseRule::tag("em"),
                    ParseRule::tag("i"),
                    ParseRule::style("font-style", "italic"),
                ],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        vec![("Mod-i", toggle_mark("italic", None))]
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![mark_rule(ITALIC_RE.clone(), "italic", |_| None)]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![("toggleItalic", CommandEntry::Plain(toggle_mark("italic", None)))]
    }
}
