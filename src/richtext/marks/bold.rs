use crate::richtext::commands::{Command, CommandEntry, toggle_mark};
use crate::richtext::functionality::{Functionality, MarkEntry};
use crate::richtext::input_rules::{InputRule, mark_rule};
use crate::richtext::schema::{DomOutput, MarkSpec, ParseRule, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\*\*([^*]+)\*\*)$").expect("valid bold regex"));

/// Strong emphasis, `Mod-b` or `**text**`.
pub struct Bold;

impl Functionality for Bold {
    fn name(&self) -> &str {
        "bold"
    }

    fn mark(&self) -> Option<MarkEntry> {
        Some(MarkEntry {
            name: "bold",
            spec: MarkSpec {
                to_dom: Some(|_| DomOutput::wrap("strong")),
                parse_dom: vec![
                    ParseRule::tag("strong"),
                    ParseRule::tag("b"),
                    ParseRule::style("font-weight", "bold"),
                ],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        vec![("Mod-b", toggle_mark("bold", None))]
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![mark_rule(BOLD_RE.clone(), "bold", |_| None)]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![("toggleBold", CommandEntry::Plain(toggle_mark("bold", None)))]
    }
}
