use crate::richtext::commands::{Command, CommandEntry, toggle_mark};
use crate::richtext::functionality::{Functionality, MarkEntry};
use crate::richtext::input_rules::{InputRule, mark_rule};
use crate::richtext::schema::{DomOutput, MarkSpec, ParseRule, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use std::rc::Rc;

static STRIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(~([^~]+)~)$").expect("valid strikethrough regex"));

pub struct Strikethrough;

impl Functionality for Strikethrough {
    fn name(&self) -> &str {
        "strikethrough"
    }

    fn mark(&self) -> Option<MarkEntry> {
        Some(MarkEntry {
            name: "strikethrough",
            spec: MarkSpec {
                to_dom: Some(|_| DomOutput::wrap("s")),
                parse_dom: vec![
                    ParseRule::tag("s"),
                    ParseRule::tag("del"),
                    ParseRule::tag("strike"),
                    ParseRule::style("text-decoration", "line-through"),
                ],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        vec![("Mod-d", toggle_mark("strikethrough", None))]
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![mark_rule(STRIKE_RE.clone(), "strikethrough", |_| None)]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![(
            "toggleStrikethrough",
            CommandEntry::Plain(toggle_mark("strikethrough", None)),
        )]
    }
}
