use crate::richtext::commands::{Command, CommandEntry, toggle_mark};
use crate::richtext::functionality::{Functionality, MarkEntry};
use crate::richtext::schema::{DomOutput, MarkSpec, ParseRule, Schema};
use std::rc::Rc;

pub struct Superscript;

impl Functionality for Superscript {
    fn name(&self) -> &str {
        "superscript"
    }

    fn mark(&self) -> Option<MarkEntry> {
        Some(MarkEntry {
            name: "superscript",
            spec: MarkSpec {
                to_dom: Some(|_| DomOutput::wrap("sup")),
                parse_dom: vec![
                    ParseRule::tag("sup"),
                    ParseRule::style("vertical-align", "super"),
                ],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        vec![("Mod-Shift-=", toggle_mark("superscript", None))]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![(
            "toggleSuperscript",
            CommandEntry::Plain(toggle_mark("superscript", None)),
        )]
    }
}
