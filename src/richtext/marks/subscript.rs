use crate::richtext::commands::{Command, CommandEntry, toggle_mark};
use crate::richtext::functionality::{Functionality, MarkEntry};
use crate::richtext::schema::{DomOutput, MarkSpec, ParseRule, Schema};
use std::rc::Rc;

pub struct Subscript;

impl Functionality for Subscript {
    fn name(&self) -> &str {
        "subscript"
    }

    fn mark(&self) -> Option<MarkEntry> {
        Some(MarkEntry {
            name: "subscript",
            spec: MarkSpec {
                to_dom: Some(|_| DomOutput::wrap("sub")),
                parse_dom: vec![
                    ParseRule::tag("sub"),
                    ParseRule::style("vertical-align", "sub"),
                ],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        vec![("Mod-=", toggle_mark("subscript", None))]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![("toggleSubscript", CommandEntry::Plain(toggle_mark("subscript", None)))]
    }
}
