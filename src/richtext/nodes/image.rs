use crate::richtext::commands::{CommandEntry, insert_block};
use crate::richtext::functionality::{Functionality, NodeEntry};
use crate::richtext::input_rules::InputRule;
use crate::richtext::model::{Attrs, Position, attrs};
use crate::richtext::schema::{
    AttrSpec, DomElement, DomOutput, NodeSpec, ParseRule, Schema, SchemaError,
};
use crate::richtext::state::split_path;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use std::rc::Rc;

static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]\[]*?)]\(([^\]\[]*?)\)$").expect("valid image regex"));

/// A block image. `![alt](src)` typed in a textblock becomes an image; text
/// around it stays in textblocks before and after.
pub struct Image;

impl Functionality for Image {
    fn name(&self) -> &str {
        "image"
    }

    fn node(&self) -> Option<NodeEntry> {
        Some(NodeEntry {
            name: "image",
            spec: NodeSpec {
                group: Some("block".to_string()),
                attrs: vec![
                    AttrSpec::with_default("src", json!("")),
                    AttrSpec::with_default("alt", json!("")),
                ],
                selectable: true,
                draggable: true,
                to_dom: Some(|node| {
                    DomOutput::void("img")
                        .with_attr("src", attr_str(node.attrs(), "src"))
                        .with_attr("alt", attr_str(node.attrs(), "alt"))
                }),
                parse_dom: vec![ParseRule::tag("img").with_get_attrs(image_attrs)],
                ..Default::default()
            },
        })
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![InputRule::new(IMAGE_RE.clone(), |tr, m| {
            let schema = Rc::clone(tr.schema());
            let image = schema.node(
                "image",
                Some(attrs([
                    ("src", json!(m.group(2).unwrap_or_default())),
                    ("alt", json!(m.group(1).unwrap_or_default())),
                ])),
                Vec::new(),
            )?;

            let mut before = tr.textblock(&m.path)?.clone();
            let after_content = before.split_inline(m.end);
            before.split_inline(m.start);
            let paragraph = schema
                .default_textblock()
                .ok_or(SchemaError::MissingRequiredNode("paragraph"))?;
            let after = schema.node(paragraph, None, after_content)?;

            let mut replacement = Vec::new();
            if before.text_len() > 0 {
                replacement.push(before);
            }
            let cursor_index = replacement.len() + 1;
            replacement.push(image);
            replacement.push(after);

            let (parent, index) = split_path(&m.path)?;
            tr.replace_child(parent, index, replacement)?;
            let mut cursor = parent.to_vec();
            cursor.push(index + cursor_index);
            tr.set_cursor(Position::new(cursor, 0));
            Ok(true)
        })]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![(
            "insertImage",
            CommandEntry::constructor(|args| {
                let src = attr_str(args, "src");
                let alt = attr_str(args, "alt");
                insert_block("image", Some(attrs([("src", json!(src)), ("alt", json!(alt))])))
            }),
        )]
    }
}

fn attr_str(attrs: &Attrs, key: &str) -> String {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn image_attrs(element: &DomElement) -> Option<Attrs> {
    let src = element.attrs.get("src")?;
    let alt = element.attrs.get("alt").cloned().unwrap_or_default();
    Some(attrs([("src", json!(src)), ("alt", json!(alt))]))
}
