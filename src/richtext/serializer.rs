// Serializer
// Converts an editable tree back into stored Zettel content.

use super::commands::{LIST, LIST_ITEM};
use super::marks::{LINK, stored_mark};
use super::model::Node;
use crate::zettel::{Block, Inline, ListItem, ZettelContent, canonical_marks};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("node type `{0}` has no stored form")]
    UnknownNode(String),
    #[error("mark type `{0}` has no stored form")]
    UnknownMark(String),
    #[error("`{node}` node is missing its `{attr}` attribute")]
    MissingAttr { node: String, attr: &'static str },
    #[error("`{0}` node found outside its parent")]
    Misplaced(String),
}

/// Stored content for a document tree. The result is literal: a document
/// holding one empty paragraph serializes to that paragraph, not to `[]`.
pub fn serialize_doc(doc: &Node) -> Result<ZettelContent, SerializeError> {
    doc.children().iter().map(serialize_block).collect()
}

fn serialize_block(node: &Node) -> Result<Block, SerializeError> {
    match node.type_name() {
        "paragraph" => Ok(Block::Paragraph {
            inlines: serialize_inlines(node)?,
        }),
        "heading" => {
            let level = node
                .attr("level")
                .and_then(Value::as_u64)
                .and_then(|level| u8::try_from(level).ok())
                .ok_or_else(|| missing(node, "level"))?;
            Ok(Block::Heading {
                level,
                inlines: serialize_inlines(node)?,
            })
        }
        "divider" => Ok(Block::Divider),
        "image" => Ok(Block::Image {
            src: str_attr(node, "src")?,
            alt: str_attr(node, "alt").unwrap_or_default(),
        }),
        LIST => {
            let items = node
                .children()
                .iter()
                .map(serialize_list_item)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Block::List { items })
        }
        LIST_ITEM | "text" => Err(SerializeError::Misplaced(node.type_name().to_string())),
        other => Err(SerializeError::UnknownNode(other.to_string())),
    }
}

fn serialize_list_item(node: &Node) -> Result<ListItem, SerializeError> {
    if node.type_name() != LIST_ITEM {
        return Err(SerializeError::Misplaced(node.type_name().to_string()));
    }
    let blocks = node
        .children()
        .iter()
        .map(serialize_block)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ListItem::new(blocks))
}

fn serialize_inlines(block: &Node) -> Result<Vec<Inline>, SerializeError> {
    block.children().iter().map(serialize_inline).collect()
}

fn serialize_inline(node: &Node) -> Result<Inline, SerializeError> {
    let Some(text) = node.text() else {
        return Err(SerializeError::Misplaced(node.type_name().to_string()));
    };
    let mut href = None;
    let mut marks = Vec::new();
    for mark in node.marks() {
        if mark.name() == LINK {
            let value = mark
                .attr("href")
                .and_then(Value::as_str)
                .ok_or(SerializeError::MissingAttr {
                    node: LINK.to_string(),
                    attr: "href",
                })?;
            href = Some(value.to_string());
        } else {
            let stored = stored_mark(mark.name())
                .ok_or_else(|| SerializeError::UnknownMark(mark.name().to_string()))?;
            marks.push(stored);
        }
    }
    canonical_marks(&mut marks);

    Ok(match href {
        Some(href) => Inline::Link {
            text: text.to_string(),
            href,
            marks,
        },
        None => Inline::Text {
            text: text.to_string(),
            marks,
        },
    })
}

fn str_attr(node: &Node, attr: &'static str) -> Result<String, SerializeError> {
    node.attr(attr)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing(node, attr))
}

fn missing(node: &Node, attr: &'static str) -> SerializeError {
    SerializeError::MissingAttr {
        node: node.type_name().to_string(),
        attr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::model::attrs;
    use crate::richtext::parser::parse_zettel;
    use crate::richtext::testing::schema;
    use crate::zettel::Mark as StoredMark;
    use serde_json::json;

    #[test]
    fn test_link_mark_becomes_link_inline() {
        let schema = schema();
        let link = schema.mark(LINK, Some(attrs([("href", json!("/zettel/9"))]))).unwrap();
        let bold = schema.mark("bold", None).unwrap();
        let italic = schema.mark("italic", None).unwrap();
        let text = schema.text("here", vec![italic, link, bold]);
        let paragraph = schema.node("paragraph", None, vec![text]).unwrap();
        let doc = schema.node("doc", None, vec![paragraph]).unwrap();

        assert_eq!(
            serialize_doc(&doc).unwrap(),
            vec![Block::paragraph(vec![Inline::link(
                "here",
                "/zettel/9",
                vec![StoredMark::Bold, StoredMark::Italic],
            )])]
        );
    }

    #[test]
    fn test_blank_document_is_literal() {
        let doc = schema().empty_doc().unwrap();
        assert_eq!(serialize_doc(&doc).unwrap(), vec![Block::paragraph(vec![])]);
    }

    #[test]
    fn test_round_trip_keeps_structure() {
        let content = vec![
            Block::heading(3, vec![Inline::marked("Todo", vec![StoredMark::Superscript])]),
            Block::List {
                items: vec![
                    ListItem::new(vec![
                        Block::paragraph(vec![Inline::plain("one")]),
                        Block::List {
                            items: vec![ListItem::new(vec![Block::paragraph(vec![
                                Inline::link("nested", "https://example.com", vec![]),
                            ])])],
                        },
                    ]),
                    ListItem::new(vec![Block::paragraph(vec![])]),
                ],
            },
            Block::Image {
                src: "cat.jpg".to_string(),
                alt: String::new(),
            },
            Block::Divider,
        ];
        let doc = parse_zettel(&schema(), &content).unwrap().unwrap();
        assert_eq!(serialize_doc(&doc).unwrap(), content);
    }

    #[test]
    fn test_unknown_mark_is_an_error() {
        use crate::richtext::functionality::{Functionalities, Functionality, MarkEntry};
        use crate::richtext::nodes::{Doc, Paragraph, Text};
        use crate::richtext::schema::MarkSpec;

        struct Underline;
        impl Functionality for Underline {
            fn name(&self) -> &str {
                "underline"
            }
            fn mark(&self) -> Option<MarkEntry> {
                Some(MarkEntry {
                    name: "underline",
                    spec: MarkSpec::default(),
                })
            }
        }

        let schema = Functionalities::new(vec![
            Box::new(Doc),
            Box::new(Text),
            Box::new(Paragraph),
            Box::new(Underline),
        ])
        .schema()
        .unwrap();
        let text = schema.text("u", vec![schema.mark("underline", None).unwrap()]);
        let doc = schema
            .node("doc", None, vec![schema.node("paragraph", None, vec![text]).unwrap()])
            .unwrap();
        assert_eq!(
            serialize_doc(&doc),
            Err(SerializeError::UnknownMark("underline".to_string()))
        );
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        use crate::richtext::functionality::{Functionalities, Functionality, NodeEntry};
        use crate::richtext::nodes::{Doc, Paragraph, Text};
        use crate::richtext::schema::NodeSpec;

        struct Table;
        impl Functionality for Table {
            fn name(&self) -> &str {
                "table"
            }
            fn node(&self) -> Option<NodeEntry> {
                Some(NodeEntry {
                    name: "table",
                    spec: NodeSpec {
                        group: Some("block".to_string()),
                        ..Default::default()
                    },
                })
            }
        }

        let schema = Functionalities::new(vec![
            Box::new(Doc),
            Box::new(Text),
            Box::new(Paragraph),
            Box::new(Table),
        ])
        .schema()
        .unwrap();
        let doc = schema
            .node("doc", None, vec![schema.node("table", None, vec![]).unwrap()])
            .unwrap();
        assert_eq!(
            serialize_doc(&doc),
            Err(SerializeError::UnknownNode("table".to_string()))
        );
    }
}
