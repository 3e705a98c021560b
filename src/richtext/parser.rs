// Parser
// Converts stored Zettel content into an editable tree for a schema.

use super::commands::{LIST, LIST_ITEM};
use super::marks::{LINK, mark_type_name};
use super::model::{Attrs, Mark, Node, attrs};
use super::schema::{Schema, SchemaError};
use crate::zettel::{Block, Inline, ListItem};
use log::trace;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("heading level {0} is outside 1..=6")]
    InvalidHeadingLevel(u8),
    #[error("stored content is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Build the editable tree for `content`. Empty content has no tree: the
/// caller starts from the schema's empty document instead. Block nesting is
/// kept exactly as stored, even where an edit could not produce it.
pub fn parse_zettel(schema: &Schema, content: &[Block]) -> Result<Option<Node>, ParseError> {
    if content.is_empty() {
        return Ok(None);
    }
    let blocks = parse_blocks(schema, content)?;
    trace!("parsed {} top-level blocks", blocks.len());
    Ok(Some(schema.node_unchecked("doc", None, blocks)?))
}

/// Same as [`parse_zettel`] for content still in its JSON form
pub fn parse_zettel_json(schema: &Schema, json: &str) -> Result<Option<Node>, ParseError> {
    let content: Vec<Block> = serde_json::from_str(json)?;
    parse_zettel(schema, &content)
}

fn parse_blocks(schema: &Schema, blocks: &[Block]) -> Result<Vec<Node>, ParseError> {
    blocks.iter().map(|block| parse_block(schema, block)).collect()
}

fn parse_block(schema: &Schema, block: &Block) -> Result<Node, ParseError> {
    let node = match block {
        Block::Paragraph { inlines } => textblock(schema, "paragraph", None, inlines)?,
        Block::Heading { level, inlines } => {
            if !(1..=6).contains(level) {
                return Err(ParseError::InvalidHeadingLevel(*level));
            }
            textblock(schema, "heading", Some(attrs([("level", json!(level))])), inlines)?
        }
        Block::Divider => schema.node_unchecked("divider", None, Vec::new())?,
        Block::List { items } => {
            let items = items
                .iter()
                .map(|item| parse_list_item(schema, item))
                .collect::<Result<Vec<_>, _>>()?;
            schema.node_unchecked(LIST, None, items)?
        }
        Block::Image { src, alt } => schema.node_unchecked(
            "image",
            Some(attrs([("src", json!(src)), ("alt", json!(alt))])),
            Vec::new(),
        )?,
    };
    Ok(node)
}

fn parse_list_item(schema: &Schema, item: &ListItem) -> Result<Node, ParseError> {
    let blocks = parse_blocks(schema, &item.blocks)?;
    Ok(schema.node_unchecked(LIST_ITEM, None, blocks)?)
}

fn textblock(
    schema: &Schema,
    name: &str,
    node_attrs: Option<Attrs>,
    inlines: &[Inline],
) -> Result<Node, ParseError> {
    let content = inlines
        .iter()
        .map(|inline| parse_inline(schema, inline))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(schema.node_unchecked(name, node_attrs, content)?)
}

fn parse_inline(schema: &Schema, inline: &Inline) -> Result<Node, SchemaError> {
    let mut marks: Vec<Mark> = Vec::with_capacity(inline.marks().len() + 1);
    if let Inline::Link { href, .. } = inline {
        marks.push(schema.mark(LINK, Some(attrs([("href", json!(href))])))?);
    }
    for mark in inline.marks() {
        marks.push(schema.mark(mark_type_name(*mark), None)?);
    }
    Ok(schema.text(inline.text(), marks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::testing::{outline, schema};
    use crate::zettel::Mark as StoredMark;
    use insta::assert_snapshot;

    #[test]
    fn test_empty_content_has_no_tree() {
        assert!(parse_zettel(&schema(), &[]).unwrap().is_none());
        assert!(parse_zettel_json(&schema(), "[]").unwrap().is_none());
    }

    #[test]
    fn test_parse_blocks() {
        let content = vec![
            Block::heading(2, vec![Inline::plain("Plan")]),
            Block::paragraph(vec![
                Inline::plain("see "),
                Inline::link("notes", "/zettel/4", vec![StoredMark::Italic, StoredMark::Bold]),
            ]),
            Block::Divider,
            Block::List {
                items: vec![ListItem::new(vec![
                    Block::paragraph(vec![Inline::marked("first", vec![StoredMark::Highlight])]),
                    Block::Image {
                        src: "a.png".to_string(),
                        alt: "chart".to_string(),
                    },
                ])],
            },
        ];
        let doc = parse_zettel(&schema(), &content).unwrap().unwrap();
        assert_snapshot!(outline(&doc), @r#"
        doc
          heading level=2
            "Plan"
          paragraph
            "see "
            "notes" [bold, italic, link(href="/zettel/4")]
          divider
          list
            list_item
              paragraph
                "first" [highlight]
              image alt="chart" src="a.png"
        "#);
    }

    #[test]
    fn test_runs_are_kept_as_stored() {
        let content = vec![Block::paragraph(vec![
            Inline::plain("ab"),
            Inline::plain(""),
            Inline::plain("cd"),
        ])];
        let doc = parse_zettel(&schema(), &content).unwrap().unwrap();
        assert_eq!(doc.child(0).unwrap().child_count(), 3);
        assert_eq!(doc.text_content(), "abcd");
    }

    #[test]
    fn test_invalid_content_is_rejected() {
        let heading = vec![Block::heading(7, vec![])];
        assert!(matches!(
            parse_zettel(&schema(), &heading),
            Err(ParseError::InvalidHeadingLevel(7))
        ));

        assert!(matches!(
            parse_zettel_json(&schema(), r#"[{"type":"Table"}]"#),
            Err(ParseError::Json(_))
        ));
    }

    #[test]
    fn test_list_shapes_are_kept_as_stored() {
        let content = vec![
            Block::List { items: vec![] },
            Block::List {
                items: vec![
                    ListItem::new(vec![]),
                    ListItem::new(vec![Block::List {
                        items: vec![ListItem::new(vec![Block::Divider])],
                    }]),
                ],
            },
        ];
        let doc = parse_zettel(&schema(), &content).unwrap().unwrap();
        assert_snapshot!(outline(&doc), @r"
        doc
          list
          list
            list_item
            list_item
              list
                list_item
                  divider
        ");
    }
}
