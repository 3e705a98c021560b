// Editor state
// Immutable snapshots of the document plus selection. All changes go through a
// Transaction, which is applied to produce the next snapshot.

use super::model::{Attrs, Mark, Node, Position, Selection};
use super::schema::{Schema, SchemaError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Range;
use std::rc::Rc;
use thiserror::Error;

/// Result of a transaction step
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors raised while building a transaction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("no textblock at {0:?}")]
    NotATextblock(Vec<usize>),
    #[error("offset {offset} is not a valid position in the textblock at {path:?}")]
    InvalidOffset { path: Vec<usize>, offset: usize },
    #[error("no node at {0:?}")]
    NoNode(Vec<usize>),
    #[error("content not allowed in `{0}`")]
    InvalidContent(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// One snapshot of the editor
#[derive(Debug, Clone)]
pub struct EditorState {
    schema: Rc<Schema>,
    doc: Node,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
}

impl EditorState {
    /// Create a state with the cursor at the start of the document
    pub fn create(schema: Rc<Schema>, doc: Node) -> Self {
        let selection = Selection::at_start(&doc);
        EditorState {
            schema,
            doc,
            selection,
            stored_marks: None,
        }
    }

    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Marks the next typed text will carry, when set explicitly
    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    /// Start a transaction on this state
    pub fn tr(&self) -> Transaction {
        Transaction {
            schema: Rc::clone(&self.schema),
            doc: self.doc.clone(),
            selection: self.selection.clone(),
            stored_marks: self.stored_marks.clone(),
            doc_changed: false,
            meta: BTreeMap::new(),
        }
    }

    /// Produce the state that results from `tr`. The selection is clamped to
    /// the nearest valid position.
    pub fn apply(&self, tr: Transaction) -> EditorState {
        let selection = Selection::new(
            clamp_position(&tr.doc, &tr.selection.anchor),
            clamp_position(&tr.doc, &tr.selection.head),
        );
        EditorState {
            schema: tr.schema,
            doc: tr.doc,
            selection,
            stored_marks: tr.stored_marks,
        }
    }

    /// The textblock holding the selection head
    pub fn head_block(&self) -> Option<&Node> {
        self.doc
            .node_at(&self.selection.head.path)
            .filter(|node| node.is_textblock())
    }

    /// Marks text typed at the cursor would receive
    pub fn cursor_marks(&self) -> Vec<Mark> {
        match &self.stored_marks {
            Some(marks) => marks.clone(),
            None => marks_at(&self.schema, &self.doc, self.selection.from()),
        }
    }
}

/// A pending change to an `EditorState`. Steps validate against the schema
/// and fail without modifying the document.
#[derive(Debug, Clone)]
pub struct Transaction {
    schema: Rc<Schema>,
    doc: Node,
    selection: Selection,
    stored_marks: Option<Vec<Mark>>,
    doc_changed: bool,
    meta: BTreeMap<String, Value>,
}

impl Transaction {
    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn stored_marks(&self) -> Option<&[Mark]> {
        self.stored_marks.as_deref()
    }

    /// Whether any step changed the document
    pub fn doc_changed(&self) -> bool {
        self.doc_changed
    }

    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }

    pub fn set_meta(&mut self, key: &str, value: Value) -> &mut Self {
        self.meta.insert(key.to_string(), value);
        self
    }

    /// Replace the selection. Clears stored marks.
    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = selection;
        self.stored_marks = None;
        self
    }

    pub fn set_cursor(&mut self, pos: Position) -> &mut Self {
        self.set_selection(Selection::cursor(pos))
    }

    pub fn set_stored_marks(&mut self, marks: Option<Vec<Mark>>) -> &mut Self {
        self.stored_marks = marks;
        self
    }

    /// Marks a position would give newly inserted text
    pub fn marks_at(&self, pos: &Position) -> Vec<Mark> {
        marks_at(&self.schema, &self.doc, pos)
    }

    /// Whether any text in [from..to) carries a mark of type `name`
    pub fn range_has_mark(&self, from: &Position, to: &Position, name: &str) -> bool {
        range_has_mark(&self.doc, from, to, name)
    }

    /// Get the textblock at `path`
    pub fn textblock(&self, path: &[usize]) -> TransformResult<&Node> {
        self.doc
            .node_at(path)
            .filter(|node| node.is_textblock())
            .ok_or_else(|| TransformError::NotATextblock(path.to_vec()))
    }

    /// Replace the selection with `text`, using stored marks if set and the
    /// marks at the cursor otherwise. The cursor ends up after the text.
    pub fn insert_text(&mut self, text: &str) -> TransformResult<&mut Self> {
        let marks = match self.stored_marks.take() {
            Some(marks) => marks,
            None => self.marks_at(self.selection.from()),
        };
        if !self.selection.is_empty() {
            self.delete_selection()?;
        }
        let pos = self.selection.head.clone();
        self.insert_text_at(&pos, text, marks)?;
        self.set_cursor(pos.with_offset(pos.offset + text.len()));
        Ok(self)
    }

    /// Insert `text` carrying `marks` at `pos`
    pub fn insert_text_at(
        &mut self,
        pos: &Position,
        text: &str,
        marks: Vec<Mark>,
    ) -> TransformResult<&mut Self> {
        self.check_position(pos)?;
        if text.is_empty() {
            return Ok(self);
        }
        let node = self.schema.text(text, marks);
        let block = self.textblock_mut(&pos.path)?;
        block.insert_inline(pos.offset, vec![node]);
        self.doc_changed = true;

        let len = text.len();
        self.map_selection(|p| {
            if p.path == pos.path && p.offset >= pos.offset {
                p.offset += len;
            }
        });
        Ok(self)
    }

    /// Delete the content between two positions. Within one textblock, or
    /// between sibling textblocks, the blocks are joined; otherwise only text
    /// is removed.
    pub fn delete(&mut self, a: &Position, b: &Position) -> TransformResult<&mut Self> {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        self.check_position(from)?;
        self.check_position(to)?;

        if from.path == to.path {
            if from.offset == to.offset {
                return Ok(self);
            }
            let block = self.textblock_mut(&from.path)?;
            block.delete_inline(from.offset, to.offset);
            self.doc_changed = true;
            let removed = to.offset - from.offset;
            self.map_selection(|p| {
                if p.path != from.path {
                    return;
                }
                if p.offset >= to.offset {
                    p.offset -= removed;
                } else if p.offset > from.offset {
                    p.offset = from.offset;
                }
            });
            return Ok(self);
        }

        let (from_parent, from_index) = split_path(&from.path)?;
        let (to_parent, to_index) = split_path(&to.path)?;
        if from_parent == to_parent {
            let mut first = self.textblock(&from.path)?.clone();
            let mut last = self.textblock(&to.path)?.clone();
            first.delete_inline(from.offset, first.text_len());
            let tail = last.split_inline(to.offset);
            first.insert_inline(from.offset, tail);
            self.replace_children(from_parent, from_index..to_index + 1, vec![first])?;
        } else {
            for path in self.doc.textblock_paths() {
                if path < from.path || path > to.path {
                    continue;
                }
                let block = self.textblock_mut(&path)?;
                let start = if path == from.path { from.offset } else { 0 };
                let end = if path == to.path {
                    to.offset
                } else {
                    block.text_len()
                };
                block.delete_inline(start, end);
            }
            self.doc_changed = true;
        }

        self.selection = Selection::cursor(from.clone());
        Ok(self)
    }

    /// Delete the selected content, if any
    pub fn delete_selection(&mut self) -> TransformResult<&mut Self> {
        if self.selection.is_empty() {
            return Ok(self);
        }
        let from = self.selection.from().clone();
        let to = self.selection.to().clone();
        self.delete(&from, &to)
    }

    /// Add `mark` to all text between two positions
    pub fn add_mark(
        &mut self,
        from: &Position,
        to: &Position,
        mark: Mark,
    ) -> TransformResult<&mut Self> {
        let schema = Rc::clone(&self.schema);
        self.map_text_range(from, to, |marks| {
            *marks = schema.add_mark_to_set(marks, mark.clone());
        })
    }

    /// Remove marks of type `name` from all text between two positions
    pub fn remove_mark(
        &mut self,
        from: &Position,
        to: &Position,
        name: &str,
    ) -> TransformResult<&mut Self> {
        self.map_text_range(from, to, |marks| marks.retain(|m| m.name() != name))
    }

    /// Change the type of the textblock at `path`, keeping its inline content
    pub fn set_block_type(
        &mut self,
        path: &[usize],
        node_type: &str,
        attrs: Option<Attrs>,
    ) -> TransformResult<&mut Self> {
        let block = self.textblock(path)?;
        let replacement = self
            .schema
            .node(node_type, attrs, block.children().to_vec())?;
        if !replacement.is_textblock() {
            return Err(TransformError::InvalidContent(node_type.to_string()));
        }
        let (parent, index) = split_path(path)?;
        self.replace_children(parent, index..index + 1, vec![replacement])
    }

    /// Replace the children in `range` of the node at `parent` with `nodes`.
    /// Fails when the result would violate the parent's content expression.
    pub fn replace_children(
        &mut self,
        parent: &[usize],
        range: Range<usize>,
        nodes: Vec<Node>,
    ) -> TransformResult<&mut Self> {
        let node = self
            .doc
            .node_at(parent)
            .ok_or_else(|| TransformError::NoNode(parent.to_vec()))?;
        if range.start > range.end || range.end > node.child_count() {
            let mut path = parent.to_vec();
            path.push(range.end);
            return Err(TransformError::NoNode(path));
        }
        let mut children = node.children().to_vec();
        children.splice(range, nodes);
        if !self.schema.valid_content(node.type_name(), &children) {
            return Err(TransformError::InvalidContent(node.type_name().to_string()));
        }

        let node = self
            .doc
            .node_at_mut(parent)
            .ok_or_else(|| TransformError::NoNode(parent.to_vec()))?;
        *node.content_mut() = children;
        self.doc_changed = true;
        Ok(self)
    }

    /// Replace the child at `parent/index` with `nodes`
    pub fn replace_child(
        &mut self,
        parent: &[usize],
        index: usize,
        nodes: Vec<Node>,
    ) -> TransformResult<&mut Self> {
        self.replace_children(parent, index..index + 1, nodes)
    }

    /// Move the inline content of the textblock at `path` to the end of the
    /// textblock at `target`, which must precede it, and remove the emptied block.
    pub fn join_textblocks(
        &mut self,
        target: &[usize],
        path: &[usize],
    ) -> TransformResult<&mut Self> {
        if target >= path {
            return Err(TransformError::NoNode(target.to_vec()));
        }
        let content = self.textblock(path)?.children().to_vec();
        let end = self.textblock(target)?.text_len();
        let (parent, index) = split_path(path)?;
        self.replace_children(parent, index..index + 1, Vec::new())?;
        let block = self.textblock_mut(target)?;
        block.insert_inline(end, content);
        self.selection = Selection::cursor(Position::new(target.to_vec(), end));
        Ok(self)
    }

    fn textblock_mut(&mut self, path: &[usize]) -> TransformResult<&mut Node> {
        self.doc
            .node_at_mut(path)
            .filter(|node| node.is_textblock())
            .ok_or_else(|| TransformError::NotATextblock(path.to_vec()))
    }

    fn check_position(&self, pos: &Position) -> TransformResult<()> {
        let text = self.textblock(&pos.path)?.text_content();
        if pos.offset > text.len() || !text.is_char_boundary(pos.offset) {
            return Err(TransformError::InvalidOffset {
                path: pos.path.clone(),
                offset: pos.offset,
            });
        }
        Ok(())
    }

    fn map_selection<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Position),
    {
        f(&mut self.selection.anchor);
        f(&mut self.selection.head);
    }

    fn map_text_range<F>(
        &mut self,
        a: &Position,
        b: &Position,
        mut f: F,
    ) -> TransformResult<&mut Self>
    where
        F: FnMut(&mut Vec<Mark>),
    {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        self.check_position(from)?;
        self.check_position(to)?;
        for path in self.doc.textblock_paths() {
            if path < from.path || path > to.path {
                continue;
            }
            let block = self.textblock_mut(&path)?;
            let start = if path == from.path { from.offset } else { 0 };
            let end = if path == to.path {
                to.offset
            } else {
                block.text_len()
            };
            block.map_marks(start, end, &mut f);
        }
        self.doc_changed = true;
        Ok(self)
    }
}

/// Marks at a position, following the inclusive rules: inside a run the run's
/// marks apply; at a boundary the marks of the run before apply, minus
/// non-inclusive marks the run after does not share.
pub fn marks_at(schema: &Schema, doc: &Node, pos: &Position) -> Vec<Mark> {
    let Some(block) = doc.node_at(&pos.path) else {
        return Vec::new();
    };
    let (main, other) = match block.inline_around(pos.offset) {
        (None, None) => return Vec::new(),
        (Some(before), Some(after)) if std::ptr::eq(before, after) => {
            return before.marks().to_vec();
        }
        (Some(before), after) => (before, after),
        (None, Some(after)) => (after, None),
    };
    main.marks()
        .iter()
        .filter(|mark| {
            schema.is_inclusive(mark.name()) || other.is_some_and(|o| mark.is_in_set(o.marks()))
        })
        .cloned()
        .collect()
}

/// Whether any text between two positions carries a mark of type `name`
pub fn range_has_mark(doc: &Node, a: &Position, b: &Position, name: &str) -> bool {
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    for path in doc.textblock_paths() {
        if path < from.path || path > to.path {
            continue;
        }
        let Some(block) = doc.node_at(&path) else {
            continue;
        };
        let start = if path == from.path { from.offset } else { 0 };
        let end = if path == to.path {
            to.offset
        } else {
            block.text_len()
        };
        let mut pos = 0;
        for child in block.children() {
            let len = child.text_len();
            if pos < end && pos + len > start && child.has_mark(name) {
                return true;
            }
            pos += len;
        }
    }
    false
}

/// Clamp a position to the nearest textblock and a valid offset in it
pub fn clamp_position(doc: &Node, pos: &Position) -> Position {
    let paths = doc.textblock_paths();
    let path = if paths.contains(&pos.path) {
        pos.path.clone()
    } else {
        match paths.iter().rev().find(|p| **p <= pos.path).or(paths.first()) {
            Some(path) => path.clone(),
            None => return Position::new(Vec::new(), 0),
        }
    };
    let text = doc
        .node_at(&path)
        .map(|block| block.text_content())
        .unwrap_or_default();
    let mut offset = pos.offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    Position::new(path, offset)
}

pub(crate) fn split_path(path: &[usize]) -> TransformResult<(&[usize], usize)> {
    match path.split_last() {
        Some((index, parent)) => Ok((parent, *index)),
        None => Err(TransformError::NoNode(path.to_vec())),
    }
}
