// Editable tree
// The live document the editing surface works on. Nodes are built through a
// `Schema`, which guarantees that children satisfy the parent's content model.

use serde_json::Value;
use std::cmp::min;
use std::collections::BTreeMap;
use std::fmt;

/// Node and mark attributes. Values are JSON so they can carry whatever a
/// functionality declares.
pub type Attrs = BTreeMap<String, Value>;

/// Build an attribute map from literal pairs.
pub fn attrs<const N: usize>(pairs: [(&str, Value); N]) -> Attrs {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// A mark instance attached to a text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    name: String,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(name: impl Into<String>, attrs: Attrs) -> Self {
        Mark {
            name: name.into(),
            attrs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.contains(self)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.attrs.is_empty() {
            write!(f, "({})", format_attrs(&self.attrs))?;
        }
        Ok(())
    }
}

/// How a node holds content, derived from its type's content expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    /// Holds inline content only.
    Textblock,
    /// Holds block-level children.
    Container,
    /// Holds nothing.
    Leaf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    node_type: String,
    kind: NodeKind,
    attrs: Attrs,
    content: Vec<Node>,
    text: Option<String>,
    marks: Vec<Mark>,
}

impl Node {
    pub(crate) fn branch(
        node_type: impl Into<String>,
        kind: NodeKind,
        attrs: Attrs,
        content: Vec<Node>,
    ) -> Self {
        Node {
            node_type: node_type.into(),
            kind,
            attrs,
            content,
            text: None,
            marks: Vec::new(),
        }
    }

    pub(crate) fn text_node(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node {
            node_type: "text".to_string(),
            kind: NodeKind::Text,
            attrs: Attrs::new(),
            content: Vec::new(),
            text: Some(text.into()),
            marks,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.node_type
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    pub fn children(&self) -> &[Node] {
        &self.content
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.content.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    pub fn is_textblock(&self) -> bool {
        self.kind == NodeKind::Textblock
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn has_mark(&self, name: &str) -> bool {
        self.marks.iter().any(|mark| mark.name == name)
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => self.content.iter().map(|c| c.text_content()).collect(),
        }
    }

    /// Length in bytes of the inline content of a textblock (or of a text node).
    pub fn text_len(&self) -> usize {
        match &self.text {
            Some(text) => text.len(),
            None => self.content.iter().map(|c| c.text_len()).sum(),
        }
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            node = node.content.get(index)?;
        }
        Some(node)
    }

    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &index in path {
            node = node.content.get_mut(index)?;
        }
        Some(node)
    }

    pub(crate) fn content_mut(&mut self) -> &mut Vec<Node> {
        &mut self.content
    }

    /// Paths of all textblocks in document order.
    pub fn textblock_paths(&self) -> Vec<Vec<usize>> {
        fn walk(node: &Node, path: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            if node.is_textblock() {
                out.push(path.clone());
                return;
            }
            for (index, child) in node.content.iter().enumerate() {
                path.push(index);
                walk(child, path, out);
                path.pop();
            }
        }

        let mut out = Vec::new();
        walk(self, &mut Vec::new(), &mut out);
        out
    }

    /// Inline children touching `offset`: the node ending at or containing it, and
    /// the node starting at or containing it.
    pub(crate) fn inline_around(&self, offset: usize) -> (Option<&Node>, Option<&Node>) {
        let mut pos = 0usize;
        let mut before = None;
        for child in &self.content {
            let len = child.text_len();
            if len == 0 {
                continue;
            }
            let end = pos + len;
            if offset > pos && offset < end {
                return (Some(child), Some(child));
            }
            if end == offset {
                before = Some(child);
            }
            if pos == offset {
                return (before, Some(child));
            }
            pos = end;
        }
        (before, None)
    }

    /// Split a textblock's inline content at a byte offset. The left part stays
    /// in `self`, the right part is returned.
    pub(crate) fn split_inline(&mut self, offset: usize) -> Vec<Node> {
        let mut left = Vec::new();
        let mut right = Vec::new();
        let mut pos = 0usize;

        for child in std::mem::take(&mut self.content) {
            let len = child.text_len();
            if pos + len <= offset {
                left.push(child);
            } else if pos >= offset {
                right.push(child);
            } else {
                let local = offset - pos;
                let text = child.text.clone().unwrap_or_default();
                let (l, r) = text.split_at(local);
                left.push(Node::text_node(l, child.marks.clone()));
                right.push(Node::text_node(r, child.marks));
            }
            pos += len;
        }

        self.content = left;
        right
    }

    /// Delete inline content in [from..to)
    pub(crate) fn delete_inline(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        let right = self.split_inline(to);
        self.split_inline(from);
        self.content.extend(right);
        self.normalize_inline();
    }

    /// Insert inline nodes at a byte offset.
    pub(crate) fn insert_inline(&mut self, offset: usize, nodes: Vec<Node>) {
        let right = self.split_inline(offset);
        self.content.extend(nodes);
        self.content.extend(right);
        self.normalize_inline();
    }

    /// Apply `f` to the mark set of every text node in [from..to)
    pub(crate) fn map_marks<F>(&mut self, from: usize, to: usize, mut f: F)
    where
        F: FnMut(&mut Vec<Mark>),
    {
        if from >= to {
            return;
        }
        let right = self.split_inline(to);
        let mut middle = self.split_inline(from);
        for node in &mut middle {
            f(&mut node.marks);
        }
        self.content.extend(middle);
        self.content.extend(right);
        self.normalize_inline();
    }

    /// Drop empty text runs and merge neighbours that carry identical marks.
    pub(crate) fn normalize_inline(&mut self) {
        let mut merged: Vec<Node> = Vec::new();
        for child in std::mem::take(&mut self.content) {
            if child.is_text() && child.text_len() == 0 {
                continue;
            }
            if let Some(last) = merged.last_mut()
                && last.is_text()
                && child.is_text()
                && last.marks == child.marks
            {
                let extra = child.text.unwrap_or_default();
                last.text.get_or_insert_with(String::new).push_str(&extra);
                continue;
            }
            merged.push(child);
        }
        self.content = merged;
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        if let Some(text) = &self.text {
            write!(f, "{}{:?}", indent, text)?;
            if !self.marks.is_empty() {
                let marks: Vec<String> = self.marks.iter().map(|m| m.to_string()).collect();
                write!(f, " [{}]", marks.join(", "))?;
            }
            return Ok(());
        }

        write!(f, "{}{}", indent, self.node_type)?;
        if !self.attrs.is_empty() {
            write!(f, " {}", format_attrs(&self.attrs))?;
        }
        for child in &self.content {
            writeln!(f)?;
            child.write_outline(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Indented outline, one node per line, without a trailing newline.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, 0)
    }
}

fn format_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A position inside a textblock: the child-index path from the document to the
/// textblock, and a byte offset into its inline text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Position {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Position { path, offset }
    }

    /// Nesting depth of the enclosing textblock; a top-level paragraph is at depth 1.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn with_offset(&self, offset: usize) -> Self {
        Position::new(self.path.clone(), offset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub head: Position,
}

impl Selection {
    pub fn new(anchor: Position, head: Position) -> Self {
        Selection { anchor, head }
    }

    pub fn cursor(pos: Position) -> Self {
        Selection::new(pos.clone(), pos)
    }

    /// Cursor at the start of the first textblock, or at the document root
    /// when there is none.
    pub fn at_start(doc: &Node) -> Self {
        let path = doc.textblock_paths().into_iter().next().unwrap_or_default();
        Selection::cursor(Position::new(path, 0))
    }

    /// From the start of the first textblock to the end of the last one.
    pub fn all(doc: &Node) -> Self {
        let paths = doc.textblock_paths();
        let (Some(first), Some(last)) = (paths.first(), paths.last()) else {
            return Selection::at_start(doc);
        };
        let end = doc.node_at(last).map(|n| n.text_len()).unwrap_or(0);
        Selection::new(
            Position::new(first.clone(), 0),
            Position::new(last.clone(), end),
        )
    }

    pub fn from(&self) -> &Position {
        min(&self.anchor, &self.head)
    }

    pub fn to(&self) -> &Position {
        std::cmp::max(&self.anchor, &self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Both ends lie in the same textblock.
    pub fn is_within_block(&self) -> bool {
        self.anchor.path == self.head.path
    }
}
