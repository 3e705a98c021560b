// Schema
// Node and mark type definitions assembled from functionalities. Every node
// built through `Schema::node` satisfies its type's content expression.

use super::model::{Attrs, Mark, Node, NodeKind};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("node type `{0}` is defined more than once")]
    DuplicateNode(String),
    #[error("mark type `{0}` is defined more than once")]
    DuplicateMark(String),
    #[error("schema is missing the required `{0}` node type")]
    MissingRequiredNode(&'static str),
    #[error("unknown node type `{0}`")]
    UnknownNodeType(String),
    #[error("unknown mark type `{0}`")]
    UnknownMarkType(String),
    #[error("invalid content expression `{expr}` on node `{node}`")]
    InvalidContentExpr { node: String, expr: String },
    #[error("content expression of `{node}` refers to unknown node or group `{term}`")]
    UnknownContentTerm { node: String, term: String },
    #[error("invalid content for node `{0}`")]
    InvalidContent(String),
    #[error("`{owner}` requires attribute `{attr}`")]
    MissingAttr { owner: String, attr: String },
    #[error("`{owner}` has no attribute `{attr}`")]
    UnknownAttr { owner: String, attr: String },
    #[error("text nodes are created with `Schema::text`")]
    TextViaNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Quantifier {
    fn bounds(self) -> (usize, usize) {
        match self {
            Quantifier::One => (1, 1),
            Quantifier::Optional => (0, 1),
            Quantifier::ZeroOrMore => (0, usize::MAX),
            Quantifier::OneOrMore => (1, usize::MAX),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ContentTerm {
    name: String,
    quantifier: Quantifier,
}

/// A content expression such as `"block+"`, `"inline*"` or `"paragraph block*"`.
/// Terms name a node type or a group and are matched greedily in sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentExpr {
    terms: Vec<ContentTerm>,
}

impl ContentExpr {
    pub fn parse(expr: &str) -> Option<Self> {
        let mut terms = Vec::new();
        for token in expr.split_whitespace() {
            let (name, quantifier) = match token.chars().last() {
                Some('*') => (&token[..token.len() - 1], Quantifier::ZeroOrMore),
                Some('+') => (&token[..token.len() - 1], Quantifier::OneOrMore),
                Some('?') => (&token[..token.len() - 1], Quantifier::Optional),
                _ => (token, Quantifier::One),
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return None;
            }
            terms.push(ContentTerm {
                name: name.to_string(),
                quantifier,
            });
        }
        Some(ContentExpr { terms })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// One attribute a node or mark accepts. Attributes without a default are required.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrSpec {
    pub name: String,
    pub default: Option<Value>,
}

impl AttrSpec {
    pub fn required(name: &str) -> Self {
        AttrSpec {
            name: name.to_string(),
            default: None,
        }
    }

    pub fn with_default(name: &str, default: Value) -> Self {
        AttrSpec {
            name: name.to_string(),
            default: Some(default),
        }
    }
}

/// What a node or mark projects to in the editing surface's markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomOutput {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    /// Whether children are rendered inside the element.
    pub hole: bool,
}

impl DomOutput {
    pub fn wrap(tag: &str) -> Self {
        DomOutput {
            tag: tag.to_string(),
            attrs: Vec::new(),
            hole: true,
        }
    }

    pub fn void(tag: &str) -> Self {
        DomOutput {
            tag: tag.to_string(),
            attrs: Vec::new(),
            hole: false,
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    fn write_open(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
        }
        out.push('>');
    }

    fn write_close(&self, out: &mut String) {
        if self.hole {
            out.push_str(&format!("</{}>", self.tag));
        }
    }
}

/// A markup element offered to the parse rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomElement {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
}

impl DomElement {
    pub fn new(tag: &str) -> Self {
        DomElement {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property.to_string(), value.to_string());
        self
    }
}

pub type NodeToDom = fn(&Node) -> DomOutput;
pub type MarkToDom = fn(&Mark) -> DomOutput;
pub type GetAttrs = fn(&DomElement) -> Option<Attrs>;

/// Recognises a markup element as a node or mark.
#[derive(Clone, Default)]
pub struct ParseRule {
    pub tag: Option<&'static str>,
    pub style: Option<(&'static str, &'static str)>,
    pub attrs: Attrs,
    pub get_attrs: Option<GetAttrs>,
}

impl ParseRule {
    pub fn tag(tag: &'static str) -> Self {
        ParseRule {
            tag: Some(tag),
            ..Default::default()
        }
    }

    pub fn style(property: &'static str, value: &'static str) -> Self {
        ParseRule {
            style: Some((property, value)),
            ..Default::default()
        }
    }

    pub fn with_attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_get_attrs(mut self, get_attrs: GetAttrs) -> Self {
        self.get_attrs = Some(get_attrs);
        self
    }

    fn matches(&self, element: &DomElement) -> Option<Attrs> {
        if let Some(tag) = self.tag
            && !element.tag.eq_ignore_ascii_case(tag)
        {
            return None;
        }
        if let Some((property, value)) = self.style
            && element.style.get(property).map(String::as_str) != Some(value)
        {
            return None;
        }
        if self.tag.is_none() && self.style.is_none() {
            return None;
        }
        let mut attrs = self.attrs.clone();
        if let Some(get_attrs) = self.get_attrs {
            attrs.extend(get_attrs(element)?);
        }
        Some(attrs)
    }
}

impl fmt::Debug for ParseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseRule")
            .field("tag", &self.tag)
            .field("style", &self.style)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Default)]
pub struct NodeSpec {
    pub content: Option<String>,
    /// Space separated group names, e.g. `"block"`.
    pub group: Option<String>,
    pub inline: bool,
    pub attrs: Vec<AttrSpec>,
    pub defining: bool,
    pub selectable: bool,
    pub draggable: bool,
    pub to_dom: Option<NodeToDom>,
    pub parse_dom: Vec<ParseRule>,
}

impl fmt::Debug for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSpec")
            .field("content", &self.content)
            .field("group", &self.group)
            .field("inline", &self.inline)
            .field("attrs", &self.attrs)
            .field("parse_dom", &self.parse_dom)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct MarkSpec {
    pub attrs: Vec<AttrSpec>,
    /// Whether text typed at the mark's end picks the mark up.
    pub inclusive: bool,
    /// Whether several instances of this type (differing in attrs) may coexist.
    pub overlapping: bool,
    pub to_dom: Option<MarkToDom>,
    pub parse_dom: Vec<ParseRule>,
}

impl Default for MarkSpec {
    fn default() -> Self {
        MarkSpec {
            attrs: Vec::new(),
            inclusive: true,
            overlapping: false,
            to_dom: None,
            parse_dom: Vec::new(),
        }
    }
}

impl fmt::Debug for MarkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkSpec")
            .field("attrs", &self.attrs)
            .field("inclusive", &self.inclusive)
            .field("overlapping", &self.overlapping)
            .field("parse_dom", &self.parse_dom)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct NodeType {
    name: String,
    spec: NodeSpec,
    content: Option<ContentExpr>,
    kind: NodeKind,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.spec
            .group
            .as_deref()
            .is_some_and(|groups| groups.split_whitespace().any(|g| g == group))
    }
}

#[derive(Debug)]
pub struct MarkType {
    name: String,
    spec: MarkSpec,
    rank: usize,
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.spec
    }

    pub fn rank(&self) -> usize {
        self.rank
    }
}

/// Result of matching a markup element against the schema's parse rules.
#[derive(Debug, Clone, PartialEq)]
pub enum DomMatch {
    Node { name: String, attrs: Attrs },
    Mark { name: String, attrs: Attrs },
}

#[derive(Debug)]
pub struct Schema {
    nodes: IndexMap<String, NodeType>,
    marks: IndexMap<String, MarkType>,
}

impl Schema {
    /// Build a schema. Requires `doc` and `text` node types; every content
    /// expression must refer to known node types or groups.
    pub fn new(
        nodes: Vec<(String, NodeSpec)>,
        marks: Vec<(String, MarkSpec)>,
    ) -> Result<Self, SchemaError> {
        let mut node_types: IndexMap<String, NodeType> = IndexMap::new();
        for (name, spec) in nodes {
            if node_types.contains_key(&name) {
                return Err(SchemaError::DuplicateNode(name));
            }
            let content = match &spec.content {
                Some(expr) => Some(ContentExpr::parse(expr).ok_or_else(|| {
                    SchemaError::InvalidContentExpr {
                        node: name.clone(),
                        expr: expr.clone(),
                    }
                })?),
                None => None,
            };
            node_types.insert(
                name.clone(),
                NodeType {
                    name,
                    spec,
                    content,
                    kind: NodeKind::Leaf,
                },
            );
        }

        for required in ["doc", "text"] {
            if !node_types.contains_key(required) {
                return Err(SchemaError::MissingRequiredNode(required));
            }
        }

        let kinds = node_types
            .values()
            .map(|node_type| derive_kind(&node_types, node_type))
            .collect::<Result<Vec<_>, _>>()?;
        for (node_type, kind) in node_types.values_mut().zip(kinds) {
            node_type.kind = kind;
        }

        let mut mark_types: IndexMap<String, MarkType> = IndexMap::new();
        for (name, spec) in marks {
            if mark_types.contains_key(&name) {
                return Err(SchemaError::DuplicateMark(name));
            }
            let rank = mark_types.len();
            mark_types.insert(name.clone(), MarkType { name, spec, rank });
        }

        Ok(Schema {
            nodes: node_types,
            marks: mark_types,
        })
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.nodes.get(name)
    }

    pub fn mark_type(&self, name: &str) -> Option<&MarkType> {
        self.marks.get(name)
    }

    pub fn node_types(&self) -> impl Iterator<Item = &NodeType> {
        self.nodes.values()
    }

    pub fn mark_types(&self) -> impl Iterator<Item = &MarkType> {
        self.marks.values()
    }

    /// Create a non-text node, validating attributes and content.
    pub fn node(
        &self,
        name: &str,
        attrs: Option<Attrs>,
        content: Vec<Node>,
    ) -> Result<Node, SchemaError> {
        if name == "text" {
            return Err(SchemaError::TextViaNode);
        }
        let node_type = self
            .node_type(name)
            .ok_or_else(|| SchemaError::UnknownNodeType(name.to_string()))?;
        let attrs = compute_attrs(name, &node_type.spec.attrs, attrs)?;
        if !self.content_matches(node_type, &content) {
            return Err(SchemaError::InvalidContent(name.to_string()));
        }
        Ok(Node::branch(name, node_type.kind, attrs, content))
    }

    /// Create a non-text node from content that is taken as it is. Only the
    /// type and attributes are checked. Stored documents load this way, so a
    /// list item holding no blocks or starting with a nested list survives.
    pub fn node_unchecked(
        &self,
        name: &str,
        attrs: Option<Attrs>,
        content: Vec<Node>,
    ) -> Result<Node, SchemaError> {
        if name == "text" {
            return Err(SchemaError::TextViaNode);
        }
        let node_type = self
            .node_type(name)
            .ok_or_else(|| SchemaError::UnknownNodeType(name.to_string()))?;
        let attrs = compute_attrs(name, &node_type.spec.attrs, attrs)?;
        Ok(Node::branch(name, node_type.kind, attrs, content))
    }

    /// Create a text node. Marks are put in rank order.
    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> Node {
        Node::text_node(text, self.normalize_marks(marks))
    }

    pub fn mark(&self, name: &str, attrs: Option<Attrs>) -> Result<Mark, SchemaError> {
        let mark_type = self
            .mark_type(name)
            .ok_or_else(|| SchemaError::UnknownMarkType(name.to_string()))?;
        let attrs = compute_attrs(name, &mark_type.spec.attrs, attrs)?;
        Ok(Mark::new(name, attrs))
    }

    /// A document holding one empty default textblock.
    pub fn empty_doc(&self) -> Result<Node, SchemaError> {
        let textblock = self
            .default_textblock()
            .ok_or(SchemaError::MissingRequiredNode("paragraph"))?;
        let block = self.node(textblock, None, Vec::new())?;
        self.node("doc", None, vec![block])
    }

    /// The first declared textblock type; new blocks created by splitting at the
    /// end of a block use it.
    pub fn default_textblock(&self) -> Option<&str> {
        self.nodes
            .values()
            .find(|t| t.kind == NodeKind::Textblock && t.in_group("block"))
            .map(|t| t.name.as_str())
    }

    pub fn in_group(&self, node: &str, group: &str) -> bool {
        self.node_type(node).is_some_and(|t| t.in_group(group))
    }

    /// Whether `children` would be valid content for a node of type `parent`.
    pub fn valid_content(&self, parent: &str, children: &[Node]) -> bool {
        self.node_type(parent)
            .is_some_and(|t| self.content_matches(t, children))
    }

    pub fn mark_rank(&self, name: &str) -> usize {
        self.mark_type(name).map_or(usize::MAX, |t| t.rank)
    }

    pub fn is_inclusive(&self, name: &str) -> bool {
        self.mark_type(name).is_none_or(|t| t.spec.inclusive)
    }

    /// Add `mark` to a rank-ordered set. A mark of the same type replaces the
    /// existing one unless the type allows overlapping instances.
    pub fn add_mark_to_set(&self, set: &[Mark], mark: Mark) -> Vec<Mark> {
        if mark.is_in_set(set) {
            return set.to_vec();
        }
        let overlapping = self
            .mark_type(mark.name())
            .is_some_and(|t| t.spec.overlapping);
        let mut out: Vec<Mark> = set
            .iter()
            .filter(|m| overlapping || m.name() != mark.name())
            .cloned()
            .collect();
        let rank = self.mark_rank(mark.name());
        let at = out
            .iter()
            .position(|m| self.mark_rank(m.name()) > rank)
            .unwrap_or(out.len());
        out.insert(at, mark);
        out
    }

    pub fn remove_mark_from_set(&self, set: &[Mark], name: &str) -> Vec<Mark> {
        set.iter().filter(|m| m.name() != name).cloned().collect()
    }

    pub fn normalize_marks(&self, marks: Vec<Mark>) -> Vec<Mark> {
        marks
            .into_iter()
            .fold(Vec::new(), |set, mark| self.add_mark_to_set(&set, mark))
    }

    /// Find the first node or mark parse rule accepting `element`, nodes first.
    pub fn parse_dom(&self, element: &DomElement) -> Option<DomMatch> {
        for node_type in self.nodes.values() {
            for rule in &node_type.spec.parse_dom {
                if let Some(attrs) = rule.matches(element) {
                    return Some(DomMatch::Node {
                        name: node_type.name.clone(),
                        attrs,
                    });
                }
            }
        }
        for mark_type in self.marks.values() {
            for rule in &mark_type.spec.parse_dom {
                if let Some(attrs) = rule.matches(element) {
                    return Some(DomMatch::Mark {
                        name: mark_type.name.clone(),
                        attrs,
                    });
                }
            }
        }
        None
    }

    /// Project a tree to HTML through the node and mark `to_dom` hooks.
    pub fn render_html(&self, node: &Node) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: &Node, out: &mut String) {
        if let Some(text) = node.text() {
            let wrappers: Vec<DomOutput> = node
                .marks()
                .iter()
                .filter_map(|mark| {
                    let to_dom = self.mark_type(mark.name())?.spec.to_dom?;
                    Some(to_dom(mark))
                })
                .collect();
            for wrapper in &wrappers {
                wrapper.write_open(out);
            }
            out.push_str(&escape_html(text));
            for wrapper in wrappers.iter().rev() {
                wrapper.write_close(out);
            }
            return;
        }

        let output = self
            .node_type(node.type_name())
            .and_then(|t| t.spec.to_dom)
            .map(|to_dom| to_dom(node));
        match output {
            Some(output) => {
                output.write_open(out);
                if output.hole {
                    for child in node.children() {
                        self.write_html(child, out);
                    }
                }
                output.write_close(out);
            }
            None => {
                for child in node.children() {
                    self.write_html(child, out);
                }
            }
        }
    }

    fn content_matches(&self, node_type: &NodeType, children: &[Node]) -> bool {
        let Some(expr) = &node_type.content else {
            return children.is_empty();
        };
        let mut index = 0;
        for term in &expr.terms {
            let (min, max) = term.quantifier.bounds();
            let mut count = 0;
            while count < max
                && index < children.len()
                && self.matches_term(children[index].type_name(), &term.name)
            {
                count += 1;
                index += 1;
            }
            if count < min {
                return false;
            }
        }
        index == children.len()
    }

    fn matches_term(&self, node: &str, term: &str) -> bool {
        node == term || self.in_group(node, term)
    }
}

fn derive_kind(
    nodes: &IndexMap<String, NodeType>,
    node_type: &NodeType,
) -> Result<NodeKind, SchemaError> {
    if node_type.name == "text" {
        return Ok(NodeKind::Text);
    }
    let Some(expr) = &node_type.content else {
        return Ok(NodeKind::Leaf);
    };
    if expr.is_empty() {
        return Ok(NodeKind::Leaf);
    }

    let mut all_inline = true;
    for term in &expr.terms {
        let members: Vec<&NodeType> = nodes
            .values()
            .filter(|t| t.name == term.name || t.in_group(&term.name))
            .collect();
        if members.is_empty() {
            return Err(SchemaError::UnknownContentTerm {
                node: node_type.name.clone(),
                term: term.name.clone(),
            });
        }
        all_inline &= members.iter().all(|t| t.spec.inline);
    }

    Ok(if all_inline {
        NodeKind::Textblock
    } else {
        NodeKind::Container
    })
}

fn compute_attrs(
    owner: &str,
    specs: &[AttrSpec],
    given: Option<Attrs>,
) -> Result<Attrs, SchemaError> {
    let mut given = given.unwrap_or_default();
    let mut attrs = Attrs::new();
    for spec in specs {
        let value = given
            .remove(&spec.name)
            .or_else(|| spec.default.clone())
            .ok_or_else(|| SchemaError::MissingAttr {
                owner: owner.to_string(),
                attr: spec.name.clone(),
            })?;
        attrs.insert(spec.name.clone(), value);
    }
    if let Some(extra) = given.keys().next() {
        return Err(SchemaError::UnknownAttr {
            owner: owner.to_string(),
            attr: extra.clone(),
        });
    }
    Ok(attrs)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
