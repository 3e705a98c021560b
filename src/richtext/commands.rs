// Commands
// Named editing operations. A command looks at a state and returns the
// transaction to apply, or None when it does not apply there.

use super::model::{Attrs, Node, Position, Selection};
use super::schema::{Schema, SchemaError};
use super::state::{EditorState, Transaction, TransformError, TransformResult, split_path};
use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

pub const LIST: &str = "list";
pub const LIST_ITEM: &str = "list_item";

pub type Command = Rc<dyn Fn(&EditorState) -> Option<Transaction>>;
pub type CommandConstructor = Rc<dyn Fn(&Attrs) -> Command>;

/// A command table entry: either ready to run, or built from arguments.
#[derive(Clone)]
pub enum CommandEntry {
    Plain(Command),
    Constructor(CommandConstructor),
}

impl CommandEntry {
    pub fn plain<F>(f: F) -> Self
    where
        F: Fn(&EditorState) -> Option<Transaction> + 'static,
    {
        CommandEntry::Plain(Rc::new(f))
    }

    pub fn constructor<F>(f: F) -> Self
    where
        F: Fn(&Attrs) -> Command + 'static,
    {
        CommandEntry::Constructor(Rc::new(f))
    }

    /// Produce a runnable command. Plain commands ignore `args`.
    pub fn resolve(&self, args: &Attrs) -> Command {
        match self {
            CommandEntry::Plain(command) => Rc::clone(command),
            CommandEntry::Constructor(build) => build(args),
        }
    }

    pub fn is_parameterized(&self) -> bool {
        matches!(self, CommandEntry::Constructor(_))
    }
}

impl From<Command> for CommandEntry {
    fn from(command: Command) -> Self {
        CommandEntry::Plain(command)
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandEntry::Plain(_) => f.write_str("CommandEntry::Plain"),
            CommandEntry::Constructor(_) => f.write_str("CommandEntry::Constructor"),
        }
    }
}

/// Commands by name, in registration order
#[derive(Clone, Default)]
pub struct CommandTable {
    entries: IndexMap<String, CommandEntry>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, returning the entry it replaced
    pub fn insert(&mut self, name: impl Into<String>, entry: CommandEntry) -> Option<CommandEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn resolve(&self, name: &str, args: &Attrs) -> Option<Command> {
        self.get(name).map(|entry| entry.resolve(args))
    }

    /// Resolve and run a command against `state`
    pub fn run(&self, name: &str, args: &Attrs, state: &EditorState) -> Option<Transaction> {
        self.resolve(name, args).and_then(|command| command(state))
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Build a transaction with `f`. `Ok(false)` and errors both decline.
pub fn attempt<F>(state: &EditorState, f: F) -> Option<Transaction>
where
    F: FnOnce(&mut Transaction) -> TransformResult<bool>,
{
    let mut tr = state.tr();
    match f(&mut tr) {
        Ok(true) => Some(tr),
        Ok(false) => None,
        Err(err) => {
            debug!("command declined: {}", err);
            None
        }
    }
}

/// Toggle a mark over the selection. With an empty selection the stored marks
/// are toggled instead, so the next typed text picks the change up.
pub fn toggle_mark(name: &str, attrs: Option<Attrs>) -> Command {
    let name = name.to_string();
    Rc::new(move |state| {
        attempt(state, |tr| {
            let schema = Rc::clone(state.schema());
            let mark = schema.mark(&name, attrs.clone())?;
            let selection = state.selection();

            if selection.is_empty() {
                let current = state.cursor_marks();
                let next = if current.iter().any(|m| m.name() == name) {
                    schema.remove_mark_from_set(&current, &name)
                } else {
                    schema.add_mark_to_set(&current, mark)
                };
                tr.set_stored_marks(Some(next));
                return Ok(true);
            }

            let (from, to) = (selection.from(), selection.to());
            if tr.range_has_mark(from, to, &name) {
                tr.remove_mark(from, to, &name)?;
            } else {
                tr.add_mark(from, to, mark)?;
            }
            Ok(true)
        })
    })
}

/// Replace the selection with a new block node. An empty textblock is
/// replaced outright; otherwise the block is inserted before, after or in
/// the middle of the current one. Leaf blocks get a textblock after them to
/// hold the cursor.
pub fn insert_block(node_type: &str, attrs: Option<Attrs>) -> Command {
    let node_type = node_type.to_string();
    Rc::new(move |state| {
        attempt(state, |tr| {
            tr.delete_selection()?;
            let schema = Rc::clone(tr.schema());
            let node = schema.node(&node_type, attrs.clone(), Vec::new())?;
            let head = tr.selection().head.clone();
            let block = tr.textblock(&head.path)?.clone();
            let (parent, index) = split_path(&head.path)?;
            let parent = parent.to_vec();
            let enters = node.is_textblock();
            let len = block.text_len();

            let (replacement, cursor_index) = if len == 0 {
                if enters {
                    (vec![node], index)
                } else {
                    (vec![node, empty_textblock(&schema)?], index + 1)
                }
            } else if head.offset == len {
                if enters {
                    (vec![block, node], index + 1)
                } else {
                    (vec![block, node, empty_textblock(&schema)?], index + 2)
                }
            } else if head.offset == 0 {
                (vec![node, block], if enters { index } else { index + 1 })
            } else {
                let mut left = block.clone();
                let right_content = left.split_inline(head.offset);
                let right = schema.node(block.type_name(), Some(block.attrs().clone()), right_content)?;
                (vec![left, node, right], if enters { index + 1 } else { index + 2 })
            };

            tr.replace_children(&parent, index..index + 1, replacement)?;
            tr.set_cursor(Position::new(child_path(&parent, cursor_index), 0));
            Ok(true)
        })
    })
}

/// Split the textblock at the cursor (Enter). Splitting at the end of a block
/// starts a default textblock.
pub fn split_block() -> Command {
    Rc::new(|state| attempt(state, |tr| split_textblock(tr, false)))
}

/// Delete the selection, or the grapheme before the cursor (Backspace). At
/// the start of a block, join with the block before it.
pub fn delete_backward() -> Command {
    Rc::new(|state| {
        let selection = state.selection();
        if !selection.is_empty() {
            return attempt(state, |tr| {
                tr.delete_selection()?;
                Ok(true)
            });
        }

        let head = &selection.head;
        let block = state.head_block()?;
        if head.offset > 0 {
            let text = block.text_content();
            let start = text
                .get(..head.offset)?
                .grapheme_indices(true)
                .next_back()
                .map_or(0, |(index, _)| index);
            return attempt(state, |tr| {
                tr.delete(&head.with_offset(start), head)?;
                Ok(true)
            });
        }

        if list_item_context(state.doc(), &head.path).is_some_and(|ctx| ctx.block_index == 0) {
            return attempt(state, lift_item);
        }

        let (parent, index) = split_path(&head.path).ok()?;
        let previous_path = child_path(parent, index.checked_sub(1)?);
        let previous = state.doc().node_at(&previous_path)?;
        if previous.is_leaf() {
            return attempt(state, |tr| {
                tr.replace_children(parent, index - 1..index, Vec::new())?;
                tr.set_cursor(Position::new(previous_path.clone(), 0));
                Ok(true)
            });
        }

        let target = last_textblock(previous, &previous_path)?;
        attempt(state, |tr| {
            tr.join_textblocks(&target, &head.path)?;
            Ok(true)
        })
    })
}

/// Delete the selection, or the grapheme after the cursor (Delete). At the
/// end of a block, pull the next block in.
pub fn delete_forward() -> Command {
    Rc::new(|state| {
        let selection = state.selection();
        if !selection.is_empty() {
            return attempt(state, |tr| {
                tr.delete_selection()?;
                Ok(true)
            });
        }

        let head = &selection.head;
        let block = state.head_block()?;
        let text = block.text_content();
        if head.offset < text.len() {
            let end = text
                .get(head.offset..)?
                .graphemes(true)
                .next()
                .map_or(text.len(), |g| head.offset + g.len());
            return attempt(state, |tr| {
                tr.delete(head, &head.with_offset(end))?;
                Ok(true)
            });
        }

        let (parent, index) = split_path(&head.path).ok()?;
        let next_path = child_path(parent, index + 1);
        let next = state.doc().node_at(&next_path)?;
        if next.is_leaf() {
            return attempt(state, |tr| {
                tr.replace_children(parent, index + 1..index + 2, Vec::new())?;
                Ok(true)
            });
        }

        let source = first_textblock(next, &next_path)?;
        attempt(state, |tr| {
            tr.join_textblocks(&head.path, &source)?;
            Ok(true)
        })
    })
}

pub fn select_all() -> Command {
    Rc::new(|state| {
        let mut tr = state.tr();
        tr.set_selection(Selection::all(state.doc()));
        Some(tr)
    })
}

/// Where a position sits inside a list: the innermost list item and the index
/// of the item child holding the position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItemContext {
    pub item_path: Vec<usize>,
    pub block_index: usize,
}

pub fn list_item_context(doc: &Node, path: &[usize]) -> Option<ListItemContext> {
    (1..path.len()).rev().find_map(|len| {
        let node = doc.node_at(&path[..len])?;
        (node.type_name() == LIST_ITEM).then(|| ListItemContext {
            item_path: path[..len].to_vec(),
            block_index: path[len],
        })
    })
}

pub fn is_in_list(doc: &Node, path: &[usize]) -> bool {
    list_item_context(doc, path).is_some()
}

/// Wrap the textblock at the cursor in a list, joining a list right before it
pub fn wrap_in_list() -> Command {
    Rc::new(|state| {
        attempt(state, |tr| {
            let path = tr.selection().head.path.clone();
            wrap_textblock_in_list(tr, &path)
        })
    })
}

/// Move the list item at the cursor one level out (Shift-Tab)
pub fn lift_list_item() -> Command {
    Rc::new(|state| attempt(state, lift_item))
}

/// Nest the list item at the cursor under the item before it (Tab)
pub fn sink_list_item() -> Command {
    Rc::new(|state| attempt(state, sink_item))
}

/// Split the list item at the cursor (Enter). An empty last block ends the
/// item instead.
pub fn split_list_item() -> Command {
    Rc::new(|state| attempt(state, split_item))
}

/// Start a new paragraph inside the current list item (Shift-Enter)
pub fn extend_list_item() -> Command {
    Rc::new(|state| {
        let selection = state.selection();
        if !selection.is_empty() || !is_in_list(state.doc(), &selection.head.path) {
            return None;
        }
        attempt(state, |tr| split_textblock(tr, true))
    })
}

/// Lift out of a list when inside one, wrap into one otherwise
pub fn toggle_list() -> Command {
    Rc::new(|state| {
        let head = &state.selection().head;
        if is_in_list(state.doc(), &head.path) {
            attempt(state, lift_item)
        } else {
            let path = head.path.clone();
            attempt(state, |tr| wrap_textblock_in_list(tr, &path))
        }
    })
}

pub(crate) fn wrap_textblock_in_list(tr: &mut Transaction, path: &[usize]) -> TransformResult<bool> {
    let schema = Rc::clone(tr.schema());
    let block = tr.textblock(path)?.clone();
    let head = tr.selection().head.clone();
    let offset = if head.path == path { head.offset } else { 0 };
    let item = schema.node(LIST_ITEM, None, vec![block])?;
    let (parent, index) = split_path(path)?;

    let previous = index
        .checked_sub(1)
        .and_then(|i| tr.doc().node_at(&child_path(parent, i)))
        .filter(|node| node.type_name() == LIST)
        .cloned();

    let cursor = match previous {
        Some(list) => {
            let mut items = list.children().to_vec();
            let item_index = items.len();
            items.push(item);
            let joined = schema.node(LIST, Some(list.attrs().clone()), items)?;
            tr.replace_children(parent, index - 1..index + 1, vec![joined])?;
            [child_path(parent, index - 1), vec![item_index, 0]].concat()
        }
        None => {
            let list = schema.node(LIST, None, vec![item])?;
            tr.replace_child(parent, index, vec![list])?;
            [child_path(parent, index), vec![0, 0]].concat()
        }
    };
    tr.set_cursor(Position::new(cursor, offset));
    Ok(true)
}

fn lift_item(tr: &mut Transaction) -> TransformResult<bool> {
    let head = tr.selection().head.clone();
    let Some(ctx) = list_item_context(tr.doc(), &head.path) else {
        return Ok(false);
    };
    let schema = Rc::clone(tr.schema());
    let (list_path, item_index) = split_path(&ctx.item_path)?;
    let (container_path, list_index) = split_path(list_path)?;
    let list = node_cloned(tr, list_path)?;
    let container = node_cloned(tr, container_path)?;
    let item = list.children()[item_index].clone();
    let before = list.children()[..item_index].to_vec();
    let after = list.children()[item_index + 1..].to_vec();
    let rest = &head.path[ctx.item_path.len()..];

    let cursor = if container.type_name() == LIST_ITEM {
        // Nested: the item moves to the outer list, taking the items after it along.
        let (outer_list_path, outer_index) = split_path(container_path)?;
        let mut lifted_children = item.children().to_vec();
        if !after.is_empty() {
            lifted_children.push(schema.node(LIST, Some(list.attrs().clone()), after)?);
        }
        let lifted = schema.node(LIST_ITEM, Some(item.attrs().clone()), lifted_children)?;

        let mut outer_children = container.children().to_vec();
        if before.is_empty() {
            outer_children.remove(list_index);
        } else {
            outer_children[list_index] = schema.node(LIST, Some(list.attrs().clone()), before)?;
        }
        let outer_item = schema.node(LIST_ITEM, Some(container.attrs().clone()), outer_children)?;

        tr.replace_children(outer_list_path, outer_index..outer_index + 1, vec![outer_item, lifted])?;
        [child_path(outer_list_path, outer_index + 1), rest.to_vec()].concat()
    } else {
        let mut replacement = Vec::new();
        if !before.is_empty() {
            replacement.push(schema.node(LIST, Some(list.attrs().clone()), before)?);
        }
        let shift = replacement.len();
        replacement.extend(item.children().iter().cloned());
        if !after.is_empty() {
            replacement.push(schema.node(LIST, Some(list.attrs().clone()), after)?);
        }

        tr.replace_children(container_path, list_index..list_index + 1, replacement)?;
        let mut path = child_path(container_path, list_index + shift + rest[0]);
        path.extend_from_slice(&rest[1..]);
        path
    };

    tr.set_cursor(Position::new(cursor, head.offset));
    Ok(true)
}

fn sink_item(tr: &mut Transaction) -> TransformResult<bool> {
    let head = tr.selection().head.clone();
    let Some(ctx) = list_item_context(tr.doc(), &head.path) else {
        return Ok(false);
    };
    let (list_path, item_index) = split_path(&ctx.item_path)?;
    if item_index == 0 {
        return Ok(false);
    }
    let schema = Rc::clone(tr.schema());
    let list = node_cloned(tr, list_path)?;
    let item = list.children()[item_index].clone();
    let previous = list.children()[item_index - 1].clone();
    let rest = &head.path[ctx.item_path.len()..];

    let mut previous_children = previous.children().to_vec();
    let relative = match previous_children.last().cloned() {
        Some(last) if last.type_name() == LIST => {
            let nested_index = previous_children.len() - 1;
            let mut items = last.children().to_vec();
            let position = items.len();
            items.push(item);
            previous_children[nested_index] = schema.node(LIST, Some(last.attrs().clone()), items)?;
            vec![nested_index, position]
        }
        _ => {
            let nested_index = previous_children.len();
            previous_children.push(schema.node(LIST, None, vec![item])?);
            vec![nested_index, 0]
        }
    };
    let previous = schema.node(LIST_ITEM, Some(previous.attrs().clone()), previous_children)?;

    tr.replace_children(list_path, item_index - 1..item_index + 1, vec![previous])?;
    let cursor = [child_path(list_path, item_index - 1), relative, rest.to_vec()].concat();
    tr.set_cursor(Position::new(cursor, head.offset));
    Ok(true)
}

fn split_item(tr: &mut Transaction) -> TransformResult<bool> {
    tr.delete_selection()?;
    let head = tr.selection().head.clone();
    let Some(ctx) = list_item_context(tr.doc(), &head.path) else {
        return Ok(false);
    };
    if head.path.len() != ctx.item_path.len() + 1 {
        return Ok(false);
    }
    let schema = Rc::clone(tr.schema());
    let item = node_cloned(tr, &ctx.item_path)?;
    let block = item.children()[ctx.block_index].clone();
    let (list_path, item_index) = split_path(&ctx.item_path)?;

    let (left_children, right_children) =
        if block.text_len() == 0 && ctx.block_index + 1 == item.child_count() {
            if item.child_count() == 1 {
                return lift_item(tr);
            }
            let mut children = item.children().to_vec();
            children.pop();
            (children, vec![empty_textblock(&schema)?])
        } else {
            let mut left_block = block;
            let right_inline = left_block.split_inline(head.offset);
            let mut left = item.children()[..ctx.block_index].to_vec();
            left.push(left_block);
            let mut right = vec![default_textblock(&schema, right_inline)?];
            right.extend(item.children()[ctx.block_index + 1..].iter().cloned());
            (left, right)
        };

    let left = schema.node(LIST_ITEM, Some(item.attrs().clone()), left_children)?;
    let right = schema.node(LIST_ITEM, None, right_children)?;
    tr.replace_children(list_path, item_index..item_index + 1, vec![left, right])?;
    let cursor = [child_path(list_path, item_index + 1), vec![0]].concat();
    tr.set_cursor(Position::new(cursor, 0));
    Ok(true)
}

fn split_textblock(tr: &mut Transaction, force_default: bool) -> TransformResult<bool> {
    tr.delete_selection()?;
    let head = tr.selection().head.clone();
    let schema = Rc::clone(tr.schema());
    let mut left = tr.textblock(&head.path)?.clone();
    let at_end = head.offset == left.text_len();
    let right_content = left.split_inline(head.offset);
    let right = if at_end || force_default {
        default_textblock(&schema, right_content)?
    } else {
        schema.node(left.type_name(), Some(left.attrs().clone()), right_content)?
    };

    let (parent, index) = split_path(&head.path)?;
    tr.replace_children(parent, index..index + 1, vec![left, right])?;
    tr.set_cursor(Position::new(child_path(parent, index + 1), 0));
    Ok(true)
}

fn default_textblock(schema: &Schema, content: Vec<Node>) -> TransformResult<Node> {
    let name = schema
        .default_textblock()
        .ok_or(SchemaError::MissingRequiredNode("paragraph"))?;
    Ok(schema.node(name, None, content)?)
}

fn empty_textblock(schema: &Schema) -> TransformResult<Node> {
    default_textblock(schema, Vec::new())
}

fn node_cloned(tr: &Transaction, path: &[usize]) -> TransformResult<Node> {
    tr.doc()
        .node_at(path)
        .cloned()
        .ok_or_else(|| TransformError::NoNode(path.to_vec()))
}

fn child_path(parent: &[usize], index: usize) -> Vec<usize> {
    let mut path = parent.to_vec();
    path.push(index);
    path
}

fn first_textblock(node: &Node, path: &[usize]) -> Option<Vec<usize>> {
    let relative = node.textblock_paths().into_iter().next()?;
    Some([path.to_vec(), relative].concat())
}

fn last_textblock(node: &Node, path: &[usize]) -> Option<Vec<usize>> {
    let relative = node.textblock_paths().pop()?;
    Some([path.to_vec(), relative].concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::model::attrs;
    use crate::richtext::testing::{outline, run, state_from};
    use crate::zettel::{Block, Inline, ListItem};
    use insta::assert_snapshot;
    use serde_json::json;

    fn at(state: EditorState, path: Vec<usize>, offset: usize) -> EditorState {
        let mut tr = state.tr();
        tr.set_cursor(Position::new(path, offset));
        state.apply(tr)
    }

    fn list_of(items: &[&str]) -> Block {
        Block::List {
            items: items
                .iter()
                .map(|text| ListItem::new(vec![Block::paragraph(vec![Inline::plain(*text)])]))
                .collect(),
        }
    }

    #[test]
    fn test_toggle_mark_twice_restores_runs() {
        let state = state_from(vec![Block::paragraph(vec![Inline::plain("one two")])]);
        let mut tr = state.tr();
        tr.set_selection(Selection::new(
            Position::new(vec![0], 0),
            Position::new(vec![0], 3),
        ));
        let selected = state.apply(tr);

        let bold = toggle_mark("bold", None);
        let once = run(&bold, &selected).unwrap();
        assert!(once.doc().child(0).unwrap().children()[0].has_mark("bold"));
        let twice = run(&bold, &once).unwrap();
        assert_eq!(twice.doc(), selected.doc());
    }

    #[test]
    fn test_toggle_mark_on_cursor_sets_stored_marks() {
        let state = at(
            state_from(vec![Block::paragraph(vec![Inline::plain("x")])]),
            vec![0],
            1,
        );
        let next = run(&toggle_mark("italic", None), &state).unwrap();
        let names: Vec<&str> = next
            .stored_marks()
            .unwrap()
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["italic"]);
        assert_eq!(next.doc(), state.doc());
    }

    #[test]
    fn test_insert_block_replaces_empty_paragraph() {
        let state = state_from(vec![Block::paragraph(vec![])]);
        let heading = insert_block("heading", Some(attrs([("level", json!(2))])));
        let next = run(&heading, &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r"
        doc
          heading level=2
        ");
        assert_eq!(next.selection().head, Position::new(vec![0], 0));

        let next = run(&insert_block("divider", None), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r"
        doc
          divider
          paragraph
        ");
        assert_eq!(next.selection().head, Position::new(vec![1], 0));
    }

    #[test]
    fn test_insert_block_splits_text() {
        let state = at(
            state_from(vec![Block::paragraph(vec![Inline::plain("abcd")])]),
            vec![0],
            2,
        );
        let next = run(&insert_block("divider", None), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          paragraph
            "ab"
          divider
          paragraph
            "cd"
        "#);
    }

    #[test]
    fn test_split_heading_at_end_starts_paragraph() {
        let state = at(
            state_from(vec![Block::heading(1, vec![Inline::plain("Title")])]),
            vec![0],
            5,
        );
        let next = run(&split_block(), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          heading level=1
            "Title"
          paragraph
        "#);
        assert_eq!(next.selection().head, Position::new(vec![1], 0));
    }

    #[test]
    fn test_delete_backward_removes_whole_grapheme() {
        let state = at(
            state_from(vec![Block::paragraph(vec![Inline::plain("cafe\u{301}!")])]),
            vec![0],
            6,
        );
        let next = run(&delete_backward(), &state).unwrap();
        assert_eq!(next.doc().text_content(), "caf!");
        assert_eq!(next.selection().head.offset, 3);
    }

    #[test]
    fn test_delete_backward_joins_and_removes_leaves() {
        let state = at(
            state_from(vec![
                Block::paragraph(vec![Inline::plain("ab")]),
                Block::paragraph(vec![Inline::plain("cd")]),
            ]),
            vec![1],
            0,
        );
        let joined = run(&delete_backward(), &state).unwrap();
        assert_eq!(joined.doc().child_count(), 1);
        assert_eq!(joined.doc().text_content(), "abcd");
        assert_eq!(joined.selection().head, Position::new(vec![0], 2));

        let state = at(
            state_from(vec![
                Block::Divider,
                Block::paragraph(vec![Inline::plain("cd")]),
            ]),
            vec![1],
            0,
        );
        let next = run(&delete_backward(), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          paragraph
            "cd"
        "#);

        let first = at(state_from(vec![Block::paragraph(vec![])]), vec![0], 0);
        assert!(run(&delete_backward(), &first).is_none());
    }

    #[test]
    fn test_delete_forward_joins_next() {
        let state = at(
            state_from(vec![
                Block::paragraph(vec![Inline::plain("ab")]),
                Block::heading(2, vec![Inline::plain("cd")]),
            ]),
            vec![0],
            2,
        );
        let next = run(&delete_forward(), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          paragraph
            "abcd"
        "#);
    }

    #[test]
    fn test_wrap_joins_previous_list() {
        let state = at(
            state_from(vec![list_of(&["one"]), Block::paragraph(vec![Inline::plain("two")])]),
            vec![1],
            1,
        );
        let next = run(&wrap_in_list(), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          list
            list_item
              paragraph
                "one"
            list_item
              paragraph
                "two"
        "#);
        assert_eq!(next.selection().head, Position::new(vec![0, 1, 0], 1));
    }

    #[test]
    fn test_sink_then_lift_restores_list() {
        let state = at(state_from(vec![list_of(&["one", "two"])]), vec![0, 1, 0], 2);
        assert!(run(&sink_list_item(), &at(state.clone(), vec![0, 0, 0], 0)).is_none());

        let sunk = run(&sink_list_item(), &state).unwrap();
        assert_snapshot!(outline(sunk.doc()), @r#"
        doc
          list
            list_item
              paragraph
                "one"
              list
                list_item
                  paragraph
                    "two"
        "#);
        assert_eq!(sunk.selection().head, Position::new(vec![0, 0, 1, 0, 0], 2));

        let lifted = run(&lift_list_item(), &sunk).unwrap();
        assert_eq!(lifted.doc(), state.doc());
        assert_eq!(lifted.selection().head, Position::new(vec![0, 1, 0], 2));
    }

    #[test]
    fn test_lift_out_of_top_level_list_splits_it() {
        let state = at(state_from(vec![list_of(&["a", "b", "c"])]), vec![0, 1, 0], 0);
        let next = run(&toggle_list(), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          list
            list_item
              paragraph
                "a"
          paragraph
            "b"
          list
            list_item
              paragraph
                "c"
        "#);
        assert_eq!(next.selection().head, Position::new(vec![1], 0));
    }

    #[test]
    fn test_split_list_item_and_exit_on_empty() {
        let state = at(state_from(vec![list_of(&["milk"])]), vec![0, 0, 0], 4);
        let split = run(&split_list_item(), &state).unwrap();
        assert_eq!(split.doc().child(0).unwrap().child_count(), 2);
        assert_eq!(split.selection().head, Position::new(vec![0, 1, 0], 0));

        let exited = run(&split_list_item(), &split).unwrap();
        assert_snapshot!(outline(exited.doc()), @r#"
        doc
          list
            list_item
              paragraph
                "milk"
          paragraph
        "#);
        assert_eq!(exited.selection().head, Position::new(vec![1], 0));
    }

    #[test]
    fn test_extend_list_item_adds_paragraph() {
        let state = at(state_from(vec![list_of(&["milk"])]), vec![0, 0, 0], 2);
        let next = run(&extend_list_item(), &state).unwrap();
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          list
            list_item
              paragraph
                "mi"
              paragraph
                "lk"
        "#);

        let outside = state_from(vec![Block::paragraph(vec![Inline::plain("x")])]);
        assert!(run(&extend_list_item(), &outside).is_none());
    }

    #[test]
    fn test_command_table_later_registration_wins() {
        let mut table = CommandTable::new();
        table.insert("insertDivider", CommandEntry::Plain(select_all()));
        let replaced = table.insert("insertDivider", CommandEntry::Plain(insert_block("divider", None)));
        assert!(replaced.is_some());
        assert_eq!(table.entries.len(), 1);

        let state = state_from(vec![Block::paragraph(vec![])]);
        let tr = table.run("insertDivider", &Attrs::new(), &state).unwrap();
        assert!(tr.doc_changed());
        assert!(table.run("missing", &Attrs::new(), &state).is_none());
    }
}
