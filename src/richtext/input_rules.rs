// Input rules
// Patterns checked against the text before the cursor each time the user
// types. A rule whose pattern matches turns the typed markup into structure.

use super::model::{Attrs, Position};
use super::plugin::Plugin;
use super::state::{EditorState, Transaction, TransformResult};
use log::debug;
use regex::Regex;
use serde_json::json;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

pub type InputRuleHandler = Rc<dyn Fn(&mut Transaction, &InputMatch) -> TransformResult<bool>>;

/// A completed match of a rule's pattern. Offsets are byte offsets into the
/// textblock at `path`; `end` is the cursor, after the typed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputMatch {
    pub path: Vec<usize>,
    pub start: usize,
    pub end: usize,
    text: String,
    groups: Vec<Option<Range<usize>>>,
}

impl InputMatch {
    fn find(pattern: &Regex, path: &[usize], text_before: &str) -> Option<Self> {
        let captures = pattern.captures(text_before)?;
        let whole = captures.get(0)?;
        Some(InputMatch {
            path: path.to_vec(),
            start: whole.start(),
            end: text_before.len(),
            text: text_before.to_string(),
            groups: captures
                .iter()
                .map(|group| group.map(|g| g.range()))
                .collect(),
        })
    }

    /// Text of capture group `index`; group 0 is the whole match
    pub fn group(&self, index: usize) -> Option<&str> {
        let range = self.groups.get(index)?.clone()?;
        self.text.get(range)
    }

    pub fn group_range(&self, index: usize) -> Option<Range<usize>> {
        self.groups.get(index)?.clone()
    }

    /// A position in the matched textblock
    pub fn position(&self, offset: usize) -> Position {
        Position::new(self.path.clone(), offset)
    }
}

#[derive(Clone)]
pub struct InputRule {
    pattern: Regex,
    handler: InputRuleHandler,
}

impl InputRule {
    pub fn new<F>(pattern: Regex, handler: F) -> Self
    where
        F: Fn(&mut Transaction, &InputMatch) -> TransformResult<bool> + 'static,
    {
        InputRule {
            pattern,
            handler: Rc::new(handler),
        }
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }
}

impl fmt::Debug for InputRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputRule")
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Apply a mark to the text of capture group 2 and drop the rest of the
/// markup in group 1, e.g. `**word**` becomes bold `word`. Typing continues
/// without the mark.
pub fn mark_rule(pattern: Regex, mark: &str, get_attrs: fn(&InputMatch) -> Option<Attrs>) -> InputRule {
    let mark_name = mark.to_string();
    InputRule::new(pattern, move |tr, m| {
        let (Some(markup), Some(inner)) = (m.group_range(1), m.group_range(2)) else {
            return Ok(false);
        };
        let schema = Rc::clone(tr.schema());
        let mark = schema.mark(&mark_name, get_attrs(m))?;

        tr.delete(&m.position(inner.end), &m.position(markup.end))?;
        tr.delete(&m.position(markup.start), &m.position(inner.start))?;
        let start = m.position(markup.start);
        let end = m.position(markup.start + inner.len());
        tr.add_mark(&start, &end, mark)?;
        tr.set_cursor(end.clone());
        let marks = tr.marks_at(&end);
        tr.set_stored_marks(Some(schema.remove_mark_from_set(&marks, &mark_name)));
        Ok(true)
    })
}

/// Turn a default textblock into `node_type` when its text matches, removing
/// the matched text. Other textblock types are left alone, so the rule does
/// not fire again inside the block it created.
pub fn textblock_type_rule(
    pattern: Regex,
    node_type: &str,
    get_attrs: fn(&InputMatch) -> Option<Attrs>,
) -> InputRule {
    let node_type = node_type.to_string();
    InputRule::new(pattern, move |tr, m| {
        let schema = Rc::clone(tr.schema());
        let block = tr.textblock(&m.path)?;
        if Some(block.type_name()) != schema.default_textblock() {
            return Ok(false);
        }
        tr.delete(&m.position(m.start), &m.position(m.end))?;
        tr.set_block_type(&m.path, &node_type, get_attrs(m))?;
        tr.set_cursor(m.position(m.start));
        Ok(true)
    })
}

/// Remove the matched text and wrap the textblock with `wrap`
pub fn wrapping_rule<F>(pattern: Regex, wrap: F) -> InputRule
where
    F: Fn(&mut Transaction, &[usize]) -> TransformResult<bool> + 'static,
{
    InputRule::new(pattern, move |tr, m| {
        tr.delete(&m.position(m.start), &m.position(m.end))?;
        wrap(tr, &m.path)
    })
}

/// Runs input rules on text input events only
#[derive(Debug, Default)]
pub struct InputRulesPlugin {
    rules: Vec<InputRule>,
}

impl InputRulesPlugin {
    pub fn new(rules: Vec<InputRule>) -> Self {
        InputRulesPlugin { rules }
    }

    pub fn rules(&self) -> &[InputRule] {
        &self.rules
    }
}

impl Plugin for InputRulesPlugin {
    fn name(&self) -> &str {
        "input_rules"
    }

    fn handle_text_input(&self, state: &EditorState, text: &str) -> Option<Transaction> {
        if self.rules.is_empty() || state.head_block().is_none() {
            return None;
        }
        let mut typed = state.tr();
        if let Err(err) = typed.insert_text(text) {
            debug!("input rules skipped: {}", err);
            return None;
        }
        let cursor = typed.selection().head.clone();
        let block_text = typed.textblock(&cursor.path).ok()?.text_content();
        let before = block_text.get(..cursor.offset)?;

        for rule in &self.rules {
            let Some(m) = InputMatch::find(&rule.pattern, &cursor.path, before) else {
                continue;
            };
            let mut tr = typed.clone();
            match (rule.handler)(&mut tr, &m) {
                Ok(true) => {
                    debug!("input rule `{}` fired at {:?}", rule.pattern.as_str(), m.path);
                    tr.set_meta("inputRule", json!(rule.pattern.as_str()));
                    return Some(tr);
                }
                Ok(false) => {}
                Err(err) => debug!("input rule `{}` declined: {}", rule.pattern.as_str(), err),
            }
        }
        None
    }
}
