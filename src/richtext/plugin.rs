// Plugins
// Observers that see every event and state the view processes. The view asks
// plugins in order and stops at the first one that handles an event.

use super::keymap::KeyChord;
use super::model::Position;
use super::state::{EditorState, Transaction};
use std::collections::BTreeMap;

pub trait Plugin {
    fn name(&self) -> &str;

    /// Handle a key press, returning the transaction to apply
    fn handle_key_down(&self, _state: &EditorState, _chord: &KeyChord) -> Option<Transaction> {
        None
    }

    /// Handle typed text before it is inserted
    fn handle_text_input(&self, _state: &EditorState, _text: &str) -> Option<Transaction> {
        None
    }

    /// Handle a click; returning true stops the view's default behaviour
    fn handle_click(&self, _state: &EditorState, _event: &ClickEvent) -> bool {
        false
    }

    /// The view moved to `state`. `previous` is `None` for a view's first
    /// state, so anything derived from it starts fresh with each view.
    fn state_changed(&self, _previous: Option<&EditorState>, _state: &EditorState) {}

    /// Decorations for `state`. Called after every change.
    fn decorations(&self, _state: &EditorState) -> Vec<Decoration> {
        Vec::new()
    }
}

/// A click on the editing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub position: Position,
    /// Target of the link under the pointer, if any
    pub href: Option<String>,
    /// Whether the platform's primary modifier (Cmd on macOS, Ctrl elsewhere) was held
    pub mod_key: bool,
}

/// Presentation attributes attached to a node without changing the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    pub path: Vec<usize>,
    pub attrs: BTreeMap<String, String>,
}

impl Decoration {
    pub fn node(path: Vec<usize>) -> Self {
        Decoration {
            path,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}
