// Headless editor view
// Owns the current state and routes input events through the plugin list.
// Decorations are recomputed after every state change.

use super::commands::{Command, CommandTable};
use super::keymap::{KeyChord, KeymapError};
use super::model::{Attrs, Position, Selection};
use super::plugin::{ClickEvent, Decoration, Plugin};
use super::state::{EditorState, Transaction};
use log::debug;
use serde_json::Value;
use std::rc::Rc;

pub struct EditorView {
    state: EditorState,
    plugins: Vec<Rc<dyn Plugin>>,
    commands: CommandTable,
    decorations: Vec<Decoration>,
}

impl EditorView {
    pub fn new(state: EditorState, plugins: Vec<Rc<dyn Plugin>>, commands: CommandTable) -> Self {
        let mut view = EditorView {
            state,
            plugins,
            commands,
            decorations: Vec::new(),
        };
        for plugin in &view.plugins {
            plugin.state_changed(None, &view.state);
        }
        view.update_decorations();
        view
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Apply a transaction and refresh decorations
    pub fn dispatch(&mut self, tr: Transaction) {
        let next = self.state.apply(tr);
        self.update_state(next);
    }

    /// Replace the current state, letting plugins see the change
    pub fn update_state(&mut self, state: EditorState) {
        let previous = std::mem::replace(&mut self.state, state);
        for plugin in &self.plugins {
            plugin.state_changed(Some(&previous), &self.state);
        }
        self.update_decorations();
    }

    pub fn set_selection(&mut self, selection: Selection) {
        let mut tr = self.state.tr();
        tr.set_selection(selection);
        self.dispatch(tr);
    }

    pub fn set_cursor(&mut self, pos: Position) {
        self.set_selection(Selection::cursor(pos));
    }

    /// Type `text` one character at a time
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.text_input(ch.encode_utf8(&mut [0; 4]));
        }
    }

    /// Deliver one text input event. Plugins may take it over; otherwise the
    /// text replaces the selection.
    pub fn text_input(&mut self, text: &str) {
        for plugin in &self.plugins {
            if let Some(tr) = plugin.handle_text_input(&self.state, text) {
                self.dispatch(tr);
                return;
            }
        }
        let mut tr = self.state.tr();
        match tr.insert_text(text) {
            Ok(_) => self.dispatch(tr),
            Err(err) => debug!("text input dropped: {}", err),
        }
    }

    /// Deliver a key press. Returns whether any plugin handled it.
    pub fn key_down(&mut self, chord: &KeyChord) -> bool {
        for plugin in &self.plugins {
            if let Some(tr) = plugin.handle_key_down(&self.state, chord) {
                self.dispatch(tr);
                return true;
            }
        }
        false
    }

    /// Parse `key` (e.g. `"Mod-b"`) and deliver it
    pub fn press(&mut self, key: &str) -> Result<bool, KeymapError> {
        let chord = KeyChord::parse(key)?;
        Ok(self.key_down(&chord))
    }

    /// Deliver a click at `position`. Returns whether a plugin handled it.
    pub fn click(&mut self, position: Position, mod_key: bool) -> bool {
        let event = ClickEvent {
            href: self.link_at(&position),
            position,
            mod_key,
        };
        let state = self.state.clone();
        self.plugins
            .iter()
            .any(|plugin| plugin.handle_click(&state, &event))
    }

    /// Run a command against the current state
    pub fn run(&mut self, command: &Command) -> bool {
        match command(&self.state) {
            Some(tr) => {
                self.dispatch(tr);
                true
            }
            None => false,
        }
    }

    /// Run a command from the table by name
    pub fn run_named(&mut self, name: &str, args: &Attrs) -> bool {
        match self.commands.resolve(name, args) {
            Some(command) => self.run(&command),
            None => false,
        }
    }

    fn link_at(&self, position: &Position) -> Option<String> {
        let block = self.state.doc().node_at(&position.path)?;
        let (before, after) = block.inline_around(position.offset);
        after
            .or(before)?
            .marks()
            .iter()
            .find(|mark| mark.name() == "link")?
            .attr("href")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn update_decorations(&mut self) {
        let state = &self.state;
        self.decorations = self
            .plugins
            .iter()
            .flat_map(|plugin| plugin.decorations(state))
            .collect();
    }
}
