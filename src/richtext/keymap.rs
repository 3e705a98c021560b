// Keymap
// Key chords bound to command chains. Every binding for a chord is kept; the
// first one registered runs first and the next is tried when it declines.

use super::commands::{Command, delete_backward, delete_forward, select_all, split_block};
use super::plugin::Plugin;
use super::state::{EditorState, Transaction};
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("key chord `{0}` has no key")]
    MissingKey(String),
    #[error("unknown modifier `{modifier}` in key chord `{chord}`")]
    UnknownModifier { chord: String, modifier: String },
}

/// A key with its modifiers, e.g. `Mod-Shift-=`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: String,
}

impl KeyChord {
    /// Parse a chord for the current platform. `Mod` is Cmd on macOS and
    /// Ctrl elsewhere.
    pub fn parse(chord: &str) -> Result<Self, KeymapError> {
        Self::parse_for(chord, cfg!(target_os = "macos"))
    }

    pub fn parse_for(chord: &str, mac: bool) -> Result<Self, KeymapError> {
        let (modifiers, key) = if chord == "-" {
            ("", "-")
        } else if let Some(prefix) = chord.strip_suffix("--") {
            (prefix, "-")
        } else {
            match chord.rsplit_once('-') {
                Some((modifiers, key)) => (modifiers, key),
                None => ("", chord),
            }
        };
        if key.is_empty() {
            return Err(KeymapError::MissingKey(chord.to_string()));
        }

        let mut parsed = KeyChord {
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
            key: normalize_key(key),
        };
        for modifier in modifiers.split('-').filter(|m| !m.is_empty()) {
            match modifier {
                "Mod" if mac => parsed.meta = true,
                "Mod" => parsed.ctrl = true,
                "Ctrl" | "Control" | "c" => parsed.ctrl = true,
                "Alt" | "a" => parsed.alt = true,
                "Shift" | "s" => parsed.shift = true,
                "Meta" | "Cmd" | "m" => parsed.meta = true,
                other => {
                    return Err(KeymapError::UnknownModifier {
                        chord: chord.to_string(),
                        modifier: other.to_string(),
                    });
                }
            }
        }
        Ok(parsed)
    }
}

fn normalize_key(key: &str) -> String {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_lowercase().collect(),
        _ => key.to_string(),
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl-")?;
        }
        if self.alt {
            f.write_str("Alt-")?;
        }
        if self.shift {
            f.write_str("Shift-")?;
        }
        if self.meta {
            f.write_str("Meta-")?;
        }
        f.write_str(&self.key)
    }
}

#[derive(Clone, Default)]
pub struct Keymap {
    bindings: IndexMap<KeyChord, Vec<Command>>,
}

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `command` to `chord`, after any commands already bound to it
    pub fn bind(&mut self, chord: &str, command: Command) -> Result<(), KeymapError> {
        let chord = KeyChord::parse(chord)?;
        self.bind_chord(chord, command);
        Ok(())
    }

    pub fn bind_chord(&mut self, chord: KeyChord, command: Command) {
        self.bindings.entry(chord).or_default().push(command);
    }

    /// Append every binding of `other` after the existing ones
    pub fn layer(&mut self, other: Keymap) {
        for (chord, commands) in other.bindings {
            self.bindings.entry(chord).or_default().extend(commands);
        }
    }

    /// Run the chain bound to `chord`, returning the first transaction produced
    pub fn handle(&self, chord: &KeyChord, state: &EditorState) -> Option<Transaction> {
        self.bindings
            .get(chord)?
            .iter()
            .find_map(|command| command(state))
    }

    pub fn commands(&self, chord: &KeyChord) -> &[Command] {
        self.bindings.get(chord).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn chords(&self) -> impl Iterator<Item = &KeyChord> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Debug for Keymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.bindings.iter().map(|(chord, commands)| (chord.to_string(), commands.len())))
            .finish()
    }
}

/// Bindings every editor has, consulted after all functionality keys
pub fn base_keymap() -> Keymap {
    let mut keymap = Keymap::new();
    let bindings: [(&str, Command); 4] = [
        ("Enter", split_block()),
        ("Backspace", delete_backward()),
        ("Delete", delete_forward()),
        ("Mod-a", select_all()),
    ];
    for (key, command) in bindings {
        if let Ok(chord) = KeyChord::parse(key) {
            keymap.bind_chord(chord, command);
        }
    }
    keymap
}

#[derive(Debug)]
pub struct KeymapPlugin {
    keymap: Keymap,
}

impl KeymapPlugin {
    pub fn new(keymap: Keymap) -> Self {
        KeymapPlugin { keymap }
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }
}

impl Plugin for KeymapPlugin {
    fn name(&self) -> &str {
        "keymap"
    }

    fn handle_key_down(&self, state: &EditorState, chord: &KeyChord) -> Option<Transaction> {
        self.keymap.handle(chord, state)
    }
}
