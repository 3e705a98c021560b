// Functionalities
// A functionality bundles everything one editor feature contributes: a node or
// mark type, key bindings, input rules, commands and plugins. The registry
// folds an ordered list of them into one schema, keymap, plugin list and
// command table.

use super::commands::{CommandEntry, CommandTable, Command};
use super::input_rules::{InputRule, InputRulesPlugin};
use super::keymap::{Keymap, KeymapError, KeymapPlugin, base_keymap};
use super::model::Node;
use super::plugin::Plugin;
use super::schema::{MarkSpec, NodeSpec, Schema, SchemaError};
use super::state::EditorState;
use super::view::EditorView;
use indexmap::IndexMap;
use indexmap::map::Entry;
use log::debug;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("node type `{name}` from `{unit}` is already defined by `{first}`")]
    DuplicateNode {
        name: String,
        unit: String,
        first: String,
    },
    #[error("mark type `{name}` from `{unit}` is already defined by `{first}`")]
    DuplicateMark {
        name: String,
        unit: String,
        first: String,
    },
    #[error("invalid key `{key}` in `{unit}`")]
    InvalidKey {
        key: String,
        unit: String,
        #[source]
        source: KeymapError,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub struct NodeEntry {
    pub name: &'static str,
    pub spec: NodeSpec,
}

pub struct MarkEntry {
    pub name: &'static str,
    pub spec: MarkSpec,
}

/// One editor feature. Every capability defaults to contributing nothing.
pub trait Functionality {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    fn node(&self) -> Option<NodeEntry> {
        None
    }

    fn mark(&self) -> Option<MarkEntry> {
        None
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        Vec::new()
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        Vec::new()
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        Vec::new()
    }

    fn plugins(&self, _schema: &Rc<Schema>) -> Vec<Rc<dyn Plugin>> {
        Vec::new()
    }
}

/// An ordered list of functionalities. Order matters: plugins and key
/// bindings of earlier units see events first, while commands of later units
/// replace earlier ones of the same name.
#[derive(Default)]
pub struct Functionalities {
    units: Vec<Box<dyn Functionality>>,
}

impl Functionalities {
    pub fn new(units: Vec<Box<dyn Functionality>>) -> Self {
        Functionalities { units }
    }

    pub fn push(&mut self, unit: Box<dyn Functionality>) {
        self.units.push(unit);
    }

    pub fn units(&self) -> impl Iterator<Item = &dyn Functionality> {
        self.units.iter().map(|unit| unit.as_ref())
    }

    /// Derive the schema. Two units defining the same node or mark name is an error.
    pub fn schema(&self) -> Result<Schema, RegistryError> {
        let mut node_owners: IndexMap<&'static str, &str> = IndexMap::new();
        let mut mark_owners: IndexMap<&'static str, &str> = IndexMap::new();
        let mut nodes = Vec::new();
        let mut marks = Vec::new();

        for unit in &self.units {
            if let Some(entry) = unit.node() {
                match node_owners.entry(entry.name) {
                    Entry::Occupied(first) => {
                        return Err(RegistryError::DuplicateNode {
                            name: entry.name.to_string(),
                            unit: unit.name().to_string(),
                            first: first.get().to_string(),
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(unit.name());
                    }
                }
                nodes.push((entry.name.to_string(), entry.spec));
            }
            if let Some(entry) = unit.mark() {
                match mark_owners.entry(entry.name) {
                    Entry::Occupied(first) => {
                        return Err(RegistryError::DuplicateMark {
                            name: entry.name.to_string(),
                            unit: unit.name().to_string(),
                            first: first.get().to_string(),
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(unit.name());
                    }
                }
                marks.push((entry.name.to_string(), entry.spec));
            }
        }

        Ok(Schema::new(nodes, marks)?)
    }

    /// Every unit's bindings in list order, then the base keymap
    pub fn keymap(&self, schema: &Rc<Schema>) -> Result<Keymap, RegistryError> {
        let mut keymap = Keymap::new();
        for unit in &self.units {
            for (key, command) in unit.keys(schema) {
                keymap
                    .bind(key, command)
                    .map_err(|source| RegistryError::InvalidKey {
                        key: key.to_string(),
                        unit: unit.name().to_string(),
                        source,
                    })?;
            }
        }
        keymap.layer(base_keymap());
        Ok(keymap)
    }

    pub fn input_rules(&self, schema: &Rc<Schema>) -> Vec<InputRule> {
        self.units
            .iter()
            .flat_map(|unit| unit.input_rules(schema))
            .collect()
    }

    /// Unit plugins in list order, then the keymap, then the input rules
    pub fn plugins(&self, schema: &Rc<Schema>) -> Result<Vec<Rc<dyn Plugin>>, RegistryError> {
        let mut plugins: Vec<Rc<dyn Plugin>> = self
            .units
            .iter()
            .flat_map(|unit| unit.plugins(schema))
            .collect();
        plugins.push(Rc::new(KeymapPlugin::new(self.keymap(schema)?)));
        plugins.push(Rc::new(InputRulesPlugin::new(self.input_rules(schema))));
        Ok(plugins)
    }

    /// Merge all commands; on a name collision the later unit wins
    pub fn commands(&self, schema: &Rc<Schema>) -> CommandTable {
        let mut table = CommandTable::new();
        for unit in &self.units {
            for (name, entry) in unit.commands(schema) {
                if table.insert(name, entry).is_some() {
                    debug!("command `{}` from `{}` replaces an earlier one", name, unit.name());
                }
            }
        }
        table
    }

    pub fn build(&self) -> Result<ComposedEditor, RegistryError> {
        let schema = Rc::new(self.schema()?);
        let plugins = self.plugins(&schema)?;
        let commands = self.commands(&schema);
        Ok(ComposedEditor {
            schema,
            plugins,
            commands,
        })
    }
}

/// Everything derived from a list of functionalities, ready for one session
#[derive(Clone)]
pub struct ComposedEditor {
    schema: Rc<Schema>,
    plugins: Vec<Rc<dyn Plugin>>,
    commands: CommandTable,
}

impl ComposedEditor {
    pub fn schema(&self) -> &Rc<Schema> {
        &self.schema
    }

    pub fn plugins(&self) -> &[Rc<dyn Plugin>] {
        &self.plugins
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn state(&self, doc: Node) -> EditorState {
        EditorState::create(Rc::clone(&self.schema), doc)
    }

    /// A view over `doc` driven by this editor's plugins and commands
    pub fn view(&self, doc: Node) -> EditorView {
        EditorView::new(self.state(doc), self.plugins.clone(), self.commands.clone())
    }
}

impl fmt::Debug for ComposedEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugins: Vec<&str> = self.plugins.iter().map(|p| p.name()).collect();
        f.debug_struct("ComposedEditor")
            .field("schema", &self.schema)
            .field("plugins", &plugins)
            .field("commands", &self.commands)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::marks::Bold;
    use crate::richtext::nodes::{Doc, Paragraph, Text};

    struct Named(&'static str);

    impl Functionality for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn node(&self) -> Option<NodeEntry> {
            Some(NodeEntry {
                name: "paragraph",
                spec: NodeSpec::default(),
            })
        }
    }

    #[test]
    fn test_duplicate_node_names_the_units() {
        let units = Functionalities::new(vec![
            Box::new(Doc),
            Box::new(Text),
            Box::new(Paragraph),
            Box::new(Named("custom_paragraph")),
        ]);
        let err = units.schema().unwrap_err();
        assert_eq!(
            err.to_string(),
            "node type `paragraph` from `custom_paragraph` is already defined by `paragraph`"
        );
    }

    struct Strong;

    impl Functionality for Strong {
        fn name(&self) -> &str {
            "strong"
        }

        fn mark(&self) -> Option<MarkEntry> {
            Some(MarkEntry {
                name: "bold",
                spec: MarkSpec::default(),
            })
        }
    }

    #[test]
    fn test_duplicate_mark_names_the_units() {
        let units = Functionalities::new(vec![
            Box::new(Doc),
            Box::new(Text),
            Box::new(Paragraph),
            Box::new(Bold),
            Box::new(Strong),
        ]);
        let err = units.schema().unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateMark { .. }));
        assert_eq!(
            err.to_string(),
            "mark type `bold` from `strong` is already defined by `bold`"
        );
    }

    #[test]
    fn test_plugin_order() {
        let editor = crate::richtext::testing::editor();
        let names: Vec<&str> = editor.plugins().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["link_click", "insert_menu", "keymap", "input_rules"]);
    }
}
