// Rich-text editing core
// A schema-driven document tree, editing state and commands, and the
// functionality units that make up the note editor.

pub mod commands;
pub mod functionality;
pub mod input_rules;
pub mod insert_menu;
pub mod keymap;
pub mod marks;
pub mod model;
pub mod nodes;
pub mod parser;
pub mod plugin;
pub mod schema;
pub mod serializer;
pub mod state;
pub mod view;

use functionality::Functionalities;
use insert_menu::{InsertMenuOpener, MenuCloseCallback, MenuOpenCallback};
use marks::{
    Bold, Highlight, HrefPrompt, Italic, Link, LinkCallback, Strikethrough, Subscript, Superscript,
};
use nodes::{Divider, Doc, Heading, Image, List, ListItem, Paragraph, Text};

/// Session-scoped hooks handed to the functionalities that need them
#[derive(Clone, Default)]
pub struct EditorCallbacks {
    /// A link was followed
    pub on_click_link: Option<LinkCallback>,
    /// Ask for a link target when `Mod-[` adds a link
    pub request_href: Option<HrefPrompt>,
    /// The insert menu opened or its filter changed
    pub on_menu_open: Option<MenuOpenCallback>,
    pub on_menu_close: Option<MenuCloseCallback>,
}

/// The note editor's functionalities, in the order they are composed.
/// Node and mark types rank in this order too.
pub fn default_functionalities(callbacks: EditorCallbacks, trigger: char) -> Functionalities {
    Functionalities::new(vec![
        Box::new(Doc),
        Box::new(Text),
        Box::new(Paragraph),
        Box::new(Heading),
        Box::new(Divider),
        Box::new(List),
        Box::new(ListItem),
        Box::new(Image),
        Box::new(Bold),
        Box::new(Italic),
        Box::new(Strikethrough),
        Box::new(Highlight),
        Box::new(Subscript),
        Box::new(Superscript),
        Box::new(Link::new(callbacks.on_click_link, callbacks.request_href)),
        Box::new(InsertMenuOpener::new(
            trigger,
            callbacks.on_menu_open,
            callbacks.on_menu_close,
        )),
    ])
}
