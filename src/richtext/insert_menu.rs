// Insert menu
// A command palette opened by typing the trigger character at the start of an
// empty top-level paragraph. Its state is derived from the selection and the
// document alone, so it is recomputed after every change.

use super::functionality::Functionality;
use super::model::{Attrs, Position, Selection, attrs};
use super::plugin::{Decoration, Plugin};
use super::schema::Schema;
use super::state::EditorState;
use super::view::EditorView;
use log::{debug, warn};
use serde_json::json;
use std::rc::Rc;

pub const DEFAULT_TRIGGER: char = '/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertMenuState {
    Closed,
    /// The cursor is in an empty top-level paragraph
    PlaceholderEmpty,
    /// The paragraph starts with the trigger; `filter` is the text after it
    FilterActive { filter: String },
}

impl InsertMenuState {
    pub fn is_open(&self) -> bool {
        matches!(self, InsertMenuState::FilterActive { .. })
    }
}

/// Menu state for `state`, first matching rule wins:
/// not in a single top-level paragraph, closed; empty paragraph, placeholder;
/// text starting with the trigger, filtering by the rest; anything else, closed.
pub fn insert_menu_state(state: &EditorState, trigger: char) -> InsertMenuState {
    let selection = state.selection();
    if !selection.is_within_block() || selection.head.depth() != 1 {
        return InsertMenuState::Closed;
    }
    let Some(block) = state.doc().node_at(&selection.head.path) else {
        return InsertMenuState::Closed;
    };
    if Some(block.type_name()) != state.schema().default_textblock() {
        return InsertMenuState::Closed;
    }
    let text = block.text_content();
    if text.is_empty() {
        return InsertMenuState::PlaceholderEmpty;
    }
    match text.strip_prefix(trigger) {
        Some(filter) => InsertMenuState::FilterActive {
            filter: filter.to_string(),
        },
        None => InsertMenuState::Closed,
    }
}

pub type MenuOpenCallback = Rc<dyn Fn(&str)>;
pub type MenuCloseCallback = Rc<dyn Fn()>;

/// Registers the insert menu plugin, which draws the placeholders and tells
/// the host when the menu opens, changes filter or closes.
pub struct InsertMenuOpener {
    trigger: char,
    on_open: Option<MenuOpenCallback>,
    on_close: Option<MenuCloseCallback>,
}

impl InsertMenuOpener {
    pub fn new(
        trigger: char,
        on_open: Option<MenuOpenCallback>,
        on_close: Option<MenuCloseCallback>,
    ) -> Self {
        InsertMenuOpener {
            trigger,
            on_open,
            on_close,
        }
    }
}

impl Functionality for InsertMenuOpener {
    fn name(&self) -> &str {
        "insert_menu"
    }

    fn plugins(&self, _schema: &Rc<Schema>) -> Vec<Rc<dyn Plugin>> {
        vec![Rc::new(InsertMenuPlugin {
            trigger: self.trigger,
            on_open: self.on_open.clone(),
            on_close: self.on_close.clone(),
        })]
    }
}

struct InsertMenuPlugin {
    trigger: char,
    on_open: Option<MenuOpenCallback>,
    on_close: Option<MenuCloseCallback>,
}

impl InsertMenuPlugin {
    fn notify(&self, previous: &InsertMenuState, next: &InsertMenuState) {
        if previous == next {
            return;
        }
        match next {
            InsertMenuState::FilterActive { filter } => {
                debug!("insert menu filter {:?}", filter);
                if let Some(on_open) = &self.on_open {
                    on_open(filter);
                }
            }
            _ if previous.is_open() => {
                debug!("insert menu closed");
                if let Some(on_close) = &self.on_close {
                    on_close();
                }
            }
            _ => {}
        }
    }
}

impl Plugin for InsertMenuPlugin {
    fn name(&self) -> &str {
        "insert_menu"
    }

    fn state_changed(&self, previous: Option<&EditorState>, state: &EditorState) {
        let before = previous
            .map(|previous| insert_menu_state(previous, self.trigger))
            .unwrap_or(InsertMenuState::Closed);
        self.notify(&before, &insert_menu_state(state, self.trigger));
    }

    fn decorations(&self, state: &EditorState) -> Vec<Decoration> {
        let menu = insert_menu_state(state, self.trigger);

        let path = state.selection().head.path.clone();
        match &menu {
            InsertMenuState::PlaceholderEmpty => vec![
                Decoration::node(path)
                    .with_attr("class", "placeholder")
                    .with_attr("data-text", format!("Type '{}' for commands...", self.trigger)),
            ],
            InsertMenuState::FilterActive { filter } if filter.is_empty() => vec![
                Decoration::node(path)
                    .with_attr("class", "placeholder add-padding-for-slash")
                    .with_attr("data-text", "Keep typing to filter..."),
            ],
            _ => Vec::new(),
        }
    }
}

/// One entry of the menu: a command from the editor's command table, with
/// the arguments to build it from.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertMenuItem {
    pub label: String,
    pub command: String,
    pub args: Attrs,
    pub keywords: Vec<String>,
}

impl InsertMenuItem {
    pub fn new(label: &str, command: &str) -> Self {
        InsertMenuItem {
            label: label.to_string(),
            command: command.to_string(),
            args: Attrs::new(),
            keywords: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Attrs) -> Self {
        self.args = args;
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Case-insensitive match of `filter` against the label and keywords
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim().to_lowercase();
        filter.is_empty()
            || self.label.to_lowercase().contains(&filter)
            || self.keywords.iter().any(|k| k.to_lowercase().contains(&filter))
    }
}

pub fn default_items() -> Vec<InsertMenuItem> {
    let heading = |level: u64| {
        InsertMenuItem::new(&format!("Heading {}", level), "insertHeader")
            .with_args(attrs([("level", json!(level))]))
            .with_keywords(&[format!("h{}", level).as_str(), "title", "header"])
    };
    vec![
        heading(1),
        heading(2),
        heading(3),
        InsertMenuItem::new("Divider", "insertDivider").with_keywords(&["hr", "line", "rule"]),
        InsertMenuItem::new("Bullet list", "toggleList").with_keywords(&["ul", "list", "bullet"]),
    ]
}

/// The menu controller the host drives while the menu is shown
#[derive(Debug, Clone)]
pub struct InsertMenu {
    trigger: char,
    items: Vec<InsertMenuItem>,
}

impl Default for InsertMenu {
    fn default() -> Self {
        InsertMenu::new(DEFAULT_TRIGGER, default_items())
    }
}

impl InsertMenu {
    pub fn new(trigger: char, items: Vec<InsertMenuItem>) -> Self {
        InsertMenu { trigger, items }
    }

    pub fn trigger(&self) -> char {
        self.trigger
    }

    pub fn items(&self) -> &[InsertMenuItem] {
        &self.items
    }

    pub fn state(&self, state: &EditorState) -> InsertMenuState {
        insert_menu_state(state, self.trigger)
    }

    /// Items matching the current filter; none while the menu is closed
    pub fn matching_items(&self, state: &EditorState) -> Vec<&InsertMenuItem> {
        match self.state(state) {
            InsertMenuState::FilterActive { filter } => {
                self.items.iter().filter(|item| item.matches(&filter)).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Remove the typed trigger and filter, then run the item's command on
    /// the cleared paragraph. The view changes once, and only if the command
    /// applies. An item naming no known command just closes the menu.
    /// Returns whether the command applied.
    pub fn select(&self, view: &mut EditorView, item: &InsertMenuItem) -> bool {
        let head = view.state().selection().head.clone();
        let start = Position::new(head.path.clone(), 0);
        let mut tr = view.state().tr();
        if let Err(err) = tr.delete(&start, &head) {
            debug!("insert menu could not clear the trigger: {}", err);
            return false;
        }
        tr.set_selection(Selection::cursor(start));

        let Some(command) = view.commands().resolve(&item.command, &item.args) else {
            warn!("insert menu item `{}` names unknown command `{}`", item.label, item.command);
            view.dispatch(tr);
            return false;
        };
        let cleared = view.state().apply(tr);
        match command(&cleared) {
            Some(next) => {
                view.update_state(cleared.apply(next));
                true
            }
            None => {
                debug!("insert menu command `{}` did not apply", item.command);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::functionality::ComposedEditor;
    use crate::richtext::testing::{editor, outline, state_from};
    use crate::richtext::{EditorCallbacks, default_functionalities};
    use crate::zettel::{Block, Inline, ListItem};
    use insta::assert_snapshot;
    use std::cell::RefCell;

    fn typed(text: &str) -> EditorView {
        let editor = editor();
        let mut view = editor.view(editor.schema().empty_doc().unwrap());
        view.type_text(text);
        view
    }

    #[test]
    fn test_states_follow_typing() {
        let menu = InsertMenu::default();
        assert_eq!(menu.state(typed("").state()), InsertMenuState::PlaceholderEmpty);
        assert_eq!(
            menu.state(typed("/").state()),
            InsertMenuState::FilterActive {
                filter: String::new()
            }
        );
        assert_eq!(
            menu.state(typed("/head").state()),
            InsertMenuState::FilterActive {
                filter: "head".to_string()
            }
        );
        assert_eq!(menu.state(typed("a/").state()), InsertMenuState::Closed);
    }

    #[test]
    fn test_closed_inside_list_and_heading() {
        let menu = InsertMenu::default();
        let list = state_from(vec![Block::List {
            items: vec![ListItem::new(vec![Block::paragraph(vec![Inline::plain("/")])])],
        }]);
        assert_eq!(menu.state(&list), InsertMenuState::Closed);

        let heading = state_from(vec![Block::heading(1, vec![Inline::plain("/")])]);
        assert_eq!(menu.state(&heading), InsertMenuState::Closed);
    }

    #[test]
    fn test_placeholder_decorations() {
        let view = typed("");
        let decoration = &view.decorations()[0];
        assert_eq!(decoration.attr("class"), Some("placeholder"));
        assert_eq!(decoration.attr("data-text"), Some("Type '/' for commands..."));

        let view = typed("/");
        assert_eq!(
            view.decorations()[0].attr("data-text"),
            Some("Keep typing to filter...")
        );
        assert!(typed("/h").decorations().is_empty());
    }

    #[test]
    fn test_filter_narrows_items() {
        let menu = InsertMenu::default();
        let view = typed("/LI");
        let labels: Vec<&str> = menu
            .matching_items(view.state())
            .iter()
            .map(|item| item.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Divider", "Bullet list"]);
        assert!(menu.matching_items(typed("x").state()).is_empty());
    }

    #[test]
    fn test_select_clears_trigger_and_runs_command() {
        let menu = InsertMenu::default();
        let mut view = typed("/h2");
        let item = menu.items()[1].clone();
        assert!(menu.select(&mut view, &item));
        assert_snapshot!(outline(view.state().doc()), @r"
        doc
          heading level=2
        ");
        assert_eq!(menu.state(view.state()), InsertMenuState::Closed);
    }

    fn recording(log: &Rc<RefCell<Vec<String>>>) -> ComposedEditor {
        let opened = Rc::clone(log);
        let closed = Rc::clone(log);
        let callbacks = EditorCallbacks {
            on_menu_open: Some(Rc::new(move |filter: &str| {
                opened.borrow_mut().push(format!("open {:?}", filter))
            })),
            on_menu_close: Some(Rc::new(move || closed.borrow_mut().push("close".to_string()))),
            ..Default::default()
        };
        default_functionalities(callbacks, DEFAULT_TRIGGER).build().unwrap()
    }

    #[test]
    fn test_select_unknown_command_closes_menu() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let editor = recording(&log);
        let mut view = editor.view(editor.schema().empty_doc().unwrap());
        view.type_text("/x");
        let menu = InsertMenu::default();
        assert!(!menu.select(&mut view, &InsertMenuItem::new("Table", "insertTable")));
        assert_snapshot!(outline(view.state().doc()), @r"
        doc
          paragraph
        ");
        assert_eq!(menu.state(view.state()), InsertMenuState::PlaceholderEmpty);
        assert_eq!(log.borrow().last().map(String::as_str), Some("close"));
    }

    #[test]
    fn test_declined_command_leaves_the_filter() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let editor = recording(&log);
        let mut view = editor.view(editor.schema().empty_doc().unwrap());
        view.type_text("/ind");
        let before = view.state().doc().clone();
        let events = log.borrow().len();

        let menu = InsertMenu::default();
        assert!(!menu.select(&mut view, &InsertMenuItem::new("Indent", "indentListItem")));
        assert_eq!(view.state().doc(), &before);
        assert_eq!(
            menu.state(view.state()),
            InsertMenuState::FilterActive {
                filter: "ind".to_string()
            }
        );
        assert_eq!(log.borrow().len(), events);
    }

    #[test]
    fn test_each_view_tracks_its_own_menu() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let editor = recording(&log);
        let mut first = editor.view(editor.schema().empty_doc().unwrap());
        first.type_text("/");
        assert_eq!(*log.borrow(), vec![r#"open """#.to_string()]);

        let mut second = editor.view(editor.schema().empty_doc().unwrap());
        second.type_text("a");
        assert_eq!(log.borrow().len(), 1);

        first.type_text("d");
        assert_eq!(log.borrow().last().map(String::as_str), Some(r#"open "d""#));
    }
}
