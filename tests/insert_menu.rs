// Insert menu driven through a view, with the host callbacks recorded

use commonplace::richtext::insert_menu::{InsertMenu, InsertMenuState, default_items};
use commonplace::richtext::serializer::serialize_doc;
use commonplace::richtext::view::EditorView;
use commonplace::richtext::{EditorCallbacks, default_functionalities};
use commonplace::zettel::Block;
use std::cell::RefCell;
use std::rc::Rc;

fn recording_view(trigger: char) -> (EditorView, Rc<RefCell<Vec<String>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let opened = Rc::clone(&events);
    let closed = Rc::clone(&events);
    let callbacks = EditorCallbacks {
        on_menu_open: Some(Rc::new(move |filter: &str| {
            opened.borrow_mut().push(format!("open {:?}", filter))
        })),
        on_menu_close: Some(Rc::new(move || closed.borrow_mut().push("close".to_string()))),
        ..Default::default()
    };
    let editor = default_functionalities(callbacks, trigger).build().unwrap();
    let view = editor.view(editor.schema().empty_doc().unwrap());
    (view, events)
}

#[test]
fn test_menu_opens_filters_and_closes() {
    let (mut view, events) = recording_view('/');
    let menu = InsertMenu::default();
    assert_eq!(menu.state(view.state()), InsertMenuState::PlaceholderEmpty);
    assert!(events.borrow().is_empty());

    view.type_text("/");
    view.type_text("h");
    assert_eq!(
        menu.state(view.state()),
        InsertMenuState::FilterActive {
            filter: "h".to_string()
        }
    );
    let labels: Vec<&str> = menu
        .matching_items(view.state())
        .iter()
        .map(|item| item.label.as_str())
        .collect();
    assert_eq!(labels, vec!["Heading 1", "Heading 2", "Heading 3", "Divider"]);

    let item = menu.items()[1].clone();
    assert!(menu.select(&mut view, &item));
    assert_eq!(
        serialize_doc(view.state().doc()).unwrap(),
        vec![Block::heading(2, vec![])]
    );
    assert_eq!(menu.state(view.state()), InsertMenuState::Closed);
    assert_eq!(*events.borrow(), vec![r#"open """#, r#"open "h""#, "close"]);
}

#[test]
fn test_custom_trigger() {
    let (mut view, events) = recording_view('+');
    let menu = InsertMenu::new('+', default_items());

    view.type_text("/");
    assert_eq!(menu.state(view.state()), InsertMenuState::Closed);
    view.press("Backspace").unwrap();
    view.type_text("+div");
    let matches = menu.matching_items(view.state());
    assert_eq!(matches.len(), 1);

    let item = matches[0].clone();
    assert!(menu.select(&mut view, &item));
    assert_eq!(
        serialize_doc(view.state().doc()).unwrap(),
        vec![Block::Divider, Block::paragraph(vec![])]
    );
    assert_eq!(events.borrow().first().map(String::as_str), Some(r#"open """#));
}

#[test]
fn test_menu_stays_closed_outside_top_level_paragraphs() {
    let (mut view, events) = recording_view('/');
    let menu = InsertMenu::default();

    view.type_text("- /");
    assert_eq!(menu.state(view.state()), InsertMenuState::Closed);
    assert!(menu.matching_items(view.state()).is_empty());

    let (mut view, _) = recording_view('/');
    view.type_text("text /h");
    assert_eq!(menu.state(view.state()), InsertMenuState::Closed);

    assert!(events.borrow().is_empty());
}
