// Sessions over a notes directory

use chrono::{DateTime, Utc};
use commonplace::config::EditorConfig;
use commonplace::richtext::EditorCallbacks;
use commonplace::session::ZettelSession;
use commonplace::store::{DirStore, ZettelStore, ZettelUpdate};
use commonplace::zettel::{Block, Inline, Mark, Zettel};
use std::rc::Rc;
use tempfile::TempDir;

fn at(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(1_700_000_000_000 + millis).unwrap()
}

fn config() -> EditorConfig {
    EditorConfig {
        save_debounce_ms: 500,
        ..Default::default()
    }
}

#[test]
fn test_typing_is_saved_after_debounce() {
    let dir = TempDir::new().unwrap();
    let store = Rc::new(DirStore::new(dir.path().to_path_buf()));
    let id = store.create().unwrap();

    let mut session =
        ZettelSession::open(store.clone(), id, EditorCallbacks::default(), config()).unwrap();
    session.edit(at(0), |view| view.type_text("# Plan"));
    session.edit(at(100), |view| {
        view.press("Enter").unwrap();
        view.type_text("buy **milk**");
    });
    session.set_title("Groceries", at(200));

    assert!(!session.tick(at(600)));
    assert_eq!(session.status_text(at(600)), "not saved");
    assert!(session.tick(at(700)));
    assert_eq!(session.status_text(at(800)), "saved just now");

    let stored = store.fetch(id).unwrap();
    assert_eq!(stored.title, "Groceries");
    assert_eq!(
        stored.content,
        vec![
            Block::heading(1, vec![Inline::plain("Plan")]),
            Block::paragraph(vec![
                Inline::plain("buy "),
                Inline::marked("milk", vec![Mark::Bold]),
            ]),
        ]
    );

    // Nothing new to save.
    assert!(!session.tick(at(5_000)));
    assert!(!session.flush(at(5_000)).unwrap());
}

#[test]
fn test_switching_flushes_and_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let store = Rc::new(DirStore::new(dir.path().to_path_buf()));
    let first = store.create().unwrap();
    let second = store.create().unwrap();
    assert_ne!(first, second);
    store
        .update(
            second,
            ZettelUpdate {
                title: Some("Other".to_string()),
                content: Some(vec![Block::Divider]),
            },
        )
        .unwrap();

    let mut session =
        ZettelSession::open(store.clone(), first, EditorCallbacks::default(), config()).unwrap();
    session.edit(at(0), |view| view.type_text("unsaved"));
    let session = session.switch_to(second, at(10)).unwrap();

    assert_eq!(session.id(), second);
    assert_eq!(session.title(), "Other");
    assert_eq!(session.status_text(at(20)), "");
    assert_eq!(
        store.fetch(first).unwrap().content,
        vec![Block::paragraph(vec![Inline::plain("unsaved")])]
    );
    assert_eq!(session.snapshot().unwrap(), Zettel::new("Other", vec![Block::Divider]));
}

#[test]
fn test_missing_zettel_fails_to_open() {
    let dir = TempDir::new().unwrap();
    let store = Rc::new(DirStore::new(dir.path().to_path_buf()));
    let err = ZettelSession::open(store, 42, EditorCallbacks::default(), config())
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "zettel 42 does not exist");
}
