use super::LINK;
use crate::richtext::commands::{Command, CommandEntry, toggle_mark};
use crate::richtext::functionality::{Functionality, MarkEntry};
use crate::richtext::input_rules::{InputRule, mark_rule};
use crate::richtext::model::{Attrs, attrs};
use crate::richtext::plugin::{ClickEvent, Plugin};
use crate::richtext::schema::{AttrSpec, DomElement, DomOutput, MarkSpec, ParseRule, Schema};
use crate::richtext::state::{EditorState, range_has_mark};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Value, json};
use std::rc::Rc;

// `![alt](src)` is an image, hence the `!` exclusion.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^!])(\[([^\]]+)]\((\S+)\))$").expect("valid link regex")
});

/// Called with the target of a followed link
pub type LinkCallback = Rc<dyn Fn(&str)>;
/// Asks the user for a link target; `None` cancels
pub type HrefPrompt = Rc<dyn Fn() -> Option<String>>;

/// Hyperlinks. The mark is not inclusive, so typing at the end of a link
/// produces plain text.
#[derive(Clone, Default)]
pub struct Link {
    on_click: Option<LinkCallback>,
    request_href: Option<HrefPrompt>,
}

impl Link {
    pub fn new(on_click: Option<LinkCallback>, request_href: Option<HrefPrompt>) -> Self {
        Link {
            on_click,
            request_href,
        }
    }
}

impl Functionality for Link {
    fn name(&self) -> &str {
        LINK
    }

    fn mark(&self) -> Option<MarkEntry> {
        Some(MarkEntry {
            name: LINK,
            spec: MarkSpec {
                attrs: vec![AttrSpec::with_default("href", json!(""))],
                inclusive: false,
                to_dom: Some(|mark| {
                    DomOutput::wrap("a")
                        .with_attr("href", mark.attr("href").and_then(Value::as_str).unwrap_or_default())
                        .with_attr("rel", "noopener noreferrer nofollow")
                }),
                parse_dom: vec![ParseRule::tag("a").with_get_attrs(link_attrs)],
                ..Default::default()
            },
        })
    }

    fn keys(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, Command)> {
        let request_href = self.request_href.clone();
        let toggle: Command = Rc::new(move |state: &EditorState| {
            let selection = state.selection();
            if selection.is_empty() {
                return None;
            }
            if range_has_mark(state.doc(), selection.from(), selection.to(), LINK) {
                return toggle_mark(LINK, None)(state);
            }
            let prompt = request_href.as_ref()?;
            let href = prompt()?;
            toggle_mark(LINK, Some(attrs([("href", json!(href))])))(state)
        });
        vec![("Mod-[", toggle)]
    }

    fn input_rules(&self, _schema: &Rc<Schema>) -> Vec<InputRule> {
        vec![mark_rule(LINK_RE.clone(), LINK, |m| {
            Some(attrs([("href", json!(m.group(3)?))]))
        })]
    }

    fn commands(&self, _schema: &Rc<Schema>) -> Vec<(&'static str, CommandEntry)> {
        vec![(
            "toggleLink",
            CommandEntry::constructor(|args| toggle_mark(LINK, Some(href_attrs(args)))),
        )]
    }

    fn plugins(&self, _schema: &Rc<Schema>) -> Vec<Rc<dyn Plugin>> {
        vec![Rc::new(LinkClickPlugin {
            on_click: self.on_click.clone(),
        })]
    }
}

fn href_attrs(args: &Attrs) -> Attrs {
    let href = args.get("href").and_then(Value::as_str).unwrap_or_default();
    attrs([("href", json!(href))])
}

fn link_attrs(element: &DomElement) -> Option<Attrs> {
    let href = element.attrs.get("href")?;
    Some(attrs([("href", json!(href))]))
}

/// Follows a link when it is clicked with the primary modifier held
struct LinkClickPlugin {
    on_click: Option<LinkCallback>,
}

impl Plugin for LinkClickPlugin {
    fn name(&self) -> &str {
        "link_click"
    }

    fn handle_click(&self, _state: &EditorState, event: &ClickEvent) -> bool {
        let (Some(href), Some(on_click)) = (&event.href, &self.on_click) else {
            return false;
        };
        if !event.mod_key {
            return false;
        }
        debug!("following link to {}", href);
        on_click(href);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::model::{Position, Selection};
    use crate::richtext::testing::{outline, schema, state_from};
    use crate::zettel::{Block, Inline};
    use insta::assert_snapshot;
    use std::cell::RefCell;

    fn selected(text: &str, from: usize, to: usize) -> EditorState {
        let state = state_from(vec![Block::paragraph(vec![Inline::plain(text)])]);
        let mut tr = state.tr();
        tr.set_selection(Selection::new(
            Position::new(vec![0], from),
            Position::new(vec![0], to),
        ));
        state.apply(tr)
    }

    fn mod_bracket(link: &Link) -> Command {
        let mut keys = link.keys(&schema());
        keys.remove(0).1
    }

    #[test]
    fn test_key_prompts_for_href() {
        let prompt: HrefPrompt = Rc::new(|| Some("https://example.com".to_string()));
        let link = Link::new(None, Some(prompt));
        let state = selected("see docs", 4, 8);
        let next = state.apply(mod_bracket(&link)(&state).unwrap());
        assert_snapshot!(outline(next.doc()), @r#"
        doc
          paragraph
            "see "
            "docs" [link(href="https://example.com")]
        "#);

        // Toggling again removes the link without asking.
        let link = Link::new(None, None);
        let mut tr = next.tr();
        tr.set_selection(Selection::new(
            Position::new(vec![0], 4),
            Position::new(vec![0], 8),
        ));
        let next = next.apply(tr);
        let removed = next.apply(mod_bracket(&link)(&next).unwrap());
        assert_eq!(removed.doc().text_content(), "see docs");
        assert!(!removed.doc().child(0).unwrap().children()[0].has_mark(LINK));
    }

    #[test]
    fn test_key_declines_without_selection_or_href() {
        let cancel: HrefPrompt = Rc::new(|| None);
        let link = Link::new(None, Some(cancel));
        assert!(mod_bracket(&link)(&selected("docs", 2, 2)).is_none());
        assert!(mod_bracket(&link)(&selected("docs", 0, 4)).is_none());
    }

    #[test]
    fn test_click_follows_only_with_modifier() {
        let followed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&followed);
        let link = Link::new(Some(Rc::new(move |href: &str| sink.borrow_mut().push(href.to_string()))), None);
        let plugin = link.plugins(&schema()).remove(0);
        let state = state_from(vec![Block::paragraph(vec![])]);

        let mut event = ClickEvent {
            position: Position::new(vec![0], 0),
            href: Some("/z/7".to_string()),
            mod_key: false,
        };
        assert!(!plugin.handle_click(&state, &event));
        event.mod_key = true;
        assert!(plugin.handle_click(&state, &event));
        event.href = None;
        assert!(!plugin.handle_click(&state, &event));
        assert_eq!(*followed.borrow(), vec!["/z/7".to_string()]);
    }
}
