// Round-trip tests: stored content -> editable tree -> stored content

use commonplace::richtext::functionality::ComposedEditor;
use commonplace::richtext::parser::parse_zettel_json;
use commonplace::richtext::schema::{DomElement, DomMatch};
use commonplace::richtext::serializer::serialize_doc;
use commonplace::richtext::{EditorCallbacks, default_functionalities};
use commonplace::zettel::{Block, Inline, ListItem, Mark, ZettelContent};
use insta::assert_snapshot;
use serde_json::json;

fn editor() -> ComposedEditor {
    default_functionalities(EditorCallbacks::default(), '/')
        .build()
        .unwrap()
}

fn round_trip(content: &ZettelContent) -> ZettelContent {
    let editor = editor();
    let json = serde_json::to_string(content).unwrap();
    let doc = parse_zettel_json(editor.schema(), &json).unwrap().unwrap();
    serialize_doc(&doc).unwrap()
}

#[test]
fn test_every_block_kind_round_trips() {
    let content = vec![
        Block::heading(1, vec![Inline::plain("Reading list")]),
        Block::paragraph(vec![
            Inline::marked("Bold", vec![Mark::Bold]),
            Inline::plain(", "),
            Inline::marked("all of them", Mark::ALL.to_vec()),
            Inline::plain(" and "),
            Inline::link("a link", "https://example.com/a?b=c", vec![Mark::Italic]),
        ]),
        Block::Divider,
        Block::List {
            items: vec![
                ListItem::new(vec![Block::paragraph(vec![Inline::plain("first")])]),
                ListItem::new(vec![
                    Block::paragraph(vec![Inline::plain("second")]),
                    Block::paragraph(vec![Inline::plain("more on second")]),
                    Block::List {
                        items: vec![ListItem::new(vec![Block::paragraph(vec![])])],
                    },
                ]),
            ],
        },
        Block::Image {
            src: "/files/diagram.png".to_string(),
            alt: "diagram".to_string(),
        },
        Block::heading(6, vec![]),
    ];
    assert_eq!(round_trip(&content), content);
}

#[test]
fn test_any_block_may_sit_in_a_list_item() {
    let nested = Block::List {
        items: vec![ListItem::new(vec![Block::paragraph(vec![Inline::plain("deep")])])],
    };
    let content = vec![
        Block::List { items: vec![] },
        Block::List {
            items: vec![
                ListItem::new(vec![]),
                ListItem::new(vec![nested]),
                ListItem::new(vec![Block::heading(2, vec![Inline::plain("title")])]),
                ListItem::new(vec![
                    Block::Image {
                        src: "i.png".to_string(),
                        alt: "i".to_string(),
                    },
                    Block::Divider,
                ]),
            ],
        },
    ];
    assert_eq!(round_trip(&content), content);
}

#[test]
fn test_marks_come_back_in_canonical_order() {
    let content = vec![Block::paragraph(vec![Inline::link(
        "x",
        "/z/1",
        vec![Mark::Superscript, Mark::Bold, Mark::Bold],
    )])];
    assert_eq!(
        round_trip(&content),
        vec![Block::paragraph(vec![Inline::link(
            "x",
            "/z/1",
            vec![Mark::Bold, Mark::Superscript],
        )])]
    );
}

#[test]
fn test_stored_json_shape() {
    let json = r#"[{"type":"Paragraph","inlines":[{"type":"Link","text":"see","href":"/z/2","marks":["Highlight"]}]},{"type":"Image","src":"a.png"}]"#;
    let editor = editor();
    let doc = parse_zettel_json(editor.schema(), json).unwrap().unwrap();
    let out = serde_json::to_string(&serialize_doc(&doc).unwrap()).unwrap();
    assert_snapshot!(out, @r#"[{"type":"Paragraph","inlines":[{"type":"Link","text":"see","href":"/z/2","marks":["Highlight"]}]},{"type":"Image","src":"a.png","alt":""}]"#);
}

#[test]
fn test_html_projection() {
    let editor = editor();
    let json = r#"[{"type":"Heading","level":2,"inlines":[{"type":"Text","text":"A & B","marks":[]}]},{"type":"Paragraph","inlines":[{"type":"Link","text":"go","href":"/z/3","marks":["Bold"]}]},{"type":"Divider"}]"#;
    let doc = parse_zettel_json(editor.schema(), json).unwrap().unwrap();
    assert_snapshot!(
        editor.schema().render_html(&doc),
        @r#"<h2>A &amp; B</h2><p><strong><a href="/z/3" rel="noopener noreferrer nofollow">go</a></strong></p><hr>"#
    );
}

#[test]
fn test_markup_elements_map_to_the_editor_schema() {
    let editor = editor();
    let describe = |element: DomElement| match editor.schema().parse_dom(&element) {
        Some(DomMatch::Node { name, attrs }) => format!("node {} {}", name, json!(attrs)),
        Some(DomMatch::Mark { name, attrs }) => format!("mark {} {}", name, json!(attrs)),
        None => "none".to_string(),
    };
    let elements = vec![
        DomElement::new("p"),
        DomElement::new("H3"),
        DomElement::new("hr"),
        DomElement::new("ul"),
        DomElement::new("li"),
        DomElement::new("img").with_attr("src", "a.png"),
        DomElement::new("img"),
        DomElement::new("b"),
        DomElement::new("span").with_style("font-style", "italic"),
        DomElement::new("del"),
        DomElement::new("mark"),
        DomElement::new("sup"),
        DomElement::new("a").with_attr("href", "/z/1"),
        DomElement::new("table"),
    ];
    let lines: Vec<String> = elements.into_iter().map(describe).collect();
    assert_snapshot!(lines.join("\n"), @r#"
    node paragraph {}
    node heading {"level":3}
    node divider {}
    node list {}
    node list_item {}
    node image {"alt":"","src":"a.png"}
    none
    mark bold {}
    mark italic {}
    mark strikethrough {}
    mark highlight {}
    mark superscript {}
    mark link {"href":"/z/1"}
    none
    "#);
}
