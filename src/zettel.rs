// Stored Zettel model
// The JSON shape shared with the network layer and storage.
// Field names and tag strings are part of the wire contract.

use serde::{Deserialize, Serialize};

/// Opaque identifier handed out by the store.
pub type ZettelId = u64;

/// The ordered block sequence persisted for one note.
pub type ZettelContent = Vec<Block>;

/// A persisted note: `{ title, content }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zettel {
    pub title: String,
    pub content: ZettelContent,
}

impl Zettel {
    pub fn new(title: impl Into<String>, content: ZettelContent) -> Self {
        Zettel {
            title: title.into(),
            content,
        }
    }

    /// Text used by search: the title followed by the content's plain text.
    pub fn index_text(&self) -> String {
        let mut out = self.title.clone();
        for block in &self.content {
            out.push('\n');
            block.append_indexed(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    Paragraph {
        inlines: Vec<Inline>,
    },
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Divider,
    List {
        items: Vec<ListItem>,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
    },
}

impl Block {
    pub fn paragraph(inlines: Vec<Inline>) -> Self {
        Block::Paragraph { inlines }
    }

    pub fn heading(level: u8, inlines: Vec<Inline>) -> Self {
        Block::Heading { level, inlines }
    }

    fn append_indexed(&self, out: &mut String) {
        match self {
            Block::Paragraph { inlines } | Block::Heading { inlines, .. } => {
                for inline in inlines {
                    out.push_str(inline.text());
                }
            }
            Block::Divider => {}
            Block::List { items } => {
                for item in items {
                    for block in &item.blocks {
                        block.append_indexed(out);
                        out.push(' ');
                    }
                }
            }
            Block::Image { alt, .. } => out.push_str(alt),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub blocks: Vec<Block>,
}

impl ListItem {
    pub fn new(blocks: Vec<Block>) -> Self {
        ListItem { blocks }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Inline {
    Text {
        text: String,
        #[serde(default)]
        marks: Vec<Mark>,
    },
    Link {
        text: String,
        href: String,
        #[serde(default)]
        marks: Vec<Mark>,
    },
}

impl Inline {
    pub fn text(&self) -> &str {
        match self {
            Inline::Text { text, .. } | Inline::Link { text, .. } => text,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            Inline::Text { marks, .. } | Inline::Link { marks, .. } => marks,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Inline::Text {
            text: text.into(),
            marks,
        }
    }

    pub fn link(text: impl Into<String>, href: impl Into<String>, marks: Vec<Mark>) -> Self {
        Inline::Link {
            text: text.into(),
            href: href.into(),
            marks,
        }
    }
}

/// Inline formatting. The declaration order is the canonical order marks are
/// written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mark {
    Bold,
    Italic,
    Strikethrough,
    Highlight,
    Subscript,
    Superscript,
}

impl Mark {
    pub const ALL: [Mark; 6] = [
        Mark::Bold,
        Mark::Italic,
        Mark::Strikethrough,
        Mark::Highlight,
        Mark::Subscript,
        Mark::Superscript,
    ];
}

/// Sorts into declaration order and drops duplicates.
pub fn canonical_marks(marks: &mut Vec<Mark>) {
    marks.sort();
    marks.dedup();
}

/// True for `[]` and for a document holding a single empty paragraph.
pub fn is_blank(content: &[Block]) -> bool {
    match content {
        [] => true,
        [Block::Paragraph { inlines }] => inlines.iter().all(|inline| inline.text().is_empty()),
        _ => false,
    }
}
