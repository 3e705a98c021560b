// Mark functionalities, one per mark type. The mark types are declared in
// the order they rank in the schema; link comes last.

mod bold;
mod highlight;
mod italic;
mod link;
mod strikethrough;
mod subscript;
mod superscript;

pub use bold::Bold;
pub use highlight::Highlight;
pub use italic::Italic;
pub use link::{HrefPrompt, Link, LinkCallback};
pub use strikethrough::Strikethrough;
pub use subscript::Subscript;
pub use superscript::Superscript;

use crate::zettel;

pub const LINK: &str = "link";

/// Schema mark type for a stored mark
pub fn mark_type_name(mark: zettel::Mark) -> &'static str {
    match mark {
        zettel::Mark::Bold => "bold",
        zettel::Mark::Italic => "italic",
        zettel::Mark::Strikethrough => "strikethrough",
        zettel::Mark::Highlight => "highlight",
        zettel::Mark::Subscript => "subscript",
        zettel::Mark::Superscript => "superscript",
    }
}

/// Stored mark for a schema mark type; `None` for link and unknown types
pub fn stored_mark(name: &str) -> Option<zettel::Mark> {
    zettel::Mark::ALL
        .into_iter()
        .find(|mark| mark_type_name(*mark) == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stored_mark_maps_back() {
        for mark in zettel::Mark::ALL {
            assert_eq!(stored_mark(mark_type_name(mark)), Some(mark));
        }
        assert_eq!(stored_mark(LINK), None);
    }
}
