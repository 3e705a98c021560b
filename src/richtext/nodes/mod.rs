// Node functionalities, one per node type.

mod divider;
mod doc;
mod heading;
mod image;
mod list;
mod paragraph;
mod text;

pub use divider::Divider;
pub use doc::Doc;
pub use heading::Heading;
pub use image::Image;
pub use list::{List, ListItem};
pub use paragraph::Paragraph;
pub use text::Text;
