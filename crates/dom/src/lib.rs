pub mod node;
pub mod style;
pub mod walker;

pub use node::{DomNode, NodeKind};
pub use style::{has_pointer_cursor, inline_style};
pub use walker::{AncestorStep, AncestorWalker};
