mod element;
mod tree;

pub use element::{Element, ElementId, ElementKind, ModelSpace};
pub use tree::ModelTree;
