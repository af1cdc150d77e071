mod events;
mod position;

pub use events::EventEmitter;
pub use position::{LineIndex, Position, Span};
