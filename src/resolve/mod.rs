mod binding;
mod context;
mod normalize;
mod scheduler;

pub use binding::{BindingId, BindingSet, BindingStatus, SingleItemBinding};
pub use context::ReferenceContext;
pub use normalize::normalize;
pub use scheduler::{DrainStats, ResolveEngine};
