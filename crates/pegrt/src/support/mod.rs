//! Small supporting data types used throughout the engine.

pub mod ordered_set;
pub mod slot;

pub use ordered_set::OrderedSet;
pub use slot::Slot;
