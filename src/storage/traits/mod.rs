//! Storage backend traits.

mod graph;
mod relational;

pub use graph::GraphStore;
pub use relational::RelationalStore;
