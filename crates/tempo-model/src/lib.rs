//! Compiled model: a system graph bound to the typed ASTs and bytecode of
//! its location invariants and edge guards/statements.

pub mod analysis;
pub mod model;
pub mod system;

pub use analysis::find_guarded_weakly_synchronized_edge;
pub use model::{Model, ModelError};
pub use system::{EdgeId, EventId, LocId, System};
