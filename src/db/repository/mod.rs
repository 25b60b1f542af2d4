//! Repository layer: entity-scoped database operations.
//!
//! Functions take a `&Connection` so they run unchanged inside a
//! `rusqlite::Transaction`.

mod medication;
mod note;
mod occurrence;

pub use medication::*;
pub use note::*;
pub use occurrence::*;
