//! Results table: typed schema, CSV persistence, and the record store.
//!
//! The persisted table is the only shared state of a run; everything that
//! touches it goes through `RecordStore`.
mod io;
mod schema;
mod store;

pub use schema::{
    Field, FieldValue, IdentityKey, ImprovementCategory, MinedRow, RowUpdate, Score, WorkItem,
};
pub use store::{Origin, RecordStore};
