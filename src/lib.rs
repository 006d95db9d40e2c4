//! In-memory text table with optional ordered per-column indexes.
//!
//! Records are stored once in an insertion-ordered heap and shared with every
//! index. Queries are conjunctions of `(column, comparator, value)` predicates;
//! the engine answers indexed predicates from their index, intersects those
//! partial results, and checks the rest record by record.

pub mod engine;
pub mod error;
pub mod index;
pub mod persist;
pub mod record;
pub mod table;

pub use engine::{intersect, Comparator, Predicate, QueryPlan};
pub use error::{Result, TableError};
pub use index::Index;
pub use record::{is_valid_text, Record};
pub use table::Table;
