pub mod manager;
pub mod models;
pub mod source;

pub use manager::{DatabaseError, DatabaseManager};
pub use source::{PgRecordSource, RecordSource};
