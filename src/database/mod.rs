// Database module
// SQLite chunk store plus the portable embedding encoding it persists

pub mod codec;
pub mod sqlite;

pub use sqlite::*;
