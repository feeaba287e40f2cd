mod sqlite_db;

pub use sqlite_db::{LocationStats, SqliteDB};
