//! SQLite/Postgres persistence for users and access token sessions.

mod storage;

pub use storage::SqlxStorage;
