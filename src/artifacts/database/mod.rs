//! Types produced when reading objects back from the database.

pub mod database_entry;
