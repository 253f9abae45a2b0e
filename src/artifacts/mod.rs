//! Plain data types and pure algorithms
//!
//! - `database`: entries read back from the object store
//! - `index`: staging index entries and file format
//! - `log`: commit history traversal
//! - `metadata`: repository records, identities and typed requests
//! - `objects`: VCS object types (blob, tree, commit)
//! - `workspace`: path containment rules for caller-supplied paths

pub mod database;
pub mod index;
pub mod log;
pub mod metadata;
pub mod objects;
pub mod workspace;
