//! Version control engine
//!
//! Synchronous operations on one [`Repository`](crate::areas::repository::Repository).
//! They are the building blocks the hosting operations compose.
//!
//! ## Commands
//!
//! - `init`: Create the object store, `HEAD` and an empty index
//! - `stage`: Stage the whole working tree, deletions included
//! - `commit`: Commit the index on top of `HEAD`
//! - `reset`: Resolve a commit and hard reset the working tree to it
//! - `log`: Walk history from `HEAD`
//! - `ls_tree`: List the files tracked by `HEAD`

pub mod commit;
pub mod init;
pub mod log;
pub mod ls_tree;
pub mod reset;
pub mod stage;
