//! Hosting operations
//!
//! Each operation is an `async` method on [`Depot`](crate::areas::depot::Depot)
//! that takes the repository lock, then runs a fixed sequence of working
//! tree, version control and catalog steps on the blocking pool.
//!
//! ## Operations
//!
//! - `create`: Create an empty repository for an owner
//! - `upload`: Write a file into the working tree
//! - `mkdir`: Create a directory in the working tree
//! - `commit`: Stage everything and commit
//! - `revert`: Hard reset to a commit and rebuild the record
//! - `queries`: Read-only access to records and history

pub mod commit;
pub mod create;
pub mod mkdir;
pub mod queries;
pub mod revert;
pub mod upload;
