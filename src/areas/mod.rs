//! Stateful components, each owning a location on disk
//!
//! - `workspace`: Working tree files and directories
//! - `database`: Object database for blobs, trees and commits
//! - `index`: Staging area
//! - `refs`: `HEAD` and the branch it points at
//! - `repository`: One version-controlled working tree
//! - `catalog`: Repository records and name claims
//! - `depot`: The orchestrator shared by every hosting operation

pub mod catalog;
pub mod database;
pub mod depot;
pub mod index;
pub mod refs;
pub mod repository;
pub mod workspace;
