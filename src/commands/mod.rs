//! Command implementations
//!
//! - `plumbing`: version control operations on a single repository
//! - `porcelain`: hosting operations composing plumbing, working tree and
//!   catalog steps under a per-repository lock

pub mod plumbing;
pub mod porcelain;
