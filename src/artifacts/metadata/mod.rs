//! Repository metadata: the durable listing of files and commits
//!
//! - `identity`: owner ids, repository names and repository ids
//! - `file_entry`: one listed file or directory
//! - `commit_record`: one listed commit (intent or reconciled)
//! - `repository_record`: the per-repository record and its update rules
//! - `requests`: typed, validated requests and their outcomes

pub mod commit_record;
pub mod file_entry;
pub mod identity;
pub mod repository_record;
pub mod requests;
