//! Commit history traversal
//!
//! History is linear, so `log` follows first parents from `HEAD` until the
//! root commit or the requested bound.

pub mod rev_list;
