//! Working tree path rules.

pub mod containment;
