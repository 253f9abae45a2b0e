//! Path containment rules for caller-supplied paths
//!
//! Every path that reaches the working tree goes through [`RelativePath`]
//! first. Parsing is pure: nothing here touches the filesystem, so a path
//! that parses is guaranteed to stay below whatever root it is joined to.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory holding the version-control store inside each working tree.
pub const VCS_DIR: &str = ".git";

/// Why a caller-supplied path was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathViolation {
    #[error("path {0:?} is absolute")]
    Absolute(String),

    #[error("path {0:?} contains a parent-directory segment")]
    ParentSegment(String),

    #[error("path {0:?} contains a backslash")]
    Backslash(String),

    #[error("path {0:?} contains a NUL byte")]
    Nul(String),

    #[error("path {0:?} touches the version-control store")]
    Reserved(String),

    #[error("file name {0:?} must be a single path segment")]
    InvalidFileName(String),

    #[error("path {0:?} names the repository root")]
    Root(String),
}

/// A normalized, `/`-separated path relative to a repository root.
///
/// Empty and `.` segments are dropped, so `"./docs//a"` and `"docs/a"`
/// parse to the same value. The empty path is the root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self, PathViolation> {
        if raw.contains('\0') {
            return Err(PathViolation::Nul(raw.to_owned()));
        }
        if raw.contains('\\') {
            return Err(PathViolation::Backslash(raw.to_owned()));
        }
        if raw.starts_with('/') || has_drive_prefix(raw) {
            return Err(PathViolation::Absolute(raw.to_owned()));
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(PathViolation::ParentSegment(raw.to_owned())),
                VCS_DIR => return Err(PathViolation::Reserved(raw.to_owned())),
                segment => segments.push(segment.to_owned()),
            }
        }

        Ok(Self { segments })
    }

    /// Like [`RelativePath::parse`], but the root itself is refused.
    pub fn parse_non_root(raw: &str) -> Result<Self, PathViolation> {
        let path = Self::parse(raw)?;
        if path.is_root() {
            return Err(PathViolation::Root(raw.to_owned()));
        }

        Ok(path)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a single validated file name.
    pub fn join_file_name(&self, file_name: &str) -> Result<Self, PathViolation> {
        let name = validate_file_name(file_name)?;

        let mut segments = self.segments.clone();
        segments.push(name.to_owned());

        Ok(Self { segments })
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// `a/b/c` form, as recorded in repository metadata.
    pub fn as_posix(&self) -> String {
        self.segments.join("/")
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    /// Resolve below `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(self.to_path_buf())
    }
}

impl std::fmt::Display for RelativePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_posix())
    }
}

/// A file name must be exactly one non-special segment.
pub fn validate_file_name(file_name: &str) -> Result<&str, PathViolation> {
    let invalid = || PathViolation::InvalidFileName(file_name.to_owned());

    if file_name.contains('\0') {
        return Err(PathViolation::Nul(file_name.to_owned()));
    }
    if file_name.contains('\\') {
        return Err(PathViolation::Backslash(file_name.to_owned()));
    }
    match file_name {
        "" | "." => Err(invalid()),
        ".." => Err(PathViolation::ParentSegment(file_name.to_owned())),
        VCS_DIR => Err(PathViolation::Reserved(file_name.to_owned())),
        name if name.contains('/') => Err(invalid()),
        name => Ok(name),
    }
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case(".", "")]
    #[case("docs", "docs")]
    #[case("./docs//guide/", "docs/guide")]
    #[case("a/./b", "a/b")]
    #[case("notes.git/x", "notes.git/x")]
    fn normalizes_segments(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(RelativePath::parse(raw).unwrap().as_posix(), expected);
    }

    #[rstest]
    #[case("..", PathViolation::ParentSegment("..".into()))]
    #[case("a/../../etc", PathViolation::ParentSegment("a/../../etc".into()))]
    #[case("/etc/passwd", PathViolation::Absolute("/etc/passwd".into()))]
    #[case("C:/Windows", PathViolation::Absolute("C:/Windows".into()))]
    #[case("a\\b", PathViolation::Backslash("a\\b".into()))]
    #[case("a\0b", PathViolation::Nul("a\0b".into()))]
    #[case(".git/config", PathViolation::Reserved(".git/config".into()))]
    #[case("src/.git", PathViolation::Reserved("src/.git".into()))]
    fn rejects_escaping_paths(#[case] raw: &str, #[case] expected: PathViolation) {
        assert_eq!(RelativePath::parse(raw).unwrap_err(), expected);
    }

    #[rstest]
    #[case("a.txt", true)]
    #[case(".env", true)]
    #[case("", false)]
    #[case(".", false)]
    #[case("..", false)]
    #[case("a/b", false)]
    #[case(".git", false)]
    fn file_names_are_single_segments(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_file_name(name).is_ok(), valid);
    }

    #[test]
    fn non_root_rejects_empty_path() {
        assert_eq!(
            RelativePath::parse_non_root("./"),
            Err(PathViolation::Root("./".into()))
        );
    }

    #[test]
    fn join_file_name_extends_the_path() {
        let dir = RelativePath::parse("docs").unwrap();

        let file = dir.join_file_name("a.txt").unwrap();

        assert_eq!(file.as_posix(), "docs/a.txt");
        assert_eq!(file.file_name(), Some("a.txt"));
        assert_eq!(file.to_path_buf(), PathBuf::from("docs").join("a.txt"));
    }

    proptest! {
        #[test]
        fn parsed_paths_stay_under_the_root(raw in "[a-z./\\\\]{0,24}") {
            if let Ok(path) = RelativePath::parse(&raw) {
                let root = Path::new("/srv/depot/u1/demo");
                let resolved = path.under(root);

                prop_assert!(resolved.starts_with(root));
                prop_assert!(
                    resolved.components().all(|c| !matches!(c, std::path::Component::ParentDir))
                );
            }
        }

        #[test]
        fn any_parent_segment_is_rejected(
            prefix in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
            suffix in "[a-z]{1,8}"
        ) {
            let raw = format!("{prefix}/../{suffix}");
            prop_assert!(RelativePath::parse(&raw).is_err());
        }

        #[test]
        fn plain_segments_round_trip(path in "[a-z0-9_-]{1,8}(/[a-z0-9_-]{1,8}){0,4}") {
            prop_assert_eq!(RelativePath::parse(&path).unwrap().as_posix(), path);
        }
    }
}
