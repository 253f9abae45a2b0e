//! Owner, repository name and repository id
//!
//! Owner ids and repository names become path components of the storage
//! layout, so they are validated before anything touches the disk.

use crate::errors::{DepotError, DepotResult};
use serde::{Deserialize, Serialize};

/// Characters outside `[A-Za-z0-9._-]`, or a leading dot.
const INVALID_IDENTIFIER_REGEX: &str = r"[^A-Za-z0-9._-]|^\.";

const MAX_IDENTIFIER_LENGTH: usize = 100;

fn validate_identifier(kind: &str, value: &str) -> DepotResult<()> {
    if value.is_empty() {
        return Err(DepotError::InvalidRequest(format!("{kind} cannot be empty")));
    }
    if value.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(DepotError::InvalidRequest(format!(
            "{kind} is longer than {MAX_IDENTIFIER_LENGTH} characters"
        )));
    }

    let re = regex::Regex::new(INVALID_IDENTIFIER_REGEX)
        .map_err(|error| DepotError::Internal(error.into()))?;
    if re.is_match(value) {
        return Err(DepotError::InvalidRequest(format!(
            "invalid {kind}: {value}"
        )));
    }

    Ok(())
}

/// Already-authenticated id of the user owning a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn try_parse(value: impl Into<String>) -> DepotResult<Self> {
        let value = value.into();
        validate_identifier("owner id", &value)?;
        Ok(Self(value))
    }
}

/// Repository name, unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName(String);

impl RepoName {
    pub fn try_parse(value: impl Into<String>) -> DepotResult<Self> {
        let value = value.into();
        validate_identifier("repository name", &value)?;
        Ok(Self(value))
    }
}

/// Handle assigned to a repository at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(uuid::Uuid);

impl RepoId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// A malformed id can never name a stored repository.
    pub fn try_parse(value: &str) -> DepotResult<Self> {
        uuid::Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| DepotError::not_found("repository", value))
    }
}

macro_rules! string_identity {
    ($name:ident) => {
        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = DepotError;

            fn try_from(value: String) -> DepotResult<Self> {
                Self::try_parse(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

string_identity!(OwnerId);
string_identity!(RepoName);

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("u1")]
    #[case("demo")]
    #[case("my-repo_v2.0")]
    fn accepts_plain_identifiers(#[case] value: &str) {
        assert!(RepoName::try_parse(value).is_ok());
        assert!(OwnerId::try_parse(value).is_ok());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case(".hidden")]
    #[case("a/b")]
    #[case("a b")]
    #[case("naïve")]
    fn rejects_unsafe_identifiers(#[case] value: &str) {
        assert!(matches!(
            RepoName::try_parse(value),
            Err(DepotError::InvalidRequest(_))
        ));
    }

    #[test]
    fn rejects_overlong_names() {
        assert!(RepoName::try_parse("a".repeat(101)).is_err());
        assert!(RepoName::try_parse("a".repeat(100)).is_ok());
    }

    #[test]
    fn malformed_repo_id_is_not_found() {
        assert!(matches!(
            RepoId::try_parse("not-a-uuid"),
            Err(DepotError::NotFound { what: "repository", .. })
        ));
    }

    #[test]
    fn repo_id_round_trips_through_text() {
        let id = RepoId::generate();

        assert_eq!(RepoId::try_parse(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn owner_id_deserialization_validates() {
        let parsed: Result<OwnerId, _> = serde_json::from_str("\"../etc\"");

        assert!(parsed.is_err());
    }

    proptest! {
        #[test]
        fn identifiers_never_contain_separators(value in "[A-Za-z0-9._/-]{1,20}") {
            if let Ok(name) = RepoName::try_parse(value.clone()) {
                prop_assert!(!name.as_ref().contains('/'));
                prop_assert!(!name.as_ref().starts_with('.'));
            }
        }
    }
}
