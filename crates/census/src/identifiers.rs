//! Newtype domain identifiers.
//!
//! Every tracker entity with an identity gets its own newtype so that a
//! [`ColumnId`] can never be passed where a [`ProjectId`] is expected, even
//! though GitHub hands both out as `u64`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display, Borrow<str>.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new name, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        // Hash/Eq agree with `str`, so maps keyed by this type can be
        // queried with plain string slices.
        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (GitHub-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: GitHub-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a project board.
    ProjectId
}

u64_id! {
    /// Identifies a column on a project board.
    ColumnId
}

u64_id! {
    /// Identifies a card within a project column.
    CardId
}

u64_id! {
    /// Identifies a repository label.
    LabelId
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single census run.
///
/// Generated fresh for every invocation and recorded on the run span and the
/// report so log lines and output can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RunId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (configuration / label names)
// ---------------------------------------------------------------------------

string_id! {
    /// A label name as it appears on the tracker or in configuration.
    ///
    /// Comparison is exact and case-sensitive.
    LabelName
}

string_id! {
    /// A configured engineering function (e.g. `"backend"`).
    ///
    /// Cards are attributed to a function when they carry a label with the
    /// same name.
    EngineeringFunction
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Identifies a GitHub repository in `"owner/repo"` format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryId {
    owner: String,
    repo: String,
}

impl RepositoryId {
    /// Builds a repository identifier from its two segments.
    ///
    /// Returns `None` if either segment is empty or contains a `/`.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Option<Self> {
        let owner = owner.into();
        let repo = repo.into();
        let valid = |s: &str| !s.is_empty() && !s.contains('/');
        if valid(&owner) && valid(&repo) {
            Some(Self { owner, repo })
        } else {
            None
        }
    }

    /// Parses `"owner/repo"`.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, repo) = full_name.split_once('/')?;
        Self::new(owner, repo)
    }

    /// Returns the owning user or organisation.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
