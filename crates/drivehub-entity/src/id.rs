//! Prefixed string identifiers for drive entities.
//!
//! Ids are opaque strings tagged with the entity kind (`FILE_`, `FOLDER_`,
//! `SHARE_`) so that a record's id alone tells which table shape it has.
//! Using distinct types prevents accidentally passing a `FileId` where a
//! `FolderId` is expected.

use std::fmt;
use std::str::FromStr;

use drivehub_core::error::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Sentinel parent id for entities at the top of a user's drive.
pub const ROOT_SENTINEL: &str = "ROOT";

/// Failure to parse an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The value is empty.
    #[error("identifier is empty")]
    Empty,
    /// The value does not carry the expected prefix.
    #[error("identifier '{value}' does not start with '{expected}'")]
    WrongPrefix {
        /// The rejected value.
        value: String,
        /// The prefix that was expected.
        expected: &'static str,
    },
}

impl From<IdError> for AppError {
    fn from(err: IdError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Macro to define a prefixed string identifier.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// The tag every identifier of this kind starts with.
            pub const PREFIX: &'static str = $prefix;

            /// Create a new unique identifier.
            pub fn new() -> Self {
                Self(format!("{}{}", $prefix, Uuid::now_v7().simple()))
            }

            /// Parse an identifier, checking its prefix.
            pub fn parse(value: &str) -> Result<Self, IdError> {
                let value = value.trim();
                if value.is_empty() {
                    return Err(IdError::Empty);
                }
                if !value.starts_with($prefix) || value.len() == $prefix.len() {
                    return Err(IdError::WrongPrefix {
                        value: value.to_string(),
                        expected: $prefix,
                    });
                }
                Ok(Self(value.to_string()))
            }

            /// Borrow the identifier as a string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a file.
    FileId, "FILE_"
);

define_id!(
    /// Unique identifier for a folder.
    FolderId, "FOLDER_"
);

define_id!(
    /// Unique identifier for a share record.
    ShareId, "SHARE_"
);

/// Reference to the parent of a file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParentRef {
    /// The top of the owner's drive in a namespace.
    Root,
    /// A folder owned by the same user in the same namespace.
    Folder(FolderId),
}

impl ParentRef {
    /// Parse `"ROOT"` or a folder id.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        match value.trim() {
            ROOT_SENTINEL => Ok(Self::Root),
            other => FolderId::parse(other).map(Self::Folder),
        }
    }

    /// Whether this is the root sentinel.
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The parent folder id, if any.
    pub fn folder_id(&self) -> Option<&FolderId> {
        match self {
            Self::Root => None,
            Self::Folder(id) => Some(id),
        }
    }

    /// Borrow the stored representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => ROOT_SENTINEL,
            Self::Folder(id) => id.as_str(),
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FolderId> for ParentRef {
    fn from(id: FolderId) -> Self {
        Self::Folder(id)
    }
}

impl TryFrom<String> for ParentRef {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ParentRef> for String {
    fn from(parent: ParentRef) -> String {
        match parent {
            ParentRef::Root => ROOT_SENTINEL.to_string(),
            ParentRef::Folder(id) => id.into(),
        }
    }
}

impl FromStr for ParentRef {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
