//! Share permission definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Capabilities a share can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    /// Read content and descriptors.
    Read,
    /// Modify content.
    Write,
    /// Delete the entity.
    Delete,
    /// Every other permission.
    Admin,
    /// Run the entity (scripts, notebooks).
    Execute,
    /// Re-share to others.
    Share,
}

impl SharePermission {
    /// All permissions in bit order.
    pub const ALL: [SharePermission; 6] = [
        Self::Read,
        Self::Write,
        Self::Delete,
        Self::Admin,
        Self::Execute,
        Self::Share,
    ];

    /// Return the permission as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Admin => "admin",
            Self::Execute => "execute",
            Self::Share => "share",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Read => 1,
            Self::Write => 1 << 1,
            Self::Delete => 1 << 2,
            Self::Admin => 1 << 3,
            Self::Execute => 1 << 4,
            Self::Share => 1 << 5,
        }
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown permission '{s}'"))
    }
}

/// A set of share permissions. Serialized as a list of names.
///
/// `admin` implies every other permission when checked through
/// [`PermissionSet::allows`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<SharePermission>", into = "Vec<SharePermission>")]
pub struct PermissionSet(u8);

impl PermissionSet {
    /// The empty set.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Add a permission.
    pub fn insert(&mut self, permission: SharePermission) {
        self.0 |= permission.bit();
    }

    /// Whether the permission was granted explicitly.
    pub fn contains(&self, permission: SharePermission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// Whether the set grants `permission`, directly or through `admin`.
    pub fn allows(&self, permission: SharePermission) -> bool {
        self.contains(SharePermission::Admin) || self.contains(permission)
    }

    /// Whether no permission is granted.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of explicitly granted permissions.
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Explicitly granted permissions in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = SharePermission> + '_ {
        SharePermission::ALL
            .into_iter()
            .filter(move |p| self.contains(*p))
    }
}

impl FromIterator<SharePermission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = SharePermission>>(iter: I) -> Self {
        let mut set = Self::empty();
        for permission in iter {
            set.insert(permission);
        }
        set
    }
}

impl From<Vec<SharePermission>> for PermissionSet {
    fn from(list: Vec<SharePermission>) -> Self {
        list.into_iter().collect()
    }
}

impl From<PermissionSet> for Vec<SharePermission> {
    fn from(set: PermissionSet) -> Self {
        set.iter().collect()
    }
}
