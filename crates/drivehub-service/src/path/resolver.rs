//! Canonical storage keys and logical path arithmetic.

use drivehub_core::error::AppError;
use drivehub_core::result::AppResult;
use drivehub_entity::Namespace;

/// Name of the zero-byte object marking a folder's existence.
pub const FOLDER_MARKER: &str = ".folder";

/// Derives storage keys from ownership, namespace, and logical path.
///
/// Every key has the shape
/// `{root}/namespaces/{slug(namespace.name)}_{namespace.id}/users/{owner}/{path}`,
/// with repeated separators collapsed. The resolver is pure: the same
/// inputs always give the same key, which is what lets stored keys be
/// re-derived and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: String,
}

impl PathResolver {
    /// Create a resolver for the given drive root prefix.
    pub fn new(root: &str) -> Self {
        Self {
            root: normalize(root),
        }
    }

    /// The normalized drive root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Key prefix shared by every namespace.
    pub fn namespaces_prefix(&self) -> String {
        join_segments([self.root.as_str(), "namespaces"])
    }

    /// Key prefix of one owner's drive inside a namespace.
    pub fn owner_prefix(&self, owner_id: &str, namespace: &Namespace) -> AppResult<String> {
        validate_scope(owner_id, namespace)?;
        let scope = format!("{}_{}", slugify(&namespace.name), namespace.id.trim());
        Ok(join_segments([
            self.namespaces_prefix().as_str(),
            scope.as_str(),
            "users",
            owner_id.trim(),
        ]))
    }

    /// Storage key of a file named `name` inside the folder at `parent_path`.
    pub fn resolve_file_key(
        &self,
        owner_id: &str,
        namespace: &Namespace,
        parent_path: &str,
        name: &str,
    ) -> AppResult<String> {
        let prefix = self.owner_prefix(owner_id, namespace)?;
        Ok(join_segments([prefix.as_str(), parent_path, name]))
    }

    /// Storage key (prefix) of the folder at `folder_path`.
    pub fn resolve_folder_key(
        &self,
        owner_id: &str,
        namespace: &Namespace,
        folder_path: &str,
    ) -> AppResult<String> {
        let prefix = self.owner_prefix(owner_id, namespace)?;
        Ok(join_segments([prefix.as_str(), folder_path]))
    }
}

fn validate_scope(owner_id: &str, namespace: &Namespace) -> AppResult<()> {
    if owner_id.trim().is_empty() {
        return Err(AppError::validation("ownerId is required"));
    }
    if namespace.id.trim().is_empty() {
        return Err(AppError::validation("namespace.id is required"));
    }
    if namespace.name.trim().is_empty() {
        return Err(AppError::validation("namespace.name is required"));
    }
    Ok(())
}

/// Key of the marker object for a folder key.
pub fn folder_marker_key(folder_key: &str) -> String {
    join_segments([folder_key, FOLDER_MARKER])
}

/// Logical path of a child named `name` under `parent_path`.
pub fn child_path(parent_path: &str, name: &str) -> String {
    join_segments([parent_path, name])
}

/// Lower-case `name`, collapsing every run of non-alphanumeric characters
/// into one `-` and trimming dashes from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Collapse repeated `/` and strip leading and trailing separators.
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

fn join_segments<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(|part| part.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` equals `prefix` or lies below it, by whole segments.
pub fn is_within(path: &str, prefix: &str) -> bool {
    let path = normalize(path);
    let prefix = normalize(prefix);
    if prefix.is_empty() {
        return true;
    }
    path == prefix
        || path
            .strip_prefix(&prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Replace the leading `old_prefix` segments of `path` with `new_prefix`.
///
/// Returns `None` when `path` is not within `old_prefix`, so `Docs2/x` is
/// never rebased by a `Docs` prefix.
pub fn rebase_path(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if !is_within(path, old_prefix) {
        return None;
    }
    let path = normalize(path);
    let old_prefix = normalize(old_prefix);
    let rest = path.get(old_prefix.len()..).unwrap_or_default();
    Some(join_segments([new_prefix, rest]))
}
