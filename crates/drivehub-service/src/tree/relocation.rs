//! Cascading relocation after a folder rename or move.
//!
//! The renamed folder's record is written first. Its descendants are then
//! walked with an explicit worklist of `(item, old_path, new_path)` entries:
//! each record is rewritten, then its content (file object or folder
//! marker) is copied to the re-derived key and the old object deleted.
//! Content failures never undo metadata; they land in the outcome. A folder
//! whose record cannot be rewritten keeps its whole subtree under its old path.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use drivehub_entity::{DriveItem, Folder, Namespace};

use crate::path::{child_path, folder_marker_key, rebase_path};
use crate::stores::DriveStores;
use crate::tree::outcome::ConsistencyOutcome;

/// One pending descendant.
#[derive(Debug)]
struct WorkItem {
    item: DriveItem,
    old_path: String,
    new_path: String,
}

/// Metadata patch rewriting an entity's location.
pub(crate) fn location_patch(path: &str, storage_key: &str) -> Map<String, Value> {
    let mut patch = Map::new();
    patch.insert("path".into(), json!(path));
    patch.insert("storageKey".into(), json!(storage_key));
    patch.insert("updatedAt".into(), json!(Utc::now()));
    patch
}

/// Copy `old_key` to `new_key`, then delete `old_key`.
pub(crate) async fn relocate_object(
    stores: &DriveStores,
    old_key: &str,
    new_key: &str,
    outcome: &mut ConsistencyOutcome,
) {
    if old_key == new_key {
        return;
    }
    let bucket = stores.bucket();
    if let Err(e) = stores.objects.copy(bucket, old_key, new_key, None).await {
        warn!(old_key, new_key, error = %e, "Content relocation failed; metadata already updated");
        outcome.content_failed(format!(
            "Failed to copy '{old_key}' to '{new_key}': {}",
            e.message
        ));
        return;
    }
    if let Err(e) = stores.objects.delete(bucket, old_key).await {
        warn!(old_key, error = %e, "Failed to delete relocated object");
        outcome.content_failed(format!(
            "Copied to '{new_key}' but failed to delete '{old_key}': {}",
            e.message
        ));
        return;
    }
    debug!(old_key, new_key, "Relocated object");
}

/// Rewrite every descendant of `root` (already saved at its new location)
/// whose paths still sit under `old_root_path`.
///
/// Returns how many descendant records were rewritten.
pub(crate) async fn relocate_descendants(
    stores: &DriveStores,
    root: &Folder,
    old_root_path: &str,
    outcome: &mut ConsistencyOutcome,
) -> u64 {
    let scoped = match stores.scoped_items(&root.owner_id, &root.namespace_id).await {
        Ok(items) => items,
        Err(e) => {
            warn!(folder_id = %root.id, error = %e, "Could not enumerate descendants");
            outcome.metadata_failed(format!(
                "Descendants of '{}' were not relocated: {}",
                root.path, e.message
            ));
            return 0;
        }
    };

    let mut children: HashMap<String, Vec<DriveItem>> = HashMap::new();
    for item in scoped {
        if let Some(parent) = item.parent_id().folder_id() {
            children.entry(parent.to_string()).or_default().push(item);
        }
    }

    let namespace = root.namespace();
    let mut stack: Vec<WorkItem> = Vec::new();
    push_children(
        &mut stack,
        &mut children,
        root.id.as_str(),
        &root.path,
        old_root_path,
        &root.path,
        outcome,
    );

    let mut visited: HashSet<String> = HashSet::new();
    let mut rewritten = 0u64;
    while let Some(work) = stack.pop() {
        if !visited.insert(work.item.id().to_string()) {
            continue;
        }
        let relocated = relocate_one(stores, &namespace, &work, outcome).await;
        if relocated {
            rewritten += 1;
        }
        if let DriveItem::Folder(folder) = &work.item {
            if relocated {
                push_children(
                    &mut stack,
                    &mut children,
                    folder.id.as_str(),
                    &work.new_path,
                    old_root_path,
                    &root.path,
                    outcome,
                );
            } else {
                // The folder kept its old path, so its subtree stays under it.
                skip_subtree(&mut children, folder, outcome);
            }
        }
    }

    rewritten
}

/// Leave everything under a folder whose record could not be rewritten at
/// its current location, warning once per skipped descendant.
fn skip_subtree(
    children: &mut HashMap<String, Vec<DriveItem>>,
    folder: &Folder,
    outcome: &mut ConsistencyOutcome,
) {
    let mut pending = vec![folder.id.to_string()];
    while let Some(parent_id) = pending.pop() {
        for item in children.remove(&parent_id).unwrap_or_default() {
            outcome.metadata_failed(format!(
                "Skipped '{}' ({}): parent '{}' was not relocated",
                item.name(),
                item.id(),
                folder.path
            ));
            if let DriveItem::Folder(sub) = &item {
                pending.push(sub.id.to_string());
            }
        }
    }
}

/// Queue the direct children of a folder now living at `parent_new_path`.
fn push_children(
    stack: &mut Vec<WorkItem>,
    children: &mut HashMap<String, Vec<DriveItem>>,
    parent_id: &str,
    parent_new_path: &str,
    old_root_path: &str,
    new_root_path: &str,
    outcome: &mut ConsistencyOutcome,
) {
    for item in children.remove(parent_id).unwrap_or_default() {
        let derived = match &item {
            DriveItem::File(_) => parent_new_path.to_string(),
            DriveItem::Folder(folder) => child_path(parent_new_path, &folder.name),
        };
        let new_path = match rebase_path(item.path(), old_root_path, new_root_path) {
            Some(rebased) if rebased == derived => rebased,
            _ => {
                outcome.warnings.push(format!(
                    "Stored path '{}' of {} did not match its parent; rewritten to '{derived}'",
                    item.path(),
                    item.id()
                ));
                derived
            }
        };
        stack.push(WorkItem {
            old_path: item.path().to_string(),
            new_path,
            item,
        });
    }
}

/// Rewrite one record and move its content. Returns whether metadata moved.
async fn relocate_one(
    stores: &DriveStores,
    namespace: &Namespace,
    work: &WorkItem,
    outcome: &mut ConsistencyOutcome,
) -> bool {
    let owner_id = work.item.owner_id();
    let new_key = match &work.item {
        DriveItem::File(file) => {
            stores
                .resolver
                .resolve_file_key(owner_id, namespace, &work.new_path, &file.name)
        }
        DriveItem::Folder(_) => stores
            .resolver
            .resolve_folder_key(owner_id, namespace, &work.new_path),
    };
    let new_key = match new_key {
        Ok(key) => key,
        Err(e) => {
            outcome.metadata_failed(format!(
                "Cannot derive key for {}: {}",
                work.item.id(),
                e.message
            ));
            return false;
        }
    };

    let patch = location_patch(&work.new_path, &new_key);
    if let Err(e) = stores.items.update(work.item.id(), patch).await {
        warn!(id = work.item.id(), error = %e, "Descendant metadata update failed");
        outcome.metadata_failed(format!(
            "Failed to update '{}' ({}): {}",
            work.old_path,
            work.item.id(),
            e.message
        ));
        return false;
    }

    let old_key = work.item.storage_key();
    match &work.item {
        DriveItem::File(_) => relocate_object(stores, old_key, &new_key, outcome).await,
        DriveItem::Folder(_) => {
            relocate_object(
                stores,
                &folder_marker_key(old_key),
                &folder_marker_key(&new_key),
                outcome,
            )
            .await
        }
    }
    debug!(
        id = work.item.id(),
        old_path = %work.old_path,
        new_path = %work.new_path,
        "Relocated descendant"
    );
    true
}
