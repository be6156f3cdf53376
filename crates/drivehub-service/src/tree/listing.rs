//! Paginated, owner- and namespace-scoped listings.

use std::cmp::Ordering;

use drivehub_core::result::AppResult;
use drivehub_core::types::{PageRequest, PageResponse};
use drivehub_entity::{DriveItem, File, Folder, ItemKind, ParentRef};

use crate::stores::DriveStores;

/// Children of `parent` owned by `owner_id` in `namespace_id`, with
/// folders before files and each group sorted by name.
pub(crate) async fn sorted_children(
    stores: &DriveStores,
    owner_id: &str,
    namespace_id: &str,
    parent: &ParentRef,
) -> AppResult<Vec<DriveItem>> {
    let mut items = stores
        .items
        .find_children(owner_id, namespace_id, parent)
        .await
        .map_err(|e| e.into_unavailable("Failed to list folder"))?;
    items.sort_by(compare_items);
    Ok(items)
}

fn compare_items(a: &DriveItem, b: &DriveItem) -> Ordering {
    let rank = |item: &DriveItem| match item.kind() {
        ItemKind::Folder => 0,
        ItemKind::File => 1,
    };
    rank(a)
        .cmp(&rank(b))
        .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.id().cmp(b.id()))
}

/// One page of folder contents.
pub(crate) async fn contents_page(
    stores: &DriveStores,
    owner_id: &str,
    namespace_id: &str,
    parent: &ParentRef,
    page: &PageRequest,
) -> AppResult<PageResponse<DriveItem>> {
    let items = sorted_children(stores, owner_id, namespace_id, parent).await?;
    PageResponse::paginate(items, page)
}

/// One page of the files directly under `parent`.
pub(crate) async fn files_page(
    stores: &DriveStores,
    owner_id: &str,
    namespace_id: &str,
    parent: &ParentRef,
    page: &PageRequest,
) -> AppResult<PageResponse<File>> {
    let files: Vec<File> = sorted_children(stores, owner_id, namespace_id, parent)
        .await?
        .into_iter()
        .filter_map(DriveItem::into_file)
        .collect();
    PageResponse::paginate(files, page)
}

/// One page of the folders directly under `parent`.
pub(crate) async fn folders_page(
    stores: &DriveStores,
    owner_id: &str,
    namespace_id: &str,
    parent: &ParentRef,
    page: &PageRequest,
) -> AppResult<PageResponse<Folder>> {
    let folders: Vec<Folder> = sorted_children(stores, owner_id, namespace_id, parent)
        .await?
        .into_iter()
        .filter_map(DriveItem::into_folder)
        .collect();
    PageResponse::paginate(folders, page)
}
