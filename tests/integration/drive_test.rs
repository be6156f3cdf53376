//! Integration tests for the drive tree: folders, files, relocation, deletes.

mod helpers;

use bytes::Bytes;

use drivehub_core::error::ErrorKind;
use drivehub_core::traits::storage::ObjectStore;
use drivehub_core::types::PageRequest;
use drivehub_entity::{DriveItem, ParentRef};
use drivehub_service::RequestContext;
use drivehub_service::facade::{
    CreateFolderRequest, ListRequest, MoveRequest, RenameRequest, UploadContent,
};
use drivehub_service::path::{PathResolver, child_path, folder_marker_key};

use helpers::{TestDrive, namespace_input, other_team, team, upload_request};

fn list(namespace_id: &str, parent: ParentRef) -> ListRequest {
    ListRequest {
        namespace_id: namespace_id.to_string(),
        parent_id: Some(parent),
        limit: None,
        page_token: None,
    }
}

fn rename(name: &str) -> RenameRequest {
    RenameRequest {
        new_name: name.to_string(),
    }
}

fn move_to(parent: ParentRef) -> MoveRequest {
    MoveRequest {
        new_parent_id: Some(parent),
    }
}

#[tokio::test]
async fn test_docs_scenario() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    let created = drive
        .facade
        .create_folder(
            &ctx,
            CreateFolderRequest {
                namespace: namespace_input(&ns),
                parent_id: None,
                name: "Docs".into(),
                description: Some("  papers  ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(created.path, "Docs");
    let docs = drive.folder(&ctx, &created.folder_id).await;
    assert_eq!(docs.description.as_deref(), Some("papers"));
    assert!(drive.has_object(&folder_marker_key(&docs.storage_key)));

    let file = drive
        .upload(&ctx, &ns, ParentRef::Folder(docs.id.clone()), "a.txt", b"hello")
        .await;
    assert_eq!(file.logical_path(), "Docs/a.txt");
    assert_eq!(file.path, "Docs");
    assert_eq!(
        file.storage_key,
        "drive/namespaces/team-space_ns1/users/u1/Docs/a.txt"
    );

    let moved = drive
        .facade
        .move_file(&ctx, &file.id, &move_to(ParentRef::Root))
        .await
        .unwrap();
    assert_eq!(moved.old_path, "Docs/a.txt");
    assert_eq!(moved.new_path, "a.txt");
    assert!(moved.outcome.is_consistent());
    assert_eq!(
        moved.entity.storage_key,
        "drive/namespaces/team-space_ns1/users/u1/a.txt"
    );
    assert!(drive.has_object(&moved.entity.storage_key));
    assert!(!drive.has_object(&file.storage_key));

    let renamed = drive
        .facade
        .rename_folder(&ctx, &docs.id, rename("Papers"))
        .await
        .unwrap();
    assert_eq!(renamed.new_path, "Papers");
    assert_eq!(renamed.descendants_updated, 0);
    assert!(drive.has_object(&folder_marker_key(&renamed.entity.storage_key)));
    assert!(!drive.has_object(&folder_marker_key(&docs.storage_key)));
}

#[tokio::test]
async fn test_rename_cascades_paths_and_keys() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    let docs = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    let y2024 = drive.mkdir(&ctx, &ns, docs.id.clone().into(), "2024").await;
    let q1 = drive.mkdir(&ctx, &ns, y2024.id.clone().into(), "Q1").await;
    let top = drive.upload(&ctx, &ns, docs.id.clone().into(), "top.txt", b"top").await;
    let deep = drive.upload(&ctx, &ns, q1.id.clone().into(), "deep.txt", b"deep").await;
    // Same-prefix sibling that must not be touched.
    let docs2 = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs2").await;

    let result = drive
        .facade
        .rename_folder(&ctx, &docs.id, rename("Archive"))
        .await
        .unwrap();
    assert_eq!(result.old_path, "Docs");
    assert_eq!(result.new_path, "Archive");
    assert_eq!(result.descendants_updated, 4);
    assert!(result.outcome.is_consistent(), "{:?}", result.outcome);

    let resolver = PathResolver::new(&drive.config.drive.root);
    let q1 = drive.folder(&ctx, &q1.id).await;
    assert_eq!(q1.path, "Archive/2024/Q1");
    let y2024 = drive.folder(&ctx, &y2024.id).await;
    assert_eq!(q1.path, child_path(&y2024.path, &q1.name));
    assert_eq!(
        q1.storage_key,
        resolver.resolve_folder_key("u1", &ns, &q1.path).unwrap()
    );

    let deep = drive.file(&ctx, &deep.id).await;
    assert_eq!(deep.logical_path(), "Archive/2024/Q1/deep.txt");
    assert_eq!(
        deep.storage_key,
        resolver
            .resolve_file_key("u1", &ns, &deep.path, &deep.name)
            .unwrap()
    );
    let (_, body) = drive.facade.read_file_content(&ctx, &deep.id).await.unwrap();
    assert_eq!(body, Bytes::from_static(b"deep"));

    let top = drive.file(&ctx, &top.id).await;
    assert_eq!(top.logical_path(), "Archive/top.txt");

    let docs2_after = drive.folder(&ctx, &docs2.id).await;
    assert_eq!(docs2_after.path, "Docs2");
    assert_eq!(docs2_after.storage_key, docs2.storage_key);

    assert!(
        drive
            .object_keys()
            .iter()
            .all(|key| !key.contains("/users/u1/Docs/")),
        "old keys left behind: {:?}",
        drive.object_keys()
    );
}

#[tokio::test]
async fn test_move_folder_into_descendant_is_rejected() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    let a = drive.mkdir(&ctx, &ns, ParentRef::Root, "A").await;
    let b = drive.mkdir(&ctx, &ns, a.id.clone().into(), "B").await;
    let c = drive.mkdir(&ctx, &ns, b.id.clone().into(), "C").await;

    let err = drive
        .facade
        .move_folder(&ctx, &a.id, &move_to(c.id.clone().into()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = drive
        .facade
        .move_folder(&ctx, &a.id, &move_to(a.id.clone().into()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert_eq!(drive.folder(&ctx, &a.id).await.path, "A");
    assert_eq!(drive.folder(&ctx, &b.id).await.path, "A/B");
    assert_eq!(drive.folder(&ctx, &c.id).await.path, "A/B/C");
}

#[tokio::test]
async fn test_move_folder_between_parents() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    let a = drive.mkdir(&ctx, &ns, ParentRef::Root, "A").await;
    let b = drive.mkdir(&ctx, &ns, ParentRef::Root, "B").await;
    let inner = drive.mkdir(&ctx, &ns, a.id.clone().into(), "Inner").await;
    let file = drive.upload(&ctx, &ns, inner.id.clone().into(), "n.txt", b"n").await;

    let moved = drive
        .facade
        .move_folder(&ctx, &inner.id, &move_to(b.id.clone().into()))
        .await
        .unwrap();
    assert_eq!(moved.new_path, "B/Inner");
    assert_eq!(moved.entity.parent_id, ParentRef::Folder(b.id.clone()));
    assert_eq!(drive.file(&ctx, &file.id).await.logical_path(), "B/Inner/n.txt");

    // Moving to the current parent changes nothing.
    let again = drive
        .facade
        .move_folder(&ctx, &inner.id, &move_to(b.id.clone().into()))
        .await
        .unwrap();
    assert_eq!(again.old_path, again.new_path);
    assert_eq!(again.entity.updated_at, moved.entity.updated_at);
}

#[tokio::test]
async fn test_move_into_unknown_or_foreign_folder_is_not_found() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("u1");
    let other = RequestContext::new("u2");
    let ns = team();

    let mine = drive.mkdir(&owner, &ns, ParentRef::Root, "Mine").await;
    let theirs = drive.mkdir(&other, &ns, ParentRef::Root, "Theirs").await;
    let elsewhere = drive.mkdir(&owner, &other_team(), ParentRef::Root, "Elsewhere").await;

    for dest in [theirs.id.clone(), elsewhere.id.clone()] {
        let err = drive
            .facade
            .move_folder(&owner, &mine.id, &move_to(dest.into()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}

#[tokio::test]
async fn test_upload_download_round_trip() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();
    let body = b"round trip \x00\xff bytes".to_vec();

    let mut req = upload_request(&ns, ParentRef::Root, "blob.txt", &body);
    req.content = UploadContent::Base64(base64_encode(&body));
    let uploaded = drive.facade.upload_file(&ctx, req).await.unwrap();
    assert_eq!(uploaded.size, body.len() as u64);
    assert_eq!(uploaded.mime_type, "text/plain");

    let (file, bytes) = drive
        .facade
        .read_file_content(&ctx, &uploaded.file_id)
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), body.as_slice());

    let stored = drive.objects.inner.object(drive.bucket(), &file.storage_key).unwrap();
    assert_eq!(stored.content_type, "text/plain");
    assert_eq!(stored.metadata["fileId"], file.id.to_string());
    assert_eq!(stored.metadata["ownerId"], "u1");
    assert_eq!(stored.metadata["namespaceId"], "ns1");
    assert_eq!(stored.metadata["originalName"], "blob.txt");

    let link = drive
        .facade
        .generate_download_url(&ctx, &file.id)
        .await
        .unwrap();
    assert_eq!(link.expires_in, 3600);
    assert!(link.url.contains("disposition=attachment"));
    let preview = drive.facade.generate_preview_url(&ctx, &file.id).await.unwrap();
    assert!(preview.url.contains("disposition=inline"));
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

#[tokio::test]
async fn test_upload_validation() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    let mut wrong_size = upload_request(&ns, ParentRef::Root, "a.txt", b"abc");
    wrong_size.size = 4;
    let err = drive.facade.upload_file(&ctx, wrong_size).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let mut bad_type = upload_request(&ns, ParentRef::Root, "a.exe", b"abc");
    bad_type.mime_type = "application/x-msdownload".into();
    let err = drive.facade.upload_file(&ctx, bad_type).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let slash = upload_request(&ns, ParentRef::Root, "a/b.txt", b"abc");
    let err = drive.facade.upload_file(&ctx, slash).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let mut no_ns = upload_request(&ns, ParentRef::Root, "a.txt", b"abc");
    no_ns.namespace.id = String::new();
    let err = drive.facade.upload_file(&ctx, no_ns).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert!(drive.object_keys().is_empty());
}

#[tokio::test]
async fn test_upload_size_limit() {
    let mut config = drivehub_core::config::AppConfig::default();
    config.drive.max_upload_size_bytes = 4;
    let drive = TestDrive::with_config(config);
    let ctx = RequestContext::new("u1");

    let req = upload_request(&team(), ParentRef::Root, "big.txt", b"12345");
    let err = drive.facade.upload_file(&ctx, req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_duplicate_names_are_rejected() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    let file = drive.upload(&ctx, &ns, ParentRef::Root, "a.txt", b"a").await;

    let err = drive
        .facade
        .upload_file(&ctx, upload_request(&ns, ParentRef::Root, "Docs", b"x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = drive
        .facade
        .rename_file(&ctx, &file.id, rename("Docs"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // The same name is free in another namespace.
    drive.mkdir(&ctx, &other_team(), ParentRef::Root, "Docs").await;
}

#[tokio::test]
async fn test_create_folder_under_missing_parent() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");

    let err = drive
        .facade
        .create_folder(
            &ctx,
            CreateFolderRequest {
                namespace: namespace_input(&team()),
                parent_id: Some(drivehub_entity::FolderId::new().into()),
                name: "Orphan".into(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = drive
        .facade
        .create_folder(
            &ctx,
            CreateFolderRequest {
                namespace: namespace_input(&team()),
                parent_id: None,
                name: String::new(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_namespace_isolation_in_listings() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");

    drive.upload(&ctx, &team(), ParentRef::Root, "a.txt", b"a").await;
    drive.upload(&ctx, &other_team(), ParentRef::Root, "b.txt", b"b").await;
    drive
        .upload(&RequestContext::new("u2"), &team(), ParentRef::Root, "c.txt", b"c")
        .await;

    let page = drive
        .facade
        .list_files(&ctx, &list("ns1", ParentRef::Root))
        .await
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt"]);

    let err = drive
        .facade
        .list_files(&ctx, &list("", ParentRef::Root))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_contents_list_folders_first_and_pages() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    drive.upload(&ctx, &ns, ParentRef::Root, "b.txt", b"b").await;
    drive.upload(&ctx, &ns, ParentRef::Root, "A.txt", b"a").await;
    drive.mkdir(&ctx, &ns, ParentRef::Root, "zeta").await;
    drive.mkdir(&ctx, &ns, ParentRef::Root, "Alpha").await;

    let mut req = list("ns1", ParentRef::Root);
    req.limit = Some(3);
    let first = drive.facade.list_folder_contents(&ctx, &req).await.unwrap();
    let names: Vec<&str> = first.items.iter().map(DriveItem::name).collect();
    assert_eq!(names, vec!["Alpha", "zeta", "A.txt"]);
    assert_eq!(first.total_items, 4);

    req.page_token = first.next_page_token.clone();
    let second = drive.facade.list_folder_contents(&ctx, &req).await.unwrap();
    let names: Vec<&str> = second.items.iter().map(DriveItem::name).collect();
    assert_eq!(names, vec!["b.txt"]);
    assert!(second.next_page_token.is_none());

    let folders = drive
        .facade
        .list_folders(&ctx, &list("ns1", ParentRef::Root))
        .await
        .unwrap();
    assert_eq!(folders.items.len(), 2);
}

#[tokio::test]
async fn test_other_owner_sees_nothing() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("u1");
    let stranger = RequestContext::new("u2");
    let file = drive.upload(&owner, &team(), ParentRef::Root, "a.txt", b"a").await;

    assert!(drive.facade.get_file(&stranger, &file.id).await.unwrap().is_none());
    let err = drive.facade.delete_file(&stranger, &file.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = drive
        .facade
        .generate_download_url(&stranger, &file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_delete_folder_removes_subtree() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    let docs = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    let sub = drive.mkdir(&ctx, &ns, docs.id.clone().into(), "Sub").await;
    drive.upload(&ctx, &ns, docs.id.clone().into(), "a.txt", b"a").await;
    drive.upload(&ctx, &ns, sub.id.clone().into(), "b.txt", b"b").await;
    let keep = drive.upload(&ctx, &ns, ParentRef::Root, "keep.txt", b"k").await;

    // An object under the folder prefix with no record is not ours to remove.
    let stray = format!("{}/stray.bin", docs.storage_key);
    drive
        .objects
        .inner
        .put(
            drive.bucket(),
            &stray,
            Bytes::from_static(b"?"),
            "application/octet-stream",
            &Default::default(),
        )
        .await
        .unwrap();

    let report = drive.facade.delete_folder(&ctx, &docs.id).await.unwrap();
    assert!(report.deleted);
    assert_eq!(report.files_deleted, 2);
    assert_eq!(report.folders_deleted, 2);
    assert!(report.failures.is_empty());
    assert!(report.outcome.is_consistent());

    assert!(drive.facade.get_folder(&ctx, &sub.id).await.unwrap().is_none());
    let mut expected = vec![keep.storage_key.clone(), stray];
    expected.sort();
    assert_eq!(drive.object_keys(), expected);
}

#[tokio::test]
async fn test_folder_tree_counts() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();

    let docs = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    let sub = drive.mkdir(&ctx, &ns, docs.id.clone().into(), "Sub").await;
    drive.mkdir(&ctx, &ns, ParentRef::Root, "Music").await;
    drive.upload(&ctx, &ns, docs.id.clone().into(), "a.txt", b"a").await;
    drive.upload(&ctx, &ns, sub.id.clone().into(), "b.txt", b"b").await;
    drive.upload(&ctx, &ns, ParentRef::Root, "c.txt", b"c").await;

    let tree = drive.facade.get_folder_tree(&ctx, "ns1", None).await.unwrap();
    assert_eq!(tree.total_folders, 3);
    assert_eq!(tree.root_file_count, 1);
    assert_eq!(tree.roots[0].name, "Docs");
    assert_eq!(tree.roots[0].file_count, 1);
    assert_eq!(tree.roots[0].child_count, 1);
    assert_eq!(tree.roots[0].children[0].path, "Docs/Sub");

    let subtree = drive
        .facade
        .get_folder_tree(&ctx, "ns1", Some(&sub.id))
        .await
        .unwrap();
    assert_eq!(subtree.roots.len(), 1);
    assert_eq!(subtree.total_folders, 1);
}

#[tokio::test]
async fn test_initialize_drive_system_is_idempotent() {
    let drive = TestDrive::new();

    let first = drive.facade.initialize_drive_system().await.unwrap();
    assert_eq!(first.created, vec!["drive/.drive", "drive/namespaces/.folder"]);
    assert!(first.existing.is_empty());

    let second = drive.facade.initialize_drive_system().await.unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.existing.len(), 2);
}

#[tokio::test]
async fn test_list_page_token_is_validated() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let mut req = list("ns1", ParentRef::Root);
    req.page_token = Some("not-a-token".into());
    let err = drive.facade.list_files(&ctx, &req).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let page = drive
        .facade
        .shared_by_me(&ctx, &PageRequest::first(10))
        .await
        .unwrap();
    assert!(page.items.is_empty());
}
