//! Integration tests for cross-store consistency under injected failures.

mod helpers;

use drivehub_core::config::AppConfig;
use drivehub_core::error::ErrorKind;
use drivehub_core::traits::metadata::MetadataStore;
use drivehub_entity::{Folder, ItemKind, ParentRef};
use drivehub_service::RequestContext;
use drivehub_service::facade::{CreateFolderRequest, ListRequest, MoveRequest, RenameRequest};
use drivehub_service::path::{child_path, folder_marker_key};

use helpers::{MetaOp, ObjectOp, TestDrive, namespace_input, team, upload_request};

fn root_listing() -> ListRequest {
    ListRequest {
        namespace_id: "ns1".into(),
        parent_id: Some(ParentRef::Root),
        limit: None,
        page_token: None,
    }
}

#[tokio::test]
async fn test_upload_content_failure_leaves_no_record() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    drive.objects.fail(ObjectOp::Put, None);

    let err = drive
        .facade
        .upload_file(&ctx, upload_request(&team(), ParentRef::Root, "a.txt", b"a"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

    drive.objects.heal();
    let files = drive.facade.list_files(&ctx, &root_listing()).await.unwrap();
    assert!(files.items.is_empty());
}

#[tokio::test]
async fn test_upload_metadata_failure_removes_content() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    drive.metadata.fail(MetaOp::Put, None);

    let err = drive
        .facade
        .upload_file(&ctx, upload_request(&team(), ParentRef::Root, "a.txt", b"a"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert!(drive.object_keys().is_empty());

    drive.metadata.heal();
    let files = drive.facade.list_files(&ctx, &root_listing()).await.unwrap();
    assert!(files.items.is_empty());
}

#[tokio::test]
async fn test_folder_marker_failure_leaves_no_record() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    drive.objects.fail(ObjectOp::Put, Some(".folder"));

    let err = drive
        .facade
        .create_folder(
            &ctx,
            CreateFolderRequest {
                namespace: namespace_input(&team()),
                parent_id: None,
                name: "Docs".into(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

    let folders = drive.facade.list_folders(&ctx, &root_listing()).await.unwrap();
    assert!(folders.items.is_empty());
}

#[tokio::test]
async fn test_folder_record_failure_removes_marker() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    drive.metadata.fail(MetaOp::Put, Some("FOLDER_"));

    let err = drive
        .facade
        .create_folder(
            &ctx,
            CreateFolderRequest {
                namespace: namespace_input(&team()),
                parent_id: None,
                name: "Docs".into(),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert!(drive.object_keys().is_empty());
}

#[tokio::test]
async fn test_copy_failure_during_rename_keeps_metadata() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();
    let docs = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    let file = drive.upload(&ctx, &ns, docs.id.clone().into(), "a.txt", b"a").await;
    drive.objects.fail(ObjectOp::Copy, Some("/Docs/a.txt"));

    let result = drive
        .facade
        .rename_folder(
            &ctx,
            &docs.id,
            RenameRequest {
                new_name: "Papers".into(),
            },
        )
        .await
        .unwrap();
    assert!(result.outcome.metadata_ok);
    assert!(!result.outcome.content_ok);
    assert_eq!(result.outcome.warnings.len(), 1);
    assert!(result.outcome.warnings[0].contains("/Docs/a.txt"));
    assert_eq!(result.descendants_updated, 1);

    // Metadata is authoritative: the record moved, the object did not.
    let moved = drive.file(&ctx, &file.id).await;
    assert_eq!(moved.logical_path(), "Papers/a.txt");
    assert!(moved.storage_key.ends_with("/Papers/a.txt"));
    assert!(drive.has_object(&file.storage_key));
    assert!(!drive.has_object(&moved.storage_key));

    // The folder marker itself was relocated.
    assert!(drive.has_object(&folder_marker_key(&result.entity.storage_key)));
}

#[tokio::test]
async fn test_descendant_update_failure_keeps_subtree_in_place() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();
    let a = drive.mkdir(&ctx, &ns, ParentRef::Root, "A").await;
    let b = drive.mkdir(&ctx, &ns, a.id.clone().into(), "B").await;
    let c = drive.mkdir(&ctx, &ns, b.id.clone().into(), "C").await;
    let file = drive.upload(&ctx, &ns, c.id.clone().into(), "f.txt", b"f").await;
    drive.metadata.fail(MetaOp::Update, Some(b.id.as_str()));

    let result = drive
        .facade
        .rename_folder(
            &ctx,
            &a.id,
            RenameRequest {
                new_name: "Z".into(),
            },
        )
        .await
        .unwrap();
    assert!(!result.outcome.metadata_ok);
    assert_eq!(result.descendants_updated, 0);
    assert_eq!(result.outcome.warnings.len(), 3);
    assert!(result.outcome.warnings.iter().any(|w| w.contains(c.id.as_str())));
    assert!(result.outcome.warnings.iter().any(|w| w.contains(file.id.as_str())));

    drive.metadata.heal();
    assert_eq!(drive.folder(&ctx, &a.id).await.path, "Z");
    let b_after = drive.folder(&ctx, &b.id).await;
    assert_eq!(b_after.path, "A/B");
    let c_after = drive.folder(&ctx, &c.id).await;
    assert_eq!(c_after.path, child_path(&b_after.path, &c_after.name));
    assert_eq!(c_after.storage_key, c.storage_key);

    let file_after = drive.file(&ctx, &file.id).await;
    assert_eq!(file_after.logical_path(), "A/B/C/f.txt");
    assert_eq!(file_after.storage_key, file.storage_key);
    assert!(drive.has_object(&file.storage_key));
}

#[tokio::test]
async fn test_folder_delete_leaves_unrelocated_content_alone() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();
    let docs = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    let file = drive.upload(&ctx, &ns, docs.id.clone().into(), "a.txt", b"a").await;
    drive.objects.fail(ObjectOp::Copy, Some("/Docs/a.txt"));
    drive
        .facade
        .rename_folder(
            &ctx,
            &docs.id,
            RenameRequest {
                new_name: "Papers".into(),
            },
        )
        .await
        .unwrap();
    drive.objects.heal();
    assert!(drive.has_object(&file.storage_key));

    // A new folder reusing the old name shares the old key prefix.
    let reused = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    assert_eq!(reused.storage_key, docs.storage_key);
    let report = drive.facade.delete_folder(&ctx, &reused.id).await.unwrap();
    assert!(report.deleted);
    assert!(report.outcome.is_consistent());

    assert!(drive.has_object(&file.storage_key));
}

#[tokio::test]
async fn test_metadata_failure_during_rename_changes_nothing() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let file = drive.upload(&ctx, &team(), ParentRef::Root, "a.txt", b"a").await;
    drive.metadata.fail(MetaOp::Update, None);

    let err = drive
        .facade
        .rename_file(
            &ctx,
            &file.id,
            RenameRequest {
                new_name: "b.txt".into(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

    drive.metadata.heal();
    assert_eq!(drive.file(&ctx, &file.id).await.name, "a.txt");
    assert_eq!(drive.object_keys(), vec![file.storage_key.clone()]);
}

#[tokio::test]
async fn test_content_delete_failure_is_reported() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let file = drive.upload(&ctx, &team(), ParentRef::Root, "a.txt", b"a").await;
    drive.objects.fail(ObjectOp::Delete, Some(&file.storage_key));

    let deletion = drive.facade.delete_file(&ctx, &file.id).await.unwrap();
    assert!(deletion.outcome.metadata_ok);
    assert!(!deletion.outcome.content_ok);
    assert_eq!(deletion.path, "a.txt");

    assert!(drive.facade.get_file(&ctx, &file.id).await.unwrap().is_none());
    assert!(drive.has_object(&file.storage_key));
}

#[tokio::test]
async fn test_record_delete_failure_blocks_folder_delete() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();
    let docs = drive.mkdir(&ctx, &ns, ParentRef::Root, "Docs").await;
    let sub = drive.mkdir(&ctx, &ns, docs.id.clone().into(), "Sub").await;
    let other = drive.mkdir(&ctx, &ns, docs.id.clone().into(), "Other").await;
    drive.upload(&ctx, &ns, docs.id.clone().into(), "a.txt", b"a").await;
    let stuck = drive.upload(&ctx, &ns, sub.id.clone().into(), "b.txt", b"b").await;
    drive.upload(&ctx, &ns, other.id.clone().into(), "c.txt", b"c").await;
    drive.metadata.fail(MetaOp::Delete, Some(stuck.id.as_str()));

    let report = drive.facade.delete_folder(&ctx, &docs.id).await.unwrap();
    assert!(!report.deleted);
    assert_eq!(report.files_deleted, 2);
    assert_eq!(report.folders_deleted, 1);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.id, stuck.id.as_str());
    assert_eq!(failure.kind, ItemKind::File);
    assert_eq!(failure.path, "Docs/Sub/b.txt");
    assert_eq!(failure.error_code, "UNAVAILABLE");

    // The failed file's ancestors survive; the unaffected sibling does not.
    assert!(drive.facade.get_folder(&ctx, &docs.id).await.unwrap().is_some());
    assert!(drive.facade.get_folder(&ctx, &sub.id).await.unwrap().is_some());
    assert!(drive.facade.get_folder(&ctx, &other.id).await.unwrap().is_none());
    assert!(drive.facade.get_file(&ctx, &stuck.id).await.unwrap().is_some());

    let response = report.clone().into_response();
    assert!(!response.success);
    assert_eq!(response.error_code.as_deref(), Some("UNAVAILABLE"));
    let details = response.details.unwrap();
    assert_eq!(details["failures"][0]["path"], "Docs/Sub/b.txt");
    assert!(report.into_result().is_err());

    // Once the store recovers the delete completes.
    drive.metadata.heal();
    let retry = drive.facade.delete_folder(&ctx, &docs.id).await.unwrap();
    assert!(retry.deleted);
    assert_eq!(retry.files_deleted, 1);
    assert_eq!(retry.folders_deleted, 2);
    assert!(drive.object_keys().is_empty());
}

#[tokio::test]
async fn test_store_outage_maps_to_unavailable() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    drive.metadata.fail(MetaOp::Scan, None);

    let err = drive.facade.list_files(&ctx, &root_listing()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

    let err = drive
        .facade
        .get_folder_tree(&ctx, "ns1", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
}

fn move_into(folder: &Folder) -> MoveRequest {
    MoveRequest {
        new_parent_id: Some(folder.id.clone().into()),
    }
}

async fn assert_paths(drive: &TestDrive, ctx: &RequestContext, expected: &[(&Folder, &str)]) {
    for (folder, path) in expected {
        assert_eq!(drive.folder(ctx, &folder.id).await.path, *path);
    }
}

#[tokio::test]
async fn test_cycle_check_fails_when_ancestor_lookup_fails() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();
    let a = drive.mkdir(&ctx, &ns, ParentRef::Root, "A").await;
    let b = drive.mkdir(&ctx, &ns, a.id.clone().into(), "B").await;
    let c = drive.mkdir(&ctx, &ns, b.id.clone().into(), "C").await;
    let x = drive.mkdir(&ctx, &ns, ParentRef::Root, "X").await;
    drive.metadata.fail(MetaOp::Get, Some(b.id.as_str()));

    let err = drive
        .facade
        .move_folder(&ctx, &x.id, &move_into(&c))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert!(err.message.contains("A/B/C"));

    drive.metadata.heal();
    assert_paths(&drive, &ctx, &[(&x, "X"), (&a, "A"), (&b, "A/B"), (&c, "A/B/C")]).await;
}

#[tokio::test]
async fn test_cycle_check_fails_on_dangling_parent() {
    let drive = TestDrive::new();
    let ctx = RequestContext::new("u1");
    let ns = team();
    let a = drive.mkdir(&ctx, &ns, ParentRef::Root, "A").await;
    let b = drive.mkdir(&ctx, &ns, a.id.clone().into(), "B").await;
    let x = drive.mkdir(&ctx, &ns, ParentRef::Root, "X").await;
    drive
        .metadata
        .inner
        .delete(&drive.config.metadata.files_table, a.id.as_str())
        .await
        .unwrap();

    let err = drive
        .facade
        .move_folder(&ctx, &x.id, &move_into(&b))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);

    assert_paths(&drive, &ctx, &[(&x, "X"), (&b, "A/B")]).await;
}

#[tokio::test]
async fn test_cycle_check_fails_past_max_depth() {
    let mut config = AppConfig::default();
    config.drive.scan_page_size = 3;
    config.drive.max_tree_depth = 2;
    let drive = TestDrive::with_config(config);
    let ctx = RequestContext::new("u1");
    let ns = team();
    let a = drive.mkdir(&ctx, &ns, ParentRef::Root, "A").await;
    let b = drive.mkdir(&ctx, &ns, a.id.clone().into(), "B").await;
    let c = drive.mkdir(&ctx, &ns, b.id.clone().into(), "C").await;
    let d = drive.mkdir(&ctx, &ns, c.id.clone().into(), "D").await;
    let x = drive.mkdir(&ctx, &ns, ParentRef::Root, "X").await;

    let err = drive
        .facade
        .move_folder(&ctx, &x.id, &move_into(&d))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    assert_paths(&drive, &ctx, &[(&x, "X"), (&d, "A/B/C/D")]).await;
}
