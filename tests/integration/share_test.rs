//! Integration tests for sharing: grants, expiry, revocation, resolution.

mod helpers;

use chrono::{Duration, Utc};

use drivehub_core::error::ErrorKind;
use drivehub_core::types::PageRequest;
use drivehub_entity::{
    DriveItem, ParentRef, PermissionSet, SharePermission, ShareRecord, ShareStatus, ShareType,
};
use drivehub_service::facade::{ShareRequest, UpdatePermissionsRequest};
use drivehub_service::{RequestContext, ShareService, SharedContent};

use helpers::{TestDrive, team};

fn grant(to: &str, permissions: &[SharePermission]) -> ShareRequest {
    ShareRequest {
        shared_with_user_id: to.to_string(),
        permissions: permissions.to_vec(),
        expires_at: None,
        message: None,
    }
}

async fn shared_file(drive: &TestDrive, expires_in: Option<Duration>) -> ShareRecord {
    let owner = RequestContext::new("owner");
    let file = drive
        .upload(&owner, &team(), ParentRef::Root, "report.txt", b"numbers")
        .await;
    let mut req = grant("bob", &[SharePermission::Read]);
    req.expires_at = expires_in.map(|d| Utc::now() + d);
    drive.facade.share_file(&owner, &file.id, req).await.unwrap()
}

async fn visible_to_bob(drive: &TestDrive) -> Vec<ShareRecord> {
    drive
        .facade
        .shared_with_me(&RequestContext::new("bob"), &PageRequest::first(100))
        .await
        .unwrap()
        .items
}

#[tokio::test]
async fn test_share_file_snapshots_entity() {
    let drive = TestDrive::new();
    let share = shared_file(&drive, None).await;

    assert_eq!(share.share_type, ShareType::File);
    assert_eq!(share.original_owner_id, "owner");
    assert_eq!(share.shared_with_user_id, "bob");
    assert_eq!(share.original_name, "report.txt");
    assert_eq!(share.original_path, "report.txt");
    assert_eq!(share.original_mime_type.as_deref(), Some("text/plain"));
    assert_eq!(share.original_size, Some(7));
    assert_eq!(share.status, ShareStatus::Active);
    assert!(share.id.as_str().starts_with("SHARE_"));

    let mine = drive
        .facade
        .shared_by_me(&RequestContext::new("owner"), &PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(mine.items, vec![share.clone()]);
    assert_eq!(visible_to_bob(&drive).await, vec![share]);
}

#[tokio::test]
async fn test_expiry_boundary() {
    let drive = TestDrive::new();
    let expired = shared_file(&drive, Some(Duration::seconds(-1))).await;

    assert!(visible_to_bob(&drive).await.is_empty());
    let err = drive
        .facade
        .resolve_shared_content(&RequestContext::new("bob"), &expired.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);
    assert!(err.message.contains("expired"));

    // Expired shares still show up for their owner until revoked.
    let mine = drive
        .facade
        .shared_by_me(&RequestContext::new("owner"), &PageRequest::first(10))
        .await
        .unwrap();
    assert_eq!(mine.items.len(), 1);

    let drive = TestDrive::new();
    let live = shared_file(&drive, Some(Duration::seconds(3600))).await;
    assert_eq!(visible_to_bob(&drive).await, vec![live.clone()]);
    let content = drive
        .facade
        .resolve_shared_content(&RequestContext::new("bob"), &live.id)
        .await
        .unwrap();
    match content {
        SharedContent::File {
            file,
            download_url,
            expires_in,
        } => {
            assert_eq!(file.name, "report.txt");
            assert!(download_url.contains("disposition=attachment"));
            assert_eq!(expires_in, 3600);
        }
        other => panic!("expected file content, got {other:?}"),
    }
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("owner");
    let share = shared_file(&drive, None).await;

    let first = drive.facade.revoke_share(&owner, &share.id).await.unwrap();
    assert_eq!(first.status, ShareStatus::Revoked);
    assert!(first.revoked_at.is_some());

    let second = drive
        .facade
        .revoke_share(&RequestContext::new("owner"), &share.id)
        .await
        .unwrap();
    assert_eq!(second, first);

    assert!(visible_to_bob(&drive).await.is_empty());
    let err = drive
        .facade
        .resolve_shared_content(&RequestContext::new("bob"), &share.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);
    assert!(err.message.contains("revoked"));

    let mine = drive
        .facade
        .shared_by_me(&owner, &PageRequest::first(10))
        .await
        .unwrap();
    assert!(mine.items.is_empty());
}

#[tokio::test]
async fn test_only_owner_can_revoke_or_update() {
    let drive = TestDrive::new();
    let share = shared_file(&drive, None).await;
    let bob = RequestContext::new("bob");

    let err = drive.facade.revoke_share(&bob, &share.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = drive
        .facade
        .update_share_permissions(
            &bob,
            &share.id,
            UpdatePermissionsRequest {
                permissions: vec![SharePermission::Admin],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_update_permissions() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("owner");
    let share = shared_file(&drive, None).await;

    let updated = drive
        .facade
        .update_share_permissions(
            &owner,
            &share.id,
            UpdatePermissionsRequest {
                permissions: vec![SharePermission::Read, SharePermission::Write],
            },
        )
        .await
        .unwrap();
    assert!(updated.permissions.contains(SharePermission::Write));
    assert_eq!(updated.permissions.len(), 2);

    let err = drive
        .facade
        .update_share_permissions(
            &owner,
            &share.id,
            UpdatePermissionsRequest {
                permissions: Vec::new(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let service = ShareService::new(drive.facade.stores().clone());
    let err = service
        .update_share_permissions(&owner, &share.id, PermissionSet::empty())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    drive.facade.revoke_share(&owner, &share.id).await.unwrap();
    let err = drive
        .facade
        .update_share_permissions(
            &owner,
            &share.id,
            UpdatePermissionsRequest {
                permissions: vec![SharePermission::Read],
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Gone);
}

#[tokio::test]
async fn test_grant_validation() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("owner");
    let file = drive
        .upload(&owner, &team(), ParentRef::Root, "a.txt", b"a")
        .await;

    let err = drive
        .facade
        .share_file(&owner, &file.id, grant("owner", &[SharePermission::Read]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = drive
        .facade
        .share_file(&owner, &file.id, grant("bob", &[]))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = drive
        .facade
        .share_file(
            &RequestContext::new("mallory"),
            &file.id,
            grant("bob", &[SharePermission::Read]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_share_visibility_and_grantee_check() {
    let drive = TestDrive::new();
    let share = shared_file(&drive, None).await;

    let stranger = RequestContext::new("eve");
    assert!(drive.facade.get_share(&stranger, &share.id).await.unwrap().is_none());
    assert!(
        drive
            .facade
            .get_share(&RequestContext::new("bob"), &share.id)
            .await
            .unwrap()
            .is_some()
    );

    let err = drive
        .facade
        .resolve_shared_content(&stranger, &share.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_write_only_share_cannot_be_read() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("owner");
    let file = drive
        .upload(&owner, &team(), ParentRef::Root, "a.txt", b"a")
        .await;
    let share = drive
        .facade
        .share_file(&owner, &file.id, grant("bob", &[SharePermission::Write]))
        .await
        .unwrap();

    let err = drive
        .facade
        .resolve_shared_content(&RequestContext::new("bob"), &share.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
}

#[tokio::test]
async fn test_folder_share_resolves_to_contents() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("owner");
    let ns = team();
    let docs = drive.mkdir(&owner, &ns, ParentRef::Root, "Docs").await;
    drive.upload(&owner, &ns, docs.id.clone().into(), "b.txt", b"b").await;
    drive.mkdir(&owner, &ns, docs.id.clone().into(), "Sub").await;

    let share = drive
        .facade
        .share_folder(&owner, &docs.id, grant("bob", &[SharePermission::Admin]))
        .await
        .unwrap();
    assert_eq!(share.share_type, ShareType::Folder);
    assert_eq!(share.original_path, "Docs");

    let content = drive
        .facade
        .resolve_shared_content(&RequestContext::new("bob"), &share.id)
        .await
        .unwrap();
    let SharedContent::Folder { folder, contents } = content else {
        panic!("expected folder content");
    };
    assert_eq!(folder.id, docs.id);
    let names: Vec<&str> = contents.iter().map(DriveItem::name).collect();
    assert_eq!(names, vec!["Sub", "b.txt"]);
}

#[tokio::test]
async fn test_share_of_deleted_file_is_not_found() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("owner");
    let share = shared_file(&drive, None).await;
    let file_id = share.original_id.parse().unwrap();
    drive.facade.delete_file(&owner, &file_id).await.unwrap();

    let err = drive
        .facade
        .resolve_shared_content(&RequestContext::new("bob"), &share.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_resolved_file_follows_owner_renames() {
    let drive = TestDrive::new();
    let owner = RequestContext::new("owner");
    let share = shared_file(&drive, None).await;
    let file_id = share.original_id.parse().unwrap();
    drive
        .facade
        .rename_file(
            &owner,
            &file_id,
            drivehub_service::facade::RenameRequest {
                new_name: "final.txt".into(),
            },
        )
        .await
        .unwrap();

    let content = drive
        .facade
        .resolve_shared_content(&RequestContext::new("bob"), &share.id)
        .await
        .unwrap();
    let SharedContent::File { file, download_url, .. } = content else {
        panic!("expected file content");
    };
    assert_eq!(file.name, "final.txt");
    assert!(download_url.contains("final.txt"));
}
