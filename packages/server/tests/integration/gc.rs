use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ::common::storage::FilesystemBlobStore;
use image_store::config::{DatabaseConfig, StorageConfig};
use image_store::database::init_db;
use image_store::images::{ImageService, UploadRequest, collect_orphans};
use tempfile::TempDir;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn upload_attach_detach_collect_scenario() {
    let app = TestApp::spawn().await;

    let uploaded = app.upload_png("banner.png", b"IMAGE_A").await;
    assert_eq!(uploaded.status, 200);
    let id = uploaded.str("id").to_string();
    let filename = uploaded.str("filename").to_string();
    let url = uploaded.str("url").to_string();
    assert_eq!(app.files_in(app.products_dir()), vec![filename.clone()]);

    assert_eq!(app.attach(&id, 1).await.body["ref_count"], 1);

    let again = app.upload_png("other-name.png", b"IMAGE_A").await;
    assert_eq!(again.str("url"), url);
    assert_eq!(app.get(routes::IMAGES).await.body["total"], 1);

    assert_eq!(app.detach(&id).await.body["ref_count"], 0);

    let report = app.collect().await;
    assert_eq!(report.status, 200, "{}", report.text);
    assert_eq!(report.body["moved"], 1);

    assert!(app.files_in(app.products_dir()).is_empty());
    let quarantined = app.files_in(app.garbage_dir());
    assert_eq!(quarantined.len(), 1);
    assert!(quarantined[0].ends_with(&format!("_{filename}")));
    assert_eq!(
        std::fs::read(app.garbage_dir().join(&quarantined[0])).unwrap(),
        b"IMAGE_A"
    );

    let meta = app.get(&routes::image(&filename)).await;
    assert_eq!(meta.status, 200);
    assert_eq!(meta.body["ref_count"], 0);
    assert_eq!(app.get(&url).await.status, 404);
}

#[tokio::test]
async fn collection_leaves_referenced_images_alone() {
    let app = TestApp::spawn().await;
    let kept = app.upload_png("kept.png", b"KEPT").await;
    let dropped = app.upload_png("dropped.png", b"DROPPED").await;
    app.attach(kept.str("id"), 1).await;

    let report = app.collect().await;

    assert_eq!(report.body["scanned"], 1);
    assert_eq!(report.body["moved"], 1);
    assert_eq!(
        app.files_in(app.products_dir()),
        vec![kept.str("filename").to_string()]
    );
    assert_eq!(app.get(kept.str("url")).await.text, "KEPT");

    let dropped_meta = app.get(&routes::image(dropped.str("filename"))).await;
    assert_eq!(dropped_meta.status, 200);
    assert_eq!(app.get(routes::IMAGES).await.body["total"], 2);
}

#[tokio::test]
async fn collection_is_idempotent() {
    let app = TestApp::spawn().await;
    app.upload_png("a.png", b"ORPHAN").await;

    let first = app.collect().await;
    let second = app.collect().await;

    assert_eq!(first.body["moved"], 1);
    assert_eq!(second.body["moved"], 0);
    assert_eq!(second.body["missing"], 1);
    assert_eq!(second.body["failed"], 0);
    assert_eq!(app.files_in(app.garbage_dir()).len(), 1);
}

#[tokio::test]
async fn reattached_image_survives_collection() {
    let app = TestApp::spawn().await;
    let uploaded = app.upload_png("a.png", b"PNG_DATA").await;
    let id = uploaded.str("id");
    app.attach(id, 1).await;
    app.detach(id).await;
    app.attach(id, 2).await;

    let report = app.collect().await;

    assert_eq!(report.body["scanned"], 0);
    assert_eq!(app.files_in(app.products_dir()).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_uploads_get_distinct_names() {
    let dir = TempDir::new().unwrap();
    let db = init_db(&DatabaseConfig {
        url: "sqlite::memory:".into(),
        max_connections: 1,
        min_connections: 1,
    })
    .await
    .unwrap();
    let storage = StorageConfig {
        root: dir.path().to_path_buf(),
        ..StorageConfig::default()
    };
    let store = Arc::new(FilesystemBlobStore::new(
        storage.root.clone(),
        Duration::from_secs(30),
    ));
    let service = ImageService::new(db.clone(), store.clone(), storage);

    let uploads = (0..1000).map(|i| {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .upload(UploadRequest {
                    bytes: format!("image-{i}").into_bytes(),
                    content_type: Some("image/png".into()),
                    original_filename: Some("same.png".into()),
                    ..UploadRequest::default()
                })
                .await
        })
    });
    let stored: Vec<_> = futures::future::join_all(uploads)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let names: HashSet<&str> = stored.iter().map(|s| s.filename.as_str()).collect();
    assert_eq!(names.len(), 1000);
    assert!(stored.iter().all(|s| !s.deduplicated));
    assert_eq!(
        std::fs::read_dir(dir.path().join("products")).unwrap().count(),
        1000
    );

    let report = collect_orphans(&db, store.as_ref(), Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(report.moved, 1000);
}
