use crate::common::{TestApp, routes};

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_stores_file_and_returns_url() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("banner.png", b"PNG_DATA".to_vec(), Some("image/png"), Some("alice"))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let filename = res.str("filename");
        assert!(filename.ends_with("-banner.png"));
        assert_eq!(res.str("url"), format!("/uploads/products/{filename}"));
        assert_eq!(res.body["deduplicated"], false);
        assert_eq!(app.files_in(app.products_dir()), vec![filename.to_string()]);

        let meta = app.get(&routes::image(filename)).await;
        assert_eq!(meta.status, 200);
        assert_eq!(meta.body["ref_count"], 0);
        assert_eq!(meta.body["size"], 8);
        assert_eq!(meta.body["uploaded_by"], "alice");
        assert_eq!(meta.body["content_type"], "image/png");
    }

    #[tokio::test]
    async fn identical_content_is_deduplicated() {
        let app = TestApp::spawn().await;

        let first = app.upload_png("a.png", b"same bytes").await;
        let second = app
            .upload("b.jpg", b"same bytes".to_vec(), Some("image/jpeg"), None)
            .await;

        assert_eq!(first.status, 200);
        assert_eq!(second.status, 200);
        assert_eq!(first.str("url"), second.str("url"));
        assert_eq!(first.str("hash"), second.str("hash"));
        assert_eq!(second.body["deduplicated"], true);

        assert_eq!(app.files_in(app.products_dir()).len(), 1);
        let list = app.get(routes::IMAGES).await;
        assert_eq!(list.body["total"], 1);
    }

    #[tokio::test]
    async fn hash_is_hex_sha256_of_content() {
        let app = TestApp::spawn().await;

        let res = app.upload_png("hello.png", b"hello world").await;

        assert_eq!(
            res.str("hash"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn filename_is_sanitized() {
        let app = TestApp::spawn().await;

        let res = app.upload_png("../My Banner (1).PNG", b"pixels").await;

        assert_eq!(res.status, 200);
        let filename = res.str("filename");
        assert!(filename.ends_with("-My_Banner__1_.png"), "{filename}");
        assert!(!filename.contains('/'));
    }

    #[tokio::test]
    async fn stored_image_is_served_statically() {
        let app = TestApp::spawn().await;

        let res = app.upload_png("a.png", b"PNG_DATA").await;
        let served = app.get(res.str("url")).await;

        assert_eq!(served.status, 200);
        assert_eq!(served.text, "PNG_DATA");
    }

    #[tokio::test]
    async fn text_content_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("notes.txt", b"hello".to_vec(), Some("text/plain"), None)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.files_in(app.products_dir()).is_empty());
        assert_eq!(app.get(routes::IMAGES).await.body["total"], 0);
    }

    #[tokio::test]
    async fn missing_content_type_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload("a.png", b"PNG_DATA".to_vec(), None, None).await;

        assert_eq!(res.status, 400);
        assert!(app.files_in(app.products_dir()).is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::spawn().await;
        let limit = app.state.config.storage.max_upload_size as usize;

        let res = app
            .upload("big.png", vec![0u8; limit + 1], Some("image/png"), None)
            .await;

        assert_eq!(res.status, 400);
        assert!(app.files_in(app.products_dir()).is_empty());
        assert_eq!(app.get(routes::IMAGES).await.body["total"], 0);
    }

    #[tokio::test]
    async fn upload_at_the_limit_is_accepted() {
        let app = TestApp::spawn().await;
        let limit = app.state.config.storage.max_upload_size as usize;

        let res = app
            .upload("big.png", vec![7u8; limit], Some("image/png"), None)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload_png("a.png", b"").await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new().text("uploaded_by", "alice");
        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }
}

mod lookup {
    use super::*;

    #[tokio::test]
    async fn unknown_image_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::image("missing.png")).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_can_filter_orphans() {
        let app = TestApp::spawn().await;
        let used = app.upload_png("used.png", b"used").await;
        app.upload_png("free.png", b"free").await;
        app.attach(used.str("id"), 1).await;

        let all = app.get(routes::IMAGES).await;
        assert_eq!(all.body["total"], 2);

        let orphans = app.get(&format!("{}?orphaned=true", routes::IMAGES)).await;
        assert_eq!(orphans.body["total"], 1);
        assert!(
            orphans.body["images"][0]["filename"]
                .as_str()
                .unwrap()
                .ends_with("-free.png")
        );
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn unknown_image_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::image("missing.png")).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn referenced_image_cannot_be_deleted() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_png("a.png", b"PNG_DATA").await;
        let filename = uploaded.str("filename").to_string();
        app.attach(uploaded.str("id"), 7).await;

        let res = app.delete(&routes::image(&filename)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.str("error"), "Cannot delete image that is still in use");
        assert_eq!(app.files_in(app.products_dir()), vec![filename.clone()]);
        assert_eq!(app.get(&routes::image(&filename)).await.status, 200);
    }

    #[tokio::test]
    async fn unreferenced_image_is_removed() {
        let app = TestApp::spawn().await;
        let uploaded = app.upload_png("a.png", b"PNG_DATA").await;
        let filename = uploaded.str("filename").to_string();

        let res = app.delete(&routes::image(&filename)).await;

        assert_eq!(res.status, 204);
        assert!(app.files_in(app.products_dir()).is_empty());
        assert_eq!(app.get(&routes::image(&filename)).await.status, 404);
        assert_eq!(app.get(uploaded.str("url")).await.status, 404);
    }

    #[tokio::test]
    async fn content_can_be_uploaded_again_after_delete() {
        let app = TestApp::spawn().await;
        let first = app.upload_png("a.png", b"PNG_DATA").await;
        app.delete(&routes::image(first.str("filename"))).await;

        let second = app.upload_png("a.png", b"PNG_DATA").await;

        assert_eq!(second.status, 200);
        assert_eq!(second.body["deduplicated"], false);
        assert_ne!(first.str("filename"), second.str("filename"));
    }
}

mod failures {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use ::common::storage::{BlobStore, Bucket, StorageError};

    use super::*;

    /// Blob store whose writes always fail.
    struct BrokenStore;

    #[async_trait]
    impl BlobStore for BrokenStore {
        async fn write(&self, _: Bucket, _: &str, _: &[u8], _: bool) -> Result<(), StorageError> {
            Err(std::io::Error::other("disk full").into())
        }

        async fn read(&self, _: Bucket, name: &str) -> Result<Vec<u8>, StorageError> {
            Err(StorageError::NotFound(name.to_string()))
        }

        async fn exists(&self, _: Bucket, _: &str) -> Result<bool, StorageError> {
            Ok(false)
        }

        async fn delete(&self, _: Bucket, _: &str) -> Result<bool, StorageError> {
            Ok(false)
        }

        async fn quarantine(&self, name: &str, _: DateTime<Utc>) -> Result<String, StorageError> {
            Err(StorageError::NotFound(name.to_string()))
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_no_catalog_entry() {
        let app = TestApp::spawn_with_store(Arc::new(BrokenStore)).await;

        let res = app.upload_png("a.png", b"PNG_DATA").await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert_eq!(app.get(routes::IMAGES).await.body["total"], 0);
    }
}
