use content_backend::storage::{AssetStore, AssetUpload, StorageError, SupabaseAssetStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SERVICE_KEY: &str = "service-role-key";

fn upload() -> AssetUpload {
    AssetUpload {
        bytes: b"fake-png".to_vec(),
        original_name: Some("logo.png".to_string()),
        content_type: "image/png".to_string(),
    }
}

#[tokio::test]
async fn uploads_under_the_media_prefix_and_returns_the_public_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/assets/media/[0-9a-f-]{36}\.png$"))
        .and(header("authorization", "Bearer service-role-key"))
        .and(header("apikey", SERVICE_KEY))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "assets/media/x.png" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseAssetStore::new(&server.uri(), SERVICE_KEY, "assets");
    let stored = store.store(upload()).await.unwrap();

    assert!(stored.file_path.starts_with("media/"));
    assert!(stored.filename.ends_with(".png"));
    assert_eq!(
        stored.public_url,
        format!("{}/storage/v1/object/public/assets/{}", server.uri(), stored.file_path)
    );
}

#[tokio::test]
async fn rejected_uploads_surface_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(413).set_body_string("Payload too large"))
        .mount(&server)
        .await;

    let store = SupabaseAssetStore::new(&server.uri(), SERVICE_KEY, "assets");
    match store.store(upload()).await {
        Err(StorageError::Rejected { status, body }) => {
            assert_eq!(status, 413);
            assert_eq!(body, "Payload too large");
        }
        other => panic!("expected a rejection, got {:?}", other.map(|s| s.file_path)),
    }
}

#[tokio::test]
async fn removes_objects_by_prefix() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/assets"))
        .and(body_json(json!({ "prefixes": ["media/abc.png"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SupabaseAssetStore::new(&server.uri(), SERVICE_KEY, "assets");
    store.remove("media/abc.png").await.unwrap();
}
