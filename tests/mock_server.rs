//! Cloudinary API モックサーバー
//!
//! httpmockでCloudinaryのUpload/Admin APIをモックし、
//! `CloudinaryClient` のリクエスト組み立てとレスポンス解釈を外部通信なしで検証します。

use blogvault::infra::api::cloudinary::{
    AssetStore, CloudinaryClient, ResourceType, Transformation, UploadRequest,
};
use blogvault::types::{CloudinaryConfig, StoreError};
use httpmock::prelude::*;
use serde_json::json;

const CLOUD: &str = "demo";
// "key:secret" のBasic認証ヘッダ
const BASIC_AUTH: &str = "Basic a2V5OnNlY3JldA==";

/// Cloudinary APIのモックサーバー
pub struct CloudinaryMockServer {
    server: MockServer,
}

impl CloudinaryMockServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start_async().await,
        }
    }

    /// モックサーバーに向けたクライアントを作成
    pub fn client(&self) -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig::with_endpoints(
            CLOUD,
            "key",
            "secret",
            &self.server.base_url(),
            "https://res.cloudinary.com",
        ))
    }

    /// 指定プレフィックスのリソース一覧をモック
    pub async fn mock_prefix_lookup(&self, resource_type: &str, prefix: &str, found: bool) -> httpmock::Mock<'_> {
        let resources = if found {
            json!([{
                "public_id": format!("{}cover", prefix),
                "secure_url": format!("https://res.cloudinary.com/demo/image/upload/v1/{}cover.png", prefix),
                "format": "png",
                "resource_type": resource_type
            }])
        } else {
            json!([])
        };
        self.server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("/v1_1/{}/resources/{}/upload", CLOUD, resource_type))
                    .query_param("prefix", prefix)
                    .query_param("max_results", "1")
                    .header("authorization", BASIC_AUTH);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({ "resources": resources }));
            })
            .await
    }

    /// 画像アップロード成功をモック
    pub async fn mock_image_upload(&self, public_id: &str, secure_url: &str) -> httpmock::Mock<'_> {
        self.server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(format!("/v1_1/{}/image/upload", CLOUD))
                    .body_contains("name=\"public_id\"")
                    .body_contains("name=\"signature\"")
                    .body_contains("c_fill,w_1200,h_628");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "public_id": public_id,
                        "secure_url": secure_url,
                        "resource_type": "image",
                        "format": "png",
                        "version": 1712345678
                    }));
            })
            .await
    }

    /// APIエラーをモック
    pub async fn mock_upload_rejected(&self, status: u16, message: &str) -> httpmock::Mock<'_> {
        self.server
            .mock_async(|when, then| {
                when.method(POST).path(format!("/v1_1/{}/raw/upload", CLOUD));
                then.status(status)
                    .header("content-type", "application/json")
                    .json_body(json!({ "error": { "message": message } }));
            })
            .await
    }
}

#[tokio::test]
async fn test_has_resources_queries_prefix() {
    let mock_server = CloudinaryMockServer::start().await;
    let found = mock_server.mock_prefix_lookup("image", "my-post/", true).await;
    let missing = mock_server.mock_prefix_lookup("image", "my-post_1/", false).await;
    let client = mock_server.client();

    assert!(client.has_resources(ResourceType::Image, "my-post/").await.unwrap());
    assert!(!client.has_resources(ResourceType::Image, "my-post_1/").await.unwrap());

    found.assert_async().await;
    missing.assert_async().await;
}

#[tokio::test]
async fn test_find_resource_by_exact_public_id() {
    let mock_server = CloudinaryMockServer::start().await;
    let found = mock_server
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1_1/demo/resources/image/upload/my-post/cover")
                .header("authorization", BASIC_AUTH);
            then.status(200).json_body(json!({
                "public_id": "my-post/cover",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v3/my-post/cover.png",
                "format": "png",
                "resource_type": "image"
            }));
        })
        .await;
    mock_server
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1_1/demo/resources/image/upload/my-post/cover-new");
            then.status(404)
                .json_body(json!({ "error": { "message": "Resource not found - my-post/cover-new" } }));
        })
        .await;
    let client = mock_server.client();

    let resource = client
        .find_resource(ResourceType::Image, "my-post/cover")
        .await
        .unwrap();
    let missing = client
        .find_resource(ResourceType::Image, "my-post/cover-new")
        .await
        .unwrap();

    found.assert_async().await;
    assert_eq!(resource.map(|r| r.public_id).as_deref(), Some("my-post/cover"));
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_upload_sends_signed_multipart() {
    let mock_server = CloudinaryMockServer::start().await;
    let upload = mock_server
        .mock_image_upload(
            "my-post/cover",
            "https://res.cloudinary.com/demo/image/upload/v1712345678/my-post/cover.png",
        )
        .await;
    let client = mock_server.client();

    let uploaded = client
        .upload(UploadRequest {
            resource_type: ResourceType::Image,
            folder: Some("my-post".to_string()),
            public_id: Some("cover".to_string()),
            file_name: "cover.png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
            transformation: Some(Transformation::fill(1200, 628)),
        })
        .await
        .unwrap();

    upload.assert_async().await;
    assert_eq!(uploaded.public_id, "my-post/cover");
    assert_eq!(uploaded.version, Some(1712345678));
    assert!(uploaded.secure_url.ends_with("/my-post/cover.png"));
}

#[tokio::test]
async fn test_rejection_message_is_extracted() {
    let mock_server = CloudinaryMockServer::start().await;
    mock_server.mock_upload_rejected(401, "Invalid Signature").await;
    let client = mock_server.client();

    let err = client
        .upload(UploadRequest {
            resource_type: ResourceType::Raw,
            folder: None,
            public_id: Some("my-post.md".to_string()),
            file_name: "my-post.md".to_string(),
            bytes: b"# title".to_vec(),
            transformation: None,
        })
        .await
        .unwrap_err();

    match err {
        StoreError::Rejected { status, message, .. } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid Signature");
        }
        other => panic!("想定外のエラー: {:?}", other),
    }
}

#[tokio::test]
async fn test_list_and_ping() {
    let mock_server = CloudinaryMockServer::start().await;
    let listing = mock_server
        .server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v1_1/demo/resources/raw")
                .query_param("type", "upload")
                .query_param("max_results", "50");
            then.status(200).json_body(json!({
                "resources": [
                    {"public_id": "a.md", "secure_url": "https://res.cloudinary.com/demo/raw/upload/v1/a.md", "resource_type": "raw"},
                    {"public_id": "b.md", "secure_url": "https://res.cloudinary.com/demo/raw/upload/v1/b.md", "format": "md", "resource_type": "raw"}
                ]
            }));
        })
        .await;
    mock_server
        .server
        .mock_async(|when, then| {
            when.method(GET).path("/v1_1/demo/ping");
            then.status(200).json_body(json!({"status": "ok"}));
        })
        .await;
    let client = mock_server.client();

    let resources = client.list_resources(ResourceType::Raw, 50).await.unwrap();
    assert_eq!(resources.len(), 2);
    assert_eq!(resources[0].format, None);
    assert_eq!(resources[1].format.as_deref(), Some("md"));
    listing.assert_async().await;

    assert!(client.ping().await.is_ok());
}

#[tokio::test]
async fn test_transport_failure() {
    let client = CloudinaryClient::new(CloudinaryConfig::with_endpoints(
        CLOUD,
        "key",
        "secret",
        "http://127.0.0.1:1",
        "https://res.cloudinary.com",
    ));

    let err = client
        .has_resources(ResourceType::Image, "my-post/")
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Transport { .. }));
}
