use crate::types::{CloudinaryConfig, SignatureAlgorithm, StoreError, StoreResult};
use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// 既存アセットの配信URLを合成する際に使う固定バージョン
pub const FIXED_VERSION_SEGMENT: &str = "v1";

/// Cloudinaryのリソース種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Image,
    Raw,
    /// アップロード時にCloudinary側で推定させる
    Auto,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Raw => "raw",
            ResourceType::Auto => "auto",
        }
    }
}

/// アップロード時に適用する固定変換（crop = fill）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformation {
    pub width: u32,
    pub height: u32,
}

impl Transformation {
    pub const fn fill(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Upload APIの`transformation`パラメータ表現
    pub fn to_param(&self) -> String {
        format!("c_fill,w_{},h_{}", self.width, self.height)
    }
}

/// 1ファイル分のアップロード要求
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub resource_type: ResourceType,
    pub folder: Option<String>,
    /// 未指定の場合はCloudinaryが採番する
    pub public_id: Option<String>,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub transformation: Option<Transformation>,
}

impl UploadRequest {
    /// フォルダを含む完全なpublic_id（指定がある場合のみ）
    pub fn full_public_id(&self) -> Option<String> {
        let public_id = self.public_id.as_deref()?;
        Some(match self.folder.as_deref() {
            Some(folder) if !folder.is_empty() => format!("{}/{}", folder, public_id),
            _ => public_id.to_string(),
        })
    }
}

/// アップロード成功時にストアが返す情報
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedAsset {
    pub public_id: String,
    pub secure_url: String,
    pub resource_type: Option<String>,
    pub format: Option<String>,
    pub version: Option<u64>,
}

/// 一覧取得で返されるリソース
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResource {
    pub public_id: String,
    pub secure_url: String,
    pub format: Option<String>,
    pub resource_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResourceListResponse {
    #[serde(default)]
    resources: Vec<StoredResource>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// リモートアセットストアの抽象化トレイト
///
/// 本番ではCloudinaryのREST APIを、テストでは`MockAssetStore`を注入する。
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// 指定プレフィックス配下にリソースが1件以上あるかを返す
    async fn has_resources(&self, resource_type: ResourceType, prefix: &str) -> StoreResult<bool>;

    /// public_idが完全一致するリソースを取得する。なければ`None`
    async fn find_resource(
        &self,
        resource_type: ResourceType,
        public_id: &str,
    ) -> StoreResult<Option<StoredResource>>;

    /// ファイルをアップロードする
    async fn upload(&self, request: UploadRequest) -> StoreResult<UploadedAsset>;

    /// リソース一覧を取得する（最大`max_results`件）
    async fn list_resources(
        &self,
        resource_type: ResourceType,
        max_results: u32,
    ) -> StoreResult<Vec<StoredResource>>;

    /// 疎通確認
    async fn ping(&self) -> StoreResult<()>;

    /// 既存アセットの配信URLを規約から合成する
    fn delivery_url(&self, resource_type: ResourceType, path: &str) -> String;
}

/// 署名対象パラメータからUpload API用の署名を生成する
///
/// キー順に`k=v`を`&`で連結し、末尾にAPIシークレットを付けてハッシュを取る。
pub fn sign_params(
    params: &[(&str, String)],
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let payload = format!("{}{}", to_sign, api_secret);
    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(Sha256::digest(payload.as_bytes())),
    }
}

fn build_delivery_url(
    config: &CloudinaryConfig,
    resource_type: ResourceType,
    path: &str,
) -> String {
    let segment = match resource_type {
        ResourceType::Raw => "raw",
        ResourceType::Image | ResourceType::Auto => "image",
    };
    format!(
        "{}/{}/{}/upload/{}/{}",
        config.delivery_base, config.cloud_name, segment, FIXED_VERSION_SEGMENT, path
    )
}

/// `reqwest` を使用したCloudinaryクライアント実装
pub struct CloudinaryClient {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{}",
            self.config.api_base, self.config.cloud_name, path
        )
    }

    /// ステータスを確認してからJSONとして読み込む
    async fn read_json<T: DeserializeOwned>(operation: &str, response: Response) -> StoreResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            return Err(StoreError::rejected(operation, status.as_u16(), message));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::decode(operation, e))
    }
}

#[async_trait]
impl AssetStore for CloudinaryClient {
    async fn has_resources(&self, resource_type: ResourceType, prefix: &str) -> StoreResult<bool> {
        let operation = "リソース存在確認";
        let url = self.endpoint(&format!("resources/{}/upload", resource_type.as_str()));
        debug!(%prefix, resource_type = resource_type.as_str(), "存在確認を問い合わせます");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[("prefix", prefix), ("max_results", "1")])
            .send()
            .await
            .map_err(|e| StoreError::transport(operation, e))?;

        let listing: ResourceListResponse = Self::read_json(operation, response).await?;
        Ok(!listing.resources.is_empty())
    }

    async fn find_resource(
        &self,
        resource_type: ResourceType,
        public_id: &str,
    ) -> StoreResult<Option<StoredResource>> {
        let operation = "リソース取得";
        let url = self.endpoint(&format!(
            "resources/{}/upload/{}",
            resource_type.as_str(),
            public_id
        ));
        debug!(%public_id, resource_type = resource_type.as_str(), "public_idで問い合わせます");

        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::transport(operation, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read_json(operation, response).await.map(Some)
    }

    async fn upload(&self, request: UploadRequest) -> StoreResult<UploadedAsset> {
        let operation = "アップロード";
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut signed: Vec<(&str, String)> = vec![("timestamp", timestamp)];
        if let Some(folder) = &request.folder {
            signed.push(("folder", folder.clone()));
        }
        if let Some(public_id) = &request.public_id {
            signed.push(("public_id", public_id.clone()));
        }
        if let Some(transformation) = &request.transformation {
            signed.push(("transformation", transformation.to_param()));
        }
        let signature = sign_params(
            &signed,
            &self.config.api_secret,
            self.config.signature_algorithm,
        );

        let file_part =
            multipart::Part::bytes(request.bytes).file_name(request.file_name.clone());
        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (key, value) in signed {
            form = form.text(key, value);
        }

        let url = self.endpoint(&format!("{}/upload", request.resource_type.as_str()));
        debug!(file_name = %request.file_name, "アップロードを開始します");
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::transport(operation, e))?;

        Self::read_json(operation, response).await
    }

    async fn list_resources(
        &self,
        resource_type: ResourceType,
        max_results: u32,
    ) -> StoreResult<Vec<StoredResource>> {
        let operation = "リソース一覧取得";
        let url = self.endpoint(&format!("resources/{}", resource_type.as_str()));
        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .query(&[("type", "upload".to_string()), ("max_results", max_results.to_string())])
            .send()
            .await
            .map_err(|e| StoreError::transport(operation, e))?;

        let listing: ResourceListResponse = Self::read_json(operation, response).await?;
        Ok(listing.resources)
    }

    async fn ping(&self) -> StoreResult<()> {
        let operation = "疎通確認";
        let response = self
            .client
            .get(self.endpoint("ping"))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(|e| StoreError::transport(operation, e))?;

        let _: serde_json::Value = Self::read_json(operation, response).await?;
        Ok(())
    }

    fn delivery_url(&self, resource_type: ResourceType, path: &str) -> String {
        build_delivery_url(&self.config, resource_type, path)
    }
}

/// テスト用のインメモリアセットストア
///
/// 実際のHTTP通信を行わず、既存リソースの集合に対して存在確認とアップロードを行う。
/// 呼び出し内容を記録するので、リモート呼び出しの有無や順序を検証できる。
pub struct MockAssetStore {
    config: CloudinaryConfig,
    existing: Mutex<HashSet<(ResourceType, String)>>,
    listing: Vec<StoredResource>,
    existence_checks: Mutex<Vec<String>>,
    uploads: Mutex<Vec<UploadRequest>>,
    upload_delays: HashMap<String, Duration>,
    failing_uploads: HashMap<String, String>,
    check_error: Option<String>,
    listing_error: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockAssetStore {
    /// 空のストアを作成
    pub fn new() -> Self {
        Self {
            config: CloudinaryConfig::with_endpoints(
                "demo",
                "mock-key",
                "mock-secret",
                "http://127.0.0.1:0",
                "https://res.cloudinary.com",
            ),
            existing: Mutex::new(HashSet::new()),
            listing: Vec::new(),
            existence_checks: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            upload_delays: HashMap::new(),
            failing_uploads: HashMap::new(),
            check_error: None,
            listing_error: None,
        }
    }

    /// 既存リソースを登録（`folder/public_id` 形式）
    pub fn with_existing(self, resource_type: ResourceType, public_id: &str) -> Self {
        lock(&self.existing).insert((resource_type, public_id.to_string()));
        self
    }

    /// 一覧取得で返すリソースを設定
    pub fn with_listing(mut self, resources: Vec<StoredResource>) -> Self {
        self.listing = resources;
        self
    }

    /// 指定public_idのアップロードに遅延を入れる
    pub fn with_upload_delay(mut self, full_public_id: &str, delay: Duration) -> Self {
        self.upload_delays.insert(full_public_id.to_string(), delay);
        self
    }

    /// 指定public_idのアップロードを失敗させる
    pub fn with_failing_upload(mut self, full_public_id: &str, message: &str) -> Self {
        self.failing_uploads
            .insert(full_public_id.to_string(), message.to_string());
        self
    }

    /// 存在確認を全て失敗させる
    pub fn with_check_error(mut self, message: &str) -> Self {
        self.check_error = Some(message.to_string());
        self
    }

    /// 一覧取得を失敗させる
    pub fn with_listing_error(mut self, message: &str) -> Self {
        self.listing_error = Some(message.to_string());
        self
    }

    /// 記録されたアップロード要求（完了順）
    pub fn uploads(&self) -> Vec<UploadRequest> {
        lock(&self.uploads).clone()
    }

    /// 記録された存在確認の問い合わせ（プレフィックスまたはpublic_id）
    pub fn existence_checks(&self) -> Vec<String> {
        lock(&self.existence_checks).clone()
    }

    /// リモート呼び出しの総数
    pub fn remote_call_count(&self) -> usize {
        lock(&self.uploads).len() + lock(&self.existence_checks).len()
    }
}

impl Default for MockAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for MockAssetStore {
    async fn has_resources(&self, resource_type: ResourceType, prefix: &str) -> StoreResult<bool> {
        lock(&self.existence_checks).push(prefix.to_string());
        if let Some(message) = &self.check_error {
            return Err(StoreError::rejected("リソース存在確認", 500, message.clone()));
        }
        let existing = lock(&self.existing);
        Ok(existing.iter().any(|(kind, id)| {
            (resource_type == ResourceType::Auto || *kind == resource_type) && id.starts_with(prefix)
        }))
    }

    async fn find_resource(
        &self,
        resource_type: ResourceType,
        public_id: &str,
    ) -> StoreResult<Option<StoredResource>> {
        lock(&self.existence_checks).push(public_id.to_string());
        if let Some(message) = &self.check_error {
            return Err(StoreError::rejected("リソース取得", 500, message.clone()));
        }
        let existing = lock(&self.existing);
        Ok(existing
            .iter()
            .find(|(kind, id)| *kind == resource_type && id == public_id)
            .map(|(kind, id)| StoredResource {
                public_id: id.clone(),
                secure_url: build_delivery_url(&self.config, *kind, id),
                format: None,
                resource_type: Some(kind.as_str().to_string()),
            }))
    }

    async fn upload(&self, request: UploadRequest) -> StoreResult<UploadedAsset> {
        let full_public_id = request
            .full_public_id()
            .unwrap_or_else(|| request.file_name.clone());

        if let Some(delay) = self.upload_delays.get(&full_public_id) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.failing_uploads.get(&full_public_id) {
            return Err(StoreError::rejected("アップロード", 400, message.clone()));
        }

        let resource_type = match request.resource_type {
            ResourceType::Auto => ResourceType::Image,
            other => other,
        };
        let format = request
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_string());
        let path = match (resource_type, &format) {
            (ResourceType::Image, Some(ext)) => format!("{}.{}", full_public_id, ext),
            _ => full_public_id.clone(),
        };
        let version = {
            let mut uploads = lock(&self.uploads);
            uploads.push(request);
            1_700_000_000 + uploads.len() as u64
        };
        lock(&self.existing).insert((resource_type, full_public_id.clone()));

        Ok(UploadedAsset {
            secure_url: format!(
                "{}/{}/{}/upload/v{}/{}",
                self.config.delivery_base,
                self.config.cloud_name,
                resource_type.as_str(),
                version,
                path
            ),
            public_id: full_public_id,
            resource_type: Some(resource_type.as_str().to_string()),
            format,
            version: Some(version),
        })
    }

    async fn list_resources(
        &self,
        _resource_type: ResourceType,
        max_results: u32,
    ) -> StoreResult<Vec<StoredResource>> {
        if let Some(message) = &self.listing_error {
            return Err(StoreError::rejected("リソース一覧取得", 500, message.clone()));
        }
        Ok(self
            .listing
            .iter()
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn delivery_url(&self, resource_type: ResourceType, path: &str) -> String {
        build_delivery_url(&self.config, resource_type, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transformation_param() {
        assert_eq!(Transformation::fill(1200, 628).to_param(), "c_fill,w_1200,h_628");
        assert_eq!(Transformation::fill(800, 600).to_param(), "c_fill,w_800,h_600");
    }

    #[test]
    fn test_sign_params_sorted_and_stable() {
        let a = sign_params(
            &[
                ("timestamp", "1700000000".to_string()),
                ("folder", "my-post".to_string()),
            ],
            "secret",
            SignatureAlgorithm::Sha1,
        );
        let b = sign_params(
            &[
                ("folder", "my-post".to_string()),
                ("timestamp", "1700000000".to_string()),
            ],
            "secret",
            SignatureAlgorithm::Sha1,
        );
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }

    #[test]
    fn test_sign_params_matches_cloudinary_reference() {
        // Cloudinaryのドキュメントにある署名例
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];

        assert_eq!(
            sign_params(&params, "abcd", SignatureAlgorithm::Sha1),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
        assert_eq!(
            sign_params(&params, "abcd", SignatureAlgorithm::Sha256),
            "cc927e1290f9e3ae4c1a741eda21a4630b4ce80f9ce0bc0296337d25cf40f91e"
        );
    }

    #[test]
    fn test_delivery_url_uses_fixed_version() {
        let store = MockAssetStore::new();
        assert_eq!(
            store.delivery_url(ResourceType::Image, "my-post/cover.png"),
            "https://res.cloudinary.com/demo/image/upload/v1/my-post/cover.png"
        );
        assert_eq!(
            store.delivery_url(ResourceType::Raw, "my-post.md"),
            "https://res.cloudinary.com/demo/raw/upload/v1/my-post.md"
        );
    }

    #[tokio::test]
    async fn test_mock_store_prefix_match() {
        let store = MockAssetStore::new().with_existing(ResourceType::Image, "my-post/cover");

        assert!(store.has_resources(ResourceType::Image, "my-post/").await.unwrap());
        assert!(!store.has_resources(ResourceType::Raw, "my-post/").await.unwrap());
        assert!(!store.has_resources(ResourceType::Image, "my-post_1/").await.unwrap());
        assert_eq!(store.existence_checks().len(), 3);
    }

    #[tokio::test]
    async fn test_mock_store_upload_registers_resource() {
        let store = MockAssetStore::new();
        let uploaded = store
            .upload(UploadRequest {
                resource_type: ResourceType::Image,
                folder: Some("my-post".to_string()),
                public_id: Some("cover".to_string()),
                file_name: "cover.png".to_string(),
                bytes: vec![1, 2, 3],
                transformation: Some(Transformation::fill(1200, 628)),
            })
            .await
            .unwrap();

        assert_eq!(uploaded.public_id, "my-post/cover");
        assert!(uploaded.secure_url.ends_with("/my-post/cover.png"));
        assert!(store.has_resources(ResourceType::Image, "my-post/cover").await.unwrap());
        assert!(store
            .find_resource(ResourceType::Image, "my-post/cover")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_mock_store_find_requires_exact_public_id() {
        let store = MockAssetStore::new().with_existing(ResourceType::Image, "my-post/cover-old");

        let missing = store.find_resource(ResourceType::Image, "my-post/cover").await.unwrap();
        let found = store
            .find_resource(ResourceType::Image, "my-post/cover-old")
            .await
            .unwrap();

        assert!(missing.is_none());
        assert_eq!(found.map(|r| r.public_id).as_deref(), Some("my-post/cover-old"));
    }
}
