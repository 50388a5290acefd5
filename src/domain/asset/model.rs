use crate::infra::api::cloudinary::Transformation;
use serde::Serialize;
use std::path::Path;

/// タイトル画像に適用する変換
pub const TITLE_IMAGE_TRANSFORMATION: Transformation = Transformation::fill(1200, 628);
/// セクション画像に適用する変換
pub const SECTION_IMAGE_TRANSFORMATION: Transformation = Transformation::fill(800, 600);
/// セクション画像を置くサブフォルダ
pub const SECTIONS_SUBFOLDER: &str = "sections";
/// 1リクエストで受け付けるセクション画像の上限
pub const MAX_SECTION_IMAGES: usize = 10;

/// リクエストで受け取ったファイル（メモリ上のバッファ）
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new<N: Into<String>>(file_name: N, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// 拡張子を除いたファイル名（画像のpublic_idに使う）
    pub fn stem(&self) -> String {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.file_name)
            .to_string()
    }
}

/// 記事1件分のアップロード対象
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetBatch {
    pub title_image: Option<IncomingFile>,
    pub section_images: Vec<IncomingFile>,
    pub markdown: Option<IncomingFile>,
}

impl AssetBatch {
    /// 画像が1つ以上含まれているか
    pub fn has_images(&self) -> bool {
        self.title_image.is_some() || !self.section_images.is_empty()
    }
}

/// アップロード結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    /// セクション画像のURL（入力順）
    pub secure_urls: Vec<String>,
    pub image_title_url: Option<String>,
    pub markdown_url: Option<String>,
    pub slug: String,
}

/// 一覧表示用のリモートリソース
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleResource {
    pub public_id: String,
    pub url: String,
    pub format: Option<String>,
}
