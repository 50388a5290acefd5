pub mod existence;
pub mod model;
pub mod slug;
pub mod uploader;

// 公開APIの再エクスポート
pub use existence::{asset_exists, resource_prefix};
pub use model::{
    ArticleResource, AssetBatch, IncomingFile, UploadOutcome, MAX_SECTION_IMAGES,
    SECTION_IMAGE_TRANSFORMATION, TITLE_IMAGE_TRANSFORMATION,
};
pub use slug::{generate_unique_slug, SlugResolution};
pub use uploader::upload_article_assets;
