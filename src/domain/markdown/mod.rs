pub mod model;
pub mod repository;
pub mod service;

// 公開APIの再エクスポート
pub use model::{MarkdownDocument, NewMarkdownDocument};
pub use repository::{insert_markdown_document, list_markdown_documents};
pub use service::{list_markdown_resources, upload_markdown_document, ARTICLE_LISTING_LIMIT};
