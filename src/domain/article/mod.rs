pub mod model;
pub mod repository;
pub mod service;

// 公開APIの再エクスポート
pub use model::{Article, NewArticle};
pub use repository::{find_article_by_slug, insert_article};
pub use service::save_markdown_article;
