pub mod article;
pub mod asset;
pub mod markdown;
