pub mod cloudinary;

pub use cloudinary::{AssetStore, CloudinaryClient, MockAssetStore, ResourceType};
