use crate::infra::api::cloudinary::{AssetStore, ResourceType};
use crate::types::{ServiceError, ServiceResult};

/// 存在確認に使うプレフィックスを組み立てる
///
/// ファイル名がない場合も末尾に区切りを付け、`slug` が `slug_1/...` に一致しないようにする。
pub fn resource_prefix(folder: &str, file_name: Option<&str>) -> String {
    let folder = folder.trim_end_matches('/');
    match file_name {
        Some(name) => format!("{}/{}", folder, name),
        None => format!("{}/", folder),
    }
}

/// リモートストアの指定フォルダ（とファイル名）に既存リソースがあるかを確認する
///
/// ファイル名があれば`folder/name`と完全一致するpublic_idだけを既存とみなす。
/// `cover` が `cover-old` に、`s` が `sections/...` に一致することはない。
/// ファイル名がなければフォルダ配下に1件でもあれば既存とする。
///
/// ストアの失敗は全て`ServiceError::ExistenceCheck`として返す。
/// 「存在しない」と「問い合わせ不能」は区別しない。
pub async fn asset_exists(
    store: &dyn AssetStore,
    resource_type: ResourceType,
    folder: &str,
    file_name: Option<&str>,
) -> ServiceResult<bool> {
    if folder.trim().is_empty() {
        return Err(ServiceError::invalid_input("フォルダパスが空です"));
    }
    let path = resource_prefix(folder, file_name);

    let result = match file_name {
        Some(_) => store
            .find_resource(resource_type, &path)
            .await
            .map(|found| found.is_some()),
        None => store.has_resources(resource_type, &path).await,
    };
    result.map_err(|e| ServiceError::existence_check(path, e))
}
