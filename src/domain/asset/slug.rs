use super::existence::asset_exists;
use crate::infra::api::cloudinary::{AssetStore, ResourceType};
use crate::types::{ServiceError, ServiceResult};
use serde::Serialize;
use tracing::debug;

/// スラッグ確認の結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugResolution {
    /// 元のスラッグが既に使われていたか
    pub exists: bool,
    /// 呼び出し時点で空いているスラッグ
    pub unique_slug: String,
}

/// リモートストア上で未使用のスラッグを求める
///
/// `base` が使われていれば `base_1`, `base_2`, ... の順に空きを探す。
/// 判定はリモートストアの画像フォルダのみで行い、DBのslug列は見ない。
/// 呼び出し後に他のリクエストが同じスラッグを取る可能性は残る。
pub async fn generate_unique_slug(
    store: &dyn AssetStore,
    base: &str,
    max_attempts: u32,
) -> ServiceResult<SlugResolution> {
    let base = base.trim();
    if base.is_empty() {
        return Err(ServiceError::invalid_input("スラッグが空です"));
    }

    let mut candidate = base.to_string();
    let mut lookups: u32 = 0;

    loop {
        if !asset_exists(store, ResourceType::Image, &candidate, None).await? {
            return Ok(SlugResolution {
                exists: lookups > 0,
                unique_slug: candidate,
            });
        }
        lookups += 1;
        // `max_attempts` は問い合わせ回数の上限（元のスラッグを含む）
        if lookups >= max_attempts {
            return Err(ServiceError::SlugExhausted {
                base: base.to_string(),
                attempts: lookups,
            });
        }
        debug!(%candidate, "スラッグが使用済みのため次の候補を試します");
        candidate = format!("{}_{}", base, lookups);
    }
}
