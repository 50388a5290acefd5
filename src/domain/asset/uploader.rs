use super::existence::asset_exists;
use super::model::{
    AssetBatch, IncomingFile, UploadOutcome, MAX_SECTION_IMAGES, SECTIONS_SUBFOLDER,
    SECTION_IMAGE_TRANSFORMATION, TITLE_IMAGE_TRANSFORMATION,
};
use crate::infra::api::cloudinary::{AssetStore, ResourceType, Transformation, UploadRequest};
use crate::types::{ServiceError, ServiceResult};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use tracing::{debug, info};

/// 1アセット分の配置先
struct AssetTarget<'a> {
    /// 存在確認と配信URLに使う種別
    resource_type: ResourceType,
    /// アップロード時に指定する種別。画像はCloudinary側の推定に任せる
    upload_type: ResourceType,
    folder: String,
    public_id: String,
    file: &'a IncomingFile,
    transformation: Option<Transformation>,
}

/// 既存ならURLを合成し、なければアップロードしてURLを返す
async fn resolve_asset(store: &dyn AssetStore, target: AssetTarget<'_>) -> ServiceResult<String> {
    let exists = asset_exists(
        store,
        target.resource_type,
        &target.folder,
        Some(&target.public_id),
    )
    .await?;

    if exists {
        // 既存アセットは再取得せず、規約どおりのURLを組み立てる
        let path = format!("{}/{}", target.folder, target.file.file_name);
        debug!(%path, "既存アセットを再利用します");
        return Ok(store.delivery_url(target.resource_type, &path));
    }

    let full_public_id = format!("{}/{}", target.folder, target.public_id);
    let request = UploadRequest {
        resource_type: target.upload_type,
        folder: Some(target.folder),
        public_id: Some(target.public_id),
        file_name: target.file.file_name.clone(),
        bytes: target.file.bytes.clone(),
        transformation: target.transformation,
    };
    let uploaded = store
        .upload(request)
        .await
        .map_err(|e| ServiceError::upload(full_public_id, e))?;

    debug!(public_id = %uploaded.public_id, "アップロード完了");
    Ok(uploaded.secure_url)
}

/// 記事のタイトル画像・セクション画像・Markdownをリモートストアに配置する
///
/// ## 動作
/// - タイトル画像: `<slug>/` に1200x628 fillでアップロード
/// - セクション画像: `<slug>/sections/` に800x600 fillでアップロード。
///   最大`concurrency`件を並行処理し、結果は入力順に並べる
/// - Markdown: `<slug>/` にrawとしてアップロード
/// - 既に同名のアセットがあればアップロードせずURLを合成する
///
/// ## エラー
/// 最初に失敗したアセットのエラーを返す。それまでに完了したアップロードは取り消さない。
pub async fn upload_article_assets(
    store: &dyn AssetStore,
    slug: &str,
    batch: &AssetBatch,
    concurrency: usize,
) -> ServiceResult<UploadOutcome> {
    let slug = slug.trim();
    if slug.is_empty() {
        return Err(ServiceError::invalid_input("スラッグが空です"));
    }
    if !batch.has_images() {
        return Err(ServiceError::invalid_input("画像が1つも含まれていません"));
    }
    if batch.section_images.len() > MAX_SECTION_IMAGES {
        return Err(ServiceError::invalid_input(format!(
            "セクション画像は最大{}件までです",
            MAX_SECTION_IMAGES
        )));
    }

    info!(
        %slug,
        sections = batch.section_images.len(),
        title = batch.title_image.is_some(),
        markdown = batch.markdown.is_some(),
        "記事アセットの配置を開始します"
    );

    let image_title_url = match &batch.title_image {
        Some(file) => Some(
            resolve_asset(
                store,
                AssetTarget {
                    resource_type: ResourceType::Image,
                    upload_type: ResourceType::Auto,
                    folder: slug.to_string(),
                    public_id: file.stem(),
                    file,
                    transformation: Some(TITLE_IMAGE_TRANSFORMATION),
                },
            )
            .await?,
        ),
        None => None,
    };

    let secure_urls = upload_section_images(store, slug, &batch.section_images, concurrency).await?;

    let markdown_url = match &batch.markdown {
        Some(file) => Some(
            resolve_asset(
                store,
                AssetTarget {
                    resource_type: ResourceType::Raw,
                    upload_type: ResourceType::Raw,
                    folder: slug.to_string(),
                    public_id: file.file_name.clone(),
                    file,
                    transformation: None,
                },
            )
            .await?,
        ),
        None => None,
    };

    info!(%slug, "記事アセットの配置が完了しました");
    Ok(UploadOutcome {
        secure_urls,
        image_title_url,
        markdown_url,
        slug: slug.to_string(),
    })
}

/// セクション画像を最大`concurrency`件ずつ並行処理する
///
/// 完了順ではなく入力時のインデックスで結果を並べる。
async fn upload_section_images(
    store: &dyn AssetStore,
    slug: &str,
    files: &[IncomingFile],
    concurrency: usize,
) -> ServiceResult<Vec<String>> {
    let folder = format!("{}/{}", slug, SECTIONS_SUBFOLDER);
    let mut slots: Vec<Option<String>> = vec![None; files.len()];

    // 各FutureはSendなBoxFutureとして先に組み立てる
    let tasks: Vec<BoxFuture<'_, ServiceResult<(usize, String)>>> = files
        .iter()
        .enumerate()
        .map(|(index, file)| {
            let target = AssetTarget {
                resource_type: ResourceType::Image,
                upload_type: ResourceType::Auto,
                folder: folder.clone(),
                public_id: file.stem(),
                file,
                transformation: Some(SECTION_IMAGE_TRANSFORMATION),
            };
            async move { resolve_asset(store, target).await.map(|url| (index, url)) }.boxed()
        })
        .collect();
    let mut pending = stream::iter(tasks).buffer_unordered(concurrency.max(1));

    while let Some(result) = pending.next().await {
        // 失敗した時点でストリームを破棄し、処理中のアップロードも打ち切る
        let (index, url) = result?;
        slots[index] = Some(url);
    }

    Ok(slots.into_iter().flatten().collect())
}
