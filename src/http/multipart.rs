use super::response::ApiError;
use crate::domain::asset::IncomingFile;
use axum::extract::multipart::{Multipart, MultipartError};
use std::collections::HashMap;

/// ファイル欄名と受け付ける最大件数
pub type FileFieldLimits<'a> = &'a [(&'a str, usize)];

/// multipartから読み出したファイルとテキスト欄
#[derive(Debug, Default)]
pub struct MultipartForm {
    files: HashMap<String, Vec<IncomingFile>>,
    fields: HashMap<String, String>,
}

impl MultipartForm {
    /// 指定欄の最初のファイルを取り出す
    pub fn take_file(&mut self, name: &str) -> Option<IncomingFile> {
        self.files
            .remove(name)
            .and_then(|files| files.into_iter().next())
    }

    /// 指定欄のファイルを全て取り出す（受信順）
    pub fn take_files(&mut self, name: &str) -> Vec<IncomingFile> {
        self.files.remove(name).unwrap_or_default()
    }

    /// 空白でないテキスト欄の値
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }

    pub fn into_text_fields(self) -> HashMap<String, String> {
        self.fields
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::bad_request(format!("multipartの読み込みに失敗しました: {}", err.body_text()))
}

/// multipartを全て読み込む
///
/// `limits` にないファイル欄や、上限を超えるファイルは400として扱う。
/// テキスト欄はそのまま保持する（同名の欄は後勝ち）。
pub async fn read_multipart(
    multipart: &mut Multipart,
    limits: FileFieldLimits<'_>,
) -> Result<MultipartForm, ApiError> {
    let mut form = MultipartForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
            continue;
        };

        let Some((_, max)) = limits.iter().find(|(field_name, _)| *field_name == name) else {
            return Err(ApiError::bad_request(format!(
                "想定外のファイル欄です: {}",
                name
            )));
        };
        let received = form.files.get(&name).map(|f| f.len()).unwrap_or(0);
        if received >= *max {
            return Err(ApiError::bad_request(format!(
                "{} のファイルは最大{}件までです",
                name, max
            )));
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let bytes = field.bytes().await.map_err(multipart_error)?;
        // 未選択のfile inputは空のファイル名・空の本文で届く
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }
        form.files.entry(name).or_default().push(IncomingFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Ok(form)
}
