use crate::error::{AppError, AppResult, FileError, IngestionError};
use crate::models::question::{Group, RawBatch};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 读取单个原始数据文件
pub async fn load_raw_batch(path: &Path) -> AppResult<RawBatch> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let batch: RawBatch = serde_json::from_str(&content).map_err(|e| IngestionError::MalformedFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(batch)
}

/// 列出目录下所有 JSON 文件（按文件名排序，保证入库顺序稳定）
pub async fn list_raw_files(folder: &Path) -> AppResult<Vec<PathBuf>> {
    if !fs::try_exists(folder).await.unwrap_or(false) {
        return Err(FileError::DirectoryNotFound {
            path: folder.display().to_string(),
        }
        .into());
    }

    let mut json_files = Vec::new();
    let mut entries = fs::read_dir(folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder.display().to_string(), e))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            json_files.push(path);
        }
    }

    json_files.sort();
    Ok(json_files)
}

/// 读取题库文件
///
/// 文件不存在时返回 `Ok(None)`，由调用方决定是否视为空题库
pub async fn load_group_database(path: &Path) -> AppResult<Option<Vec<Group>>> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let groups: Vec<Group> =
        serde_json::from_str(&content).map_err(|e| FileError::JsonParseFailed {
            path: path.display().to_string(),
            source: e,
        })?;

    Ok(Some(groups))
}

/// 写入题库文件（先写临时文件再改名，避免读到半个文件）
pub async fn save_group_database(path: &Path, groups: &[Group]) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::file_write_failed(parent.display().to_string(), e))?;
        }
    }

    let json = serde_json::to_string_pretty(groups)?;
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, json)
        .await
        .map_err(|e| AppError::file_write_failed(tmp_path.display().to_string(), e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExamType, Question};

    fn sample_group() -> Group {
        Group {
            group_id: "q-1".into(),
            is_set: false,
            section: "QA".into(),
            passage_text: None,
            questions: vec![Question {
                id: "q-1".into(),
                exam_type: ExamType::Cat,
                exam_year: 2021,
                section: "QA".into(),
                topic: "Algebra".into(),
                question_text: "Solve x + 2 = 5".into(),
                options: vec!["1".into(), "3".into()],
                correct_option: Some("3".into()),
                image_url: None,
                context_passage: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_database_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cat_db.json");

        save_group_database(&path, &[sample_group()]).await.unwrap();
        let loaded = load_group_database(&path).await.unwrap().unwrap();

        assert_eq!(loaded, vec![sample_group()]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_database_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_group_database(&dir.path().join("absent.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_list_raw_files_sorted_json_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.json", "a.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }
        let files = list_raw_files(dir.path()).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[tokio::test]
    async fn test_list_raw_files_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_raw_files(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::DirectoryNotFound { .. })));
    }

    #[tokio::test]
    async fn test_malformed_raw_file_is_ingestion_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_raw_batch(&path).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Ingestion(IngestionError::MalformedFile { .. })
        ));
    }
}
