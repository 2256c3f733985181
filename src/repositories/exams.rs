use crate::db::models::BaseExam;
use crate::db::{self, DataDir, StoreError};
use crate::services::variants::is_variant_id;

pub(crate) async fn find_by_id(data_dir: &DataDir, id: &str) -> Result<Option<BaseExam>, StoreError> {
    let path = data_dir.exam_file(id)?;
    db::read_json(&path).await
}

pub(crate) async fn save(data_dir: &DataDir, exam: &BaseExam) -> Result<(), StoreError> {
    let path = data_dir.exam_file(&exam.id)?;
    db::write_json_atomic(&path, exam).await
}

/// Every base exam on disk, newest first. Variant snapshots and unreadable files are skipped.
pub(crate) async fn list_all(data_dir: &DataDir) -> Result<Vec<BaseExam>, StoreError> {
    let dir = data_dir.exams_dir();
    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(StoreError::Io { path: dir, source }),
    };

    let mut exams = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if stem.starts_with('.') || is_variant_id(stem) {
            continue;
        }

        match db::read_json::<BaseExam>(&path).await {
            Ok(Some(exam)) => exams.push(exam),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "Skipping unreadable exam file");
            }
        }
    }

    exams.sort_by(|left, right| right.created_at.cmp(&left.created_at).then_with(|| right.id.cmp(&left.id)));
    Ok(exams)
}

pub(crate) async fn find_latest(data_dir: &DataDir) -> Result<Option<BaseExam>, StoreError> {
    Ok(list_all(data_dir).await?.into_iter().next())
}

/// Returns `false` when there was nothing to delete.
pub(crate) async fn delete_by_id(data_dir: &DataDir, id: &str) -> Result<bool, StoreError> {
    let path = data_dir.exam_file(id)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(StoreError::Io { path, source }),
    }
}
