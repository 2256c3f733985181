use std::collections::BTreeMap;

use crate::db::models::ResultRecord;
use crate::db::{self, DataDir, StoreError};

type ResultsByClass = BTreeMap<String, Vec<ResultRecord>>;

/// Replaces the student's previous result in the class, or appends a new one.
///
/// Callers serialize concurrent writers through `AppState::results_lock`.
pub(crate) async fn upsert_for_class(
    data_dir: &DataDir,
    class_name: &str,
    record: ResultRecord,
) -> Result<(), StoreError> {
    let path = data_dir.results_file();
    let mut results: ResultsByClass = db::read_json(&path).await?.unwrap_or_default();

    let class_results = results.entry(class_name.to_string()).or_default();
    match class_results.iter_mut().find(|existing| existing.id == record.id) {
        Some(existing) => *existing = record,
        None => class_results.push(record),
    }

    db::write_json_atomic(&path, &results).await
}

pub(crate) async fn list_for_class(
    data_dir: &DataDir,
    class_name: &str,
) -> Result<Vec<ResultRecord>, StoreError> {
    let results: ResultsByClass = db::read_json(&data_dir.results_file()).await?.unwrap_or_default();
    Ok(results.get(class_name).cloned().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::types::SubmissionStatus;

    fn record(id: &str, score: Option<f64>) -> ResultRecord {
        ResultRecord {
            id: id.to_string(),
            name: format!("Học sinh {id}"),
            email: String::new(),
            dob: String::new(),
            exam_id: Some("exam_1".to_string()),
            score,
            violations: 0,
            submitted_at: "2025-01-02T10:20:30Z".to_string(),
            status: SubmissionStatus::Submitted,
            answers: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn upsert_replaces_same_student_and_keeps_classes_apart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_dir = DataDir::for_tests(dir.path());

        upsert_for_class(&data_dir, "10A1", record("s1", Some(5.0))).await.expect("first");
        upsert_for_class(&data_dir, "10A1", record("s2", Some(7.5))).await.expect("second");
        upsert_for_class(&data_dir, "10A1", record("s1", Some(9.0))).await.expect("resubmit");
        upsert_for_class(&data_dir, "10A2", record("s1", None)).await.expect("other class");

        let class_a = list_for_class(&data_dir, "10A1").await.expect("list");
        let scores: Vec<_> = class_a.iter().map(|r| (r.id.as_str(), r.score)).collect();
        assert_eq!(scores, vec![("s1", Some(9.0)), ("s2", Some(7.5))]);

        let class_b = list_for_class(&data_dir, "10A2").await.expect("list");
        assert_eq!(class_b.len(), 1);
        assert!(list_for_class(&data_dir, "12C").await.expect("list").is_empty());
    }
}
