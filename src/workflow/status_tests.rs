use super::status_summary;
use crate::record::{Field, FieldValue, IdentityKey, RecordStore, RowUpdate, Score};

fn key(name: &str) -> IdentityKey {
    IdentityKey {
        commit_hash: name.to_string(),
        message: "fix crash".to_string(),
        file_path: format!("{name}.py"),
        diff: "@@ -1 +1 @@".to_string(),
    }
}

#[test]
fn missing_table_reports_not_started() {
    let dir = tempfile::tempdir().expect("temp dir");
    let summary = status_summary(&dir.path().join("results.csv")).expect("status");
    assert!(!summary.exists);
    assert_eq!(summary.total_rows, 0);
    assert!(summary.missing_by_column.is_empty());
    assert_eq!(summary.next_action(), "rectify run");
}

#[test]
fn counts_follow_absent_fields() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("results.csv");
    let keys = vec![key("a"), key("b"), key("c")];
    let mut store = RecordStore::reconcile(keys.clone(), &path).expect("reconcile results");
    store
        .update(
            &keys[0],
            RowUpdate::new()
                .set(Field::BaselineMessage, FieldValue::Text("fix a".to_string()))
                .set(Field::RectifierScore, FieldValue::Score(Score::from_raw(4))),
        )
        .expect("update a");
    store
        .update(
            &keys[1],
            RowUpdate::new().set(Field::BaselineMessage, FieldValue::Text("fix b".to_string())),
        )
        .expect("update b");
    store.flush().expect("flush");

    let summary = status_summary(&path).expect("status");

    assert!(summary.exists);
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.complete, 1);
    assert_eq!(summary.needing_baseline, 1);
    assert_eq!(summary.needing_analysis, 2);
    assert_eq!(summary.next_action(), "rectify run");
    assert_eq!(summary.missing_by_column["Baseline_Message"], 1);
    assert_eq!(summary.missing_by_column["Rectifier_Score"], 2);
    assert_eq!(summary.missing_by_column["Developer_Score"], 3);
}
