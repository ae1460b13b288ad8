use super::{Origin, RecordStore};
use crate::record::schema::COLUMNS;
use crate::record::{Field, FieldValue, IdentityKey, ImprovementCategory, RowUpdate, Score};

fn key(hash: &str, file: &str) -> IdentityKey {
    IdentityKey {
        commit_hash: hash.to_string(),
        message: format!("fix bug in {file}"),
        file_path: file.to_string(),
        diff: format!("@@ -1 +1 @@\n-old {file}\n+new {file}\n"),
    }
}

fn scored(score: u8) -> RowUpdate {
    RowUpdate::new()
        .set(Field::RectifiedMessage, FieldValue::Text("fix: handle empty input".to_string()))
        .set(Field::RectifierScore, FieldValue::Score(Score::from_raw(i64::from(score))))
        .set(
            Field::ImprovementCategory,
            FieldValue::Category(ImprovementCategory::Clarity),
        )
}

#[test]
fn cold_start_initializes_every_derived_field_absent() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");

    let store = RecordStore::reconcile(vec![key("a1", "a.py"), key("b2", "b.py")], &path)
        .expect("reconcile results");

    assert_eq!(store.origin(), Origin::ColdStart);
    assert_eq!(store.len(), 2);
    for field in Field::ALL {
        assert_eq!(store.rows_needing(field).count(), 2, "{field} should be absent");
    }
}

#[test]
fn reconcile_drops_duplicate_fresh_keys() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");

    let store = RecordStore::reconcile(
        vec![key("a1", "a.py"), key("a1", "a.py"), key("b2", "b.py")],
        &path,
    )
    .expect("reconcile results");

    assert_eq!(store.len(), 2);
    let files: Vec<_> = store
        .items()
        .iter()
        .map(|item| item.key.file_path.as_str())
        .collect();
    assert_eq!(files, vec!["a.py", "b.py"]);
}

#[test]
fn reconcile_against_own_checkpoint_is_idempotent() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    let rows = vec![key("a1", "a.py"), key("b2", "b.py")];

    let mut store = RecordStore::reconcile(rows.clone(), &path).expect("reconcile results");
    store.update(&rows[0], scored(4)).expect("update row");
    store.flush().expect("flush");

    let resumed = RecordStore::reconcile(rows.clone(), &path).expect("reconcile results");
    assert_eq!(resumed.origin(), Origin::Resumed);
    assert_eq!(resumed.len(), 2);
    let first = resumed.get(&rows[0]).expect("first row present");
    assert_eq!(first.rectifier_score, Some(Score::from_raw(4)));
    assert_eq!(
        first.rectified_message.as_deref(),
        Some("fix: handle empty input")
    );
    assert_eq!(first.improvement_category, Some(ImprovementCategory::Clarity));
    assert!(resumed.get(&rows[1]).expect("second row").rectifier_score.is_none());

    resumed.flush().expect("flush again");
    let again = RecordStore::reconcile(rows, &path).expect("reconcile results");
    assert_eq!(again.items(), resumed.items());
}

#[test]
fn reconcile_keeps_prior_rows_that_were_not_mined() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    let old = key("old", "old.py");

    let mut store = RecordStore::reconcile(vec![old.clone()], &path).expect("reconcile results");
    store.update(&old, scored(3)).expect("update");
    store.flush().expect("flush");

    let resumed = RecordStore::reconcile(vec![key("new", "new.py")], &path)
        .expect("reconcile results");
    let files: Vec<_> = resumed
        .items()
        .iter()
        .map(|item| item.key.file_path.as_str())
        .collect();
    assert_eq!(files, vec!["new.py", "old.py"]);
    assert_eq!(
        resumed.get(&old).and_then(|item| item.rectifier_score),
        Some(Score::from_raw(3))
    );
}

#[test]
fn corrupt_checkpoint_is_moved_aside_before_a_cold_start() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    let junk = "not,a,results\ntable\"with\"junk\n";
    std::fs::write(&path, junk).expect("write junk");

    let store = RecordStore::reconcile(vec![key("a1", "a.py")], &path).expect("reconcile results");

    assert_eq!(store.origin(), Origin::ColdStart);
    assert_eq!(store.rows_needing(Field::RectifierScore).count(), 1);
    assert!(!path.exists());
    let aside = dir.path().join("results.csv.corrupt");
    assert_eq!(std::fs::read_to_string(&aside).expect("read set-aside table"), junk);

    // A second unreadable table does not clobber the first one.
    std::fs::write(&path, junk).expect("write junk again");
    RecordStore::reconcile(vec![key("a1", "a.py")], &path).expect("reconcile again");
    assert!(aside.exists());
    assert!(dir.path().join("results.csv.corrupt.1").exists());
}

#[test]
fn out_of_range_scores_read_back_as_unscored_and_keep_rows() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    let mut text = COLUMNS.join(",");
    text.push('\n');
    text.push_str("a1,fix,a.py,diff,fix: a,fix(a): guard,4,ok,3,fine,5,sharp,clarity,reads well\n");
    text.push_str("b2,fix,b.py,diff,fix: b,fix(b): guard,,,,,7,,,\n");
    text.push_str("c3,fix,c.py,diff,,,-2,,1e9,,,,,\n");
    std::fs::write(&path, text).expect("write table");
    let rows = vec![key("a1", "a.py"), key("b2", "b.py"), key("c3", "c.py")];

    let store = RecordStore::reconcile(rows.clone(), &path).expect("reconcile results");

    assert_eq!(store.origin(), Origin::Resumed);
    assert!(!dir.path().join("results.csv.corrupt").exists());
    let first = store.get(&rows[0]).expect("first row");
    assert_eq!(first.rectifier_score, Some(Score::from_raw(5)));
    assert_eq!(first.rectified_message.as_deref(), Some("fix(a): guard"));
    let second = store.get(&rows[1]).expect("second row");
    assert_eq!(second.rectifier_score, Some(Score::UNSCORED));
    assert_eq!(second.baseline_message.as_deref(), Some("fix: b"));
    let third = store.get(&rows[2]).expect("third row");
    assert_eq!(third.developer_score, Some(Score::UNSCORED));
    assert_eq!(third.baseline_score, Some(Score::UNSCORED));
    assert!(store.needs(&rows[2], Field::RectifierScore));
    assert!(!store.needs(&rows[1], Field::RectifierScore));
}

#[test]
fn float_scores_and_partial_headers_from_older_tables_are_accepted() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    std::fs::write(
        &path,
        "Hash,Message,Filename,Diff,Baseline_Message,Rectifier_Score,Improvement_Category\n\
         a1,fix it,a.py,d,\"fix: parser\",4.0,Clarity\n",
    )
    .expect("write table");

    let fresh = IdentityKey {
        commit_hash: "a1".to_string(),
        message: "fix it".to_string(),
        file_path: "a.py".to_string(),
        diff: "d".to_string(),
    };
    let store = RecordStore::reconcile(vec![fresh.clone()], &path).expect("reconcile results");

    assert_eq!(store.origin(), Origin::Resumed);
    let item = store.get(&fresh).expect("row present");
    assert_eq!(item.rectifier_score, Some(Score::from_raw(4)));
    assert_eq!(item.baseline_message.as_deref(), Some("fix: parser"));
    assert_eq!(item.improvement_category, Some(ImprovementCategory::Clarity));
    assert!(item.developer_score.is_none());
}

#[test]
fn rows_needing_reflects_live_updates() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    let rows = vec![key("a1", "a.py"), key("b2", "b.py"), key("c3", "c.py")];
    let mut store = RecordStore::reconcile(rows.clone(), &path).expect("reconcile results");

    store.update(&rows[1], scored(5)).expect("update");

    let pending: Vec<_> = store
        .rows_needing(Field::RectifierScore)
        .map(|(key, _)| key.file_path.clone())
        .collect();
    assert_eq!(pending, vec!["a.py", "c.py"]);
    assert!(!store.needs(&rows[1], Field::RectifierScore));
    assert!(store.needs(&rows[1], Field::DeveloperScore));
}

#[test]
fn update_rejects_wrong_kind_without_touching_row() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    let row = key("a1", "a.py");
    let mut store = RecordStore::reconcile(vec![row.clone()], &path).expect("reconcile results");

    let bad = RowUpdate::new()
        .set(Field::BaselineMessage, FieldValue::Text("fix: ok".to_string()))
        .set(Field::DeveloperScore, FieldValue::Text("five".to_string()));
    let err = store.update(&row, bad).expect_err("kind mismatch must fail");
    assert!(err.to_string().contains("Developer_Score"), "{err}");

    let item = store.get(&row).expect("row present");
    assert!(item.baseline_message.is_none());
    assert!(item.developer_score.is_none());
}

#[test]
fn update_unknown_key_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("results.csv");
    let mut store = RecordStore::reconcile(vec![key("a1", "a.py")], &path)
        .expect("reconcile results");

    assert!(store.update(&key("zz", "z.py"), scored(1)).is_err());
}

#[test]
fn flush_writes_header_for_empty_table_and_preserves_multiline_text() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("nested").join("results.csv");

    let empty = RecordStore::reconcile(Vec::new(), &path).expect("reconcile results");
    empty.flush().expect("flush empty");
    let text = std::fs::read_to_string(&path).expect("read table");
    assert_eq!(text.trim_end(), COLUMNS.join(","));

    let row = IdentityKey {
        commit_hash: "a1".to_string(),
        message: "Fix crash\n\nLonger body, with \"quotes\".".to_string(),
        file_path: "pkg/a.py".to_string(),
        diff: "@@ -1,2 +1,2 @@\n-x = 1\n+x = 2\n".to_string(),
    };
    let store = RecordStore::reconcile(vec![row.clone()], &path).expect("reconcile results");
    store.flush().expect("flush");
    let loaded = RecordStore::load(&path).expect("load table");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.items()[0].key, row);
}
