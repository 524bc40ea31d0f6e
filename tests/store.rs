mod common;

use common::{TestWorkspace, results_dataset};
use result_analyzer::{
    dataset::{ColumnType, Dataset, Value},
    schema::{SchemaColumn, TableSchema, infer_schema},
    store::{persist, read_table, store_path},
};

#[test]
fn persisted_table_matches_dataset() {
    let workspace = TestWorkspace::new();
    let dataset = results_dataset();
    let target = store_path(workspace.path(), "semester").expect("store path");
    let summary = persist(&dataset, &infer_schema(&dataset), &target).expect("persist");

    assert_eq!(summary.rows_written, 7);
    assert_eq!(summary.columns, 6);
    assert!(target.ends_with("semester.db"));

    let stored = read_table(&target).expect("read back");
    assert_eq!(stored.columns[1], ("Graphics & Multimedia".to_string(), "INTEGER".to_string()));
    assert_eq!(stored.columns[5], ("Attendance".to_string(), "REAL".to_string()));
    assert_eq!(stored.rows, dataset.rows());
}

#[test]
fn persisting_twice_keeps_only_second_dataset() {
    let workspace = TestWorkspace::new();
    let target = store_path(workspace.path(), "results").expect("store path");

    let first = results_dataset();
    persist(&first, &infer_schema(&first), &target).expect("first persist");

    let second = Dataset::from_rows(
        &["Student", "Score"],
        vec![vec!["Zara".into(), Value::Integer(64)]],
    )
    .expect("dataset");
    persist(&second, &infer_schema(&second), &target).expect("second persist");

    let stored = read_table(&target).expect("read back");
    assert_eq!(
        stored.columns,
        vec![
            ("Student".to_string(), "TEXT".to_string()),
            ("Score".to_string(), "INTEGER".to_string()),
        ]
    );
    assert_eq!(stored.rows, vec![vec![Value::from("Zara"), Value::Integer(64)]]);
}

#[test]
fn failed_persist_leaves_previous_contents() {
    let workspace = TestWorkspace::new();
    let target = store_path(workspace.path(), "results").expect("store path");
    let dataset = results_dataset();
    persist(&dataset, &infer_schema(&dataset), &target).expect("persist");

    let replacement = Dataset::from_rows(
        &["A", "B"],
        vec![vec![Value::Integer(1), Value::Integer(2)]],
    )
    .expect("dataset");
    let clashing = TableSchema {
        columns: vec![
            SchemaColumn {
                name: "dup".to_string(),
                column_type: ColumnType::Integer,
            },
            SchemaColumn {
                name: "dup".to_string(),
                column_type: ColumnType::Integer,
            },
        ],
    };
    assert!(persist(&replacement, &clashing, &target).is_err());

    let stored = read_table(&target).expect("read back");
    assert_eq!(stored.rows.len(), 7);
    assert_eq!(stored.columns[0].0, "Name");
}

#[test]
fn store_names_must_be_plain_file_names() {
    let workspace = TestWorkspace::new();
    assert!(store_path(workspace.path(), "").is_err());
    assert!(store_path(workspace.path(), "   ").is_err());
    assert!(store_path(workspace.path(), "../escape").is_err());
    assert!(store_path(workspace.path(), "a\\b").is_err());
    let path = store_path(workspace.path(), " term1 ").expect("trimmed name");
    assert_eq!(path, workspace.path().join("term1.db"));
}

#[test]
fn reading_a_missing_store_fails() {
    let workspace = TestWorkspace::new();
    assert!(read_table(&workspace.path().join("nothing.db")).is_err());
}
