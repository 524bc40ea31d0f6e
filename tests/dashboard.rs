mod common;

use std::io::Cursor;

use common::{RESULTS_FIXTURE, TestWorkspace, fixture_path};
use result_analyzer::{config::AppConfig, dashboard, dataset::CsvOptions, session::Session};

fn run_script(config: AppConfig, script: &str) -> String {
    let session = Session::new(config, CsvOptions::default());
    let mut output = Vec::new();
    dashboard::run(session, Cursor::new(script.to_string()), &mut output).expect("dashboard run");
    String::from_utf8(output).expect("utf-8 output")
}

#[test]
fn report_save_failure_keeps_the_session_running() {
    let workspace = TestWorkspace::new();
    let mut config = workspace.config();
    config.report_file = "no_such_dir/report.csv".to_string();
    let script = format!(
        "admin\nadmin123\n{}\nsemester\n8\ny\n4\nquit\n",
        fixture_path(RESULTS_FIXTURE).display()
    );

    let output = run_script(config, &script);

    assert!(output.contains("Error saving report:"), "{output}");
    let after_failure = output
        .split("Error saving report:")
        .nth(1)
        .expect("text after failure");
    assert!(after_failure.contains("== Top 5 =="), "{output}");
    assert!(output.trim_end().ends_with("Goodbye."), "{output}");
}

#[test]
fn back_at_store_prompt_returns_to_upload() {
    let workspace = TestWorkspace::new();
    let other = workspace.write("other.csv", "Name,Total Marks\nZara,64\n");
    let script = format!(
        "admin\nadmin123\n{}\nback\n{}\nsemester\nquit\n",
        fixture_path(RESULTS_FIXTURE).display(),
        other.display()
    );

    let output = run_script(workspace.config(), &script);

    assert!(output.contains("CSV file uploaded successfully! (7 row(s), 6 column(s))"));
    assert!(output.contains("Dataset discarded. Upload another CSV file."));
    assert!(output.contains("CSV file uploaded successfully! (1 row(s), 2 column(s))"));
    assert!(output.contains("created successfully!"));
    let stored = result_analyzer::store::read_table(&workspace.path().join("semester.db"))
        .expect("read store");
    assert_eq!(stored.rows.len(), 1);
}

#[test]
fn failing_store_directory_does_not_trap_the_user() {
    let workspace = TestWorkspace::new();
    let mut config = workspace.config();
    config.store.directory = workspace.path().join("missing");
    let script = format!(
        "admin\nadmin123\n{}\nsemester\nback\n",
        fixture_path(RESULTS_FIXTURE).display()
    );

    let output = run_script(config, &script);

    assert!(output.contains("Error creating database:"), "{output}");
    assert!(output.contains("Dataset discarded."), "{output}");
    assert!(output.contains("CSV file path: "), "{output}");
    assert!(output.trim_end().ends_with("Goodbye."), "{output}");
}
