mod common;

use common::{RESULTS_FIXTURE, TestWorkspace, fixture_path};
use result_analyzer::{
    config::AdminCredential,
    dataset::CsvOptions,
    session::{Session, SessionError, SessionState},
    store,
    views::{AnalysisOption, View},
};

fn ready_session(workspace: &TestWorkspace) -> Session {
    let mut session = Session::new(workspace.config(), CsvOptions::default());
    session.login("admin", "admin123").expect("login");
    session
        .upload_path(&fixture_path(RESULTS_FIXTURE))
        .expect("upload");
    session.create_store("semester").expect("create store");
    session
}

#[test]
fn full_flow_reaches_dashboard_and_persists() {
    let workspace = TestWorkspace::new();
    let session = ready_session(&workspace);
    assert_eq!(session.state(), SessionState::DashboardReady);
    assert!(session.is_db_created());

    let path = session.store_path().expect("store path").to_path_buf();
    assert_eq!(path, workspace.path().join("semester.db"));
    assert_eq!(store::read_table(&path).expect("read").rows.len(), 7);

    let outcome = session
        .analyze(AnalysisOption::HighestMark, None)
        .expect("analyze");
    match outcome.value {
        View::Table(frame) => assert_eq!(frame.rows.len(), 2),
        other => panic!("unexpected view {other:?}"),
    }
    session.finish();
}

#[test]
fn upload_before_login_is_rejected() {
    let workspace = TestWorkspace::new();
    let mut session = Session::new(workspace.config(), CsvOptions::default());
    let err = session
        .upload_path(&fixture_path(RESULTS_FIXTURE))
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidState {
            expected: SessionState::AwaitingDataset,
            actual: SessionState::LoggedOut,
        }
    ));
    assert!(session.dataset().is_none());
}

#[test]
fn store_requires_an_uploaded_dataset() {
    let workspace = TestWorkspace::new();
    let mut session = Session::new(workspace.config(), CsvOptions::default());
    session.login("admin", "admin123").unwrap();
    let err = session.create_store("semester").unwrap_err();
    assert!(matches!(err, SessionError::NoDataset));
    assert!(!workspace.path().join("semester.db").exists());
}

#[test]
fn configured_credential_replaces_default() {
    let workspace = TestWorkspace::new();
    let mut config = workspace.config();
    config.admin = AdminCredential::from_secret("registrar", "s3cret");
    let mut session = Session::new(config, CsvOptions::default());
    assert!(matches!(
        session.login("admin", "admin123"),
        Err(SessionError::InvalidCredentials)
    ));
    session.login("registrar", "s3cret").expect("login");
    assert_eq!(session.state(), SessionState::AwaitingDataset);
}

#[test]
fn invalid_store_name_keeps_session_waiting() {
    let workspace = TestWorkspace::new();
    let mut session = Session::new(workspace.config(), CsvOptions::default());
    session.login("admin", "admin123").unwrap();
    session
        .upload_path(&fixture_path(RESULTS_FIXTURE))
        .unwrap();
    let err = session.create_store("nested/name").unwrap_err();
    assert!(matches!(err, SessionError::InvalidStoreName(_)));
    assert_eq!(session.state(), SessionState::AwaitingDataset);
}

#[test]
fn reset_returns_to_upload_step() {
    let workspace = TestWorkspace::new();
    let mut session = ready_session(&workspace);
    session.reset().expect("reset");
    assert_eq!(session.state(), SessionState::AwaitingDataset);
    assert!(session.dataset().is_none());
    assert!(session.store_path().is_none());
    assert!(session.reset().is_err());

    session
        .upload_reader("Name,Total Marks\nZara,64\n".as_bytes())
        .unwrap();
    session.create_store("semester").unwrap();
    let stored = store::read_table(&workspace.path().join("semester.db")).unwrap();
    assert_eq!(stored.rows.len(), 1);
}

#[test]
fn subject_options_default_to_first_configured_subject() {
    let workspace = TestWorkspace::new();
    let session = ready_session(&workspace);
    let outcome = session
        .analyze(AnalysisOption::SubjectwiseAnalysis, None)
        .unwrap();
    match outcome.value {
        View::Table(frame) => {
            assert_eq!(frame.headers, vec!["Name", "Graphics & Multimedia"]);
        }
        other => panic!("unexpected view {other:?}"),
    }
}

#[test]
fn persistence_failure_keeps_dataset_and_state() {
    let workspace = TestWorkspace::new();
    let mut config = workspace.config();
    config.store.directory = workspace.path().join("missing").join("stores");
    let mut session = Session::new(config, CsvOptions::default());
    session.login("admin", "admin123").unwrap();
    session
        .upload_path(&fixture_path(RESULTS_FIXTURE))
        .unwrap();

    let err = session.create_store("semester").unwrap_err();
    assert!(matches!(err, SessionError::Persistence(_)));
    assert!(!session.is_db_created());
    assert_eq!(session.state(), SessionState::AwaitingDataset);
    assert!(session.dataset().is_some());
    assert!(session.store_path().is_none());
}

#[test]
fn discarding_the_dataset_allows_a_new_upload() {
    let workspace = TestWorkspace::new();
    let mut session = Session::new(workspace.config(), CsvOptions::default());
    session.login("admin", "admin123").unwrap();
    session
        .upload_path(&fixture_path(RESULTS_FIXTURE))
        .unwrap();
    session.discard_dataset().expect("discard");
    assert!(session.dataset().is_none());
    assert_eq!(session.state(), SessionState::AwaitingDataset);

    session
        .upload_reader("Name,Total Marks\nZara,64\n".as_bytes())
        .unwrap();
    assert_eq!(session.dataset().map(|d| d.row_count()), Some(1));
}
