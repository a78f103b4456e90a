mod common;

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use rollcall::screens::{Command, Flow, Session};
use rollcall::services::ExportConfig;
use rollcall::services::add_student::ADD_STUDENT_PATH;
use rollcall::services::roster::{
    STUDENTS_ATTENDANCE_PATH, UPDATE_ATTENDANCE_PATH, format_roster_date,
};
use rollcall::state::AppState;
use serde_json::json;

use common::{ScriptedHttpClient, roster_body, student};

fn session(http: Arc<ScriptedHttpClient>, dir: &tempfile::TempDir) -> Session {
    let export = ExportConfig {
        export_dir: dir.path().to_path_buf(),
    };
    Session::new(AppState::new(http, &export))
}

async fn run(session: &mut Session, line: &str) -> String {
    match session.handle(line.parse::<Command>().unwrap()).await {
        Flow::Continue(out) => out,
        Flow::Quit => panic!("unexpected quit on {:?}", line),
    }
}

#[tokio::test]
async fn mark_a_row_and_commit() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttpClient::new());
    http.respond(
        STUDENTS_ATTENDANCE_PATH,
        200,
        roster_body(vec![student(1, "ann", false), student(2, "bob", true)]),
    );
    http.respond(UPDATE_ATTENDANCE_PATH, 200, json!({}));
    let mut session = session(http.clone(), &dir);

    let first = session.start().await;
    assert!(first.contains("[ ] All"));

    let after_toggle = run(&mut session, "toggle #1").await;
    assert!(after_toggle.contains("[x] All"));
    assert!(after_toggle.contains("Unsaved changes"));

    let after_commit = run(&mut session, "commit").await;
    assert!(after_commit.contains("ok: Updated attendance"));
    assert!(!after_commit.contains("Unsaved changes"));
    assert_eq!(http.calls_to(UPDATE_ATTENDANCE_PATH).len(), 1);
}

#[tokio::test]
async fn search_narrows_rows_and_reports_no_results() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttpClient::new());
    http.respond(
        STUDENTS_ATTENDANCE_PATH,
        200,
        roster_body(vec![student(1, "ann", false), student(2, "bob", true)]),
    );
    let mut session = session(http, &dir);
    session.start().await;

    let filtered = run(&mut session, "search bo").await;
    assert!(filtered.contains("bob"));
    assert!(!filtered.contains("ann"));

    let nothing = run(&mut session, "search zz").await;
    assert!(nothing.contains("No results found"));

    let restored = run(&mut session, "clear").await;
    assert!(restored.contains("ann") && restored.contains("bob"));
}

#[tokio::test]
async fn failed_mount_is_not_mistaken_for_an_empty_search() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttpClient::new());
    let mut session = session(http, &dir);

    let screen = session.start().await;

    assert!(screen.contains("Could not load roster"));
    assert!(screen.contains("error: Server error"));
}

#[tokio::test]
async fn duplicate_add_is_reported_without_a_request() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttpClient::new());
    http.respond(STUDENTS_ATTENDANCE_PATH, 200, roster_body(vec![student(1, "ann", false)]));
    let mut session = session(http.clone(), &dir);
    session.start().await;

    let out = run(&mut session, "add Ann;5;North").await;

    assert!(out.contains("Student with same name already exists"));
    assert!(http.calls_to(ADD_STUDENT_PATH).is_empty());
}

#[tokio::test]
async fn unknown_row_is_a_notice_not_a_crash() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttpClient::new());
    http.respond(STUDENTS_ATTENDANCE_PATH, 200, roster_body(vec![student(1, "ann", false)]));
    let mut session = session(http, &dir);
    session.start().await;

    let out = run(&mut session, "toggle #7").await;

    assert!(out.contains("error: Unknown student: #7"));
}

#[tokio::test]
async fn quit_ends_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(Arc::new(ScriptedHttpClient::new()), &dir);

    assert_eq!(session.handle(Command::Quit).await, Flow::Quit);
}

#[tokio::test]
async fn rejected_add_keeps_the_form_until_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttpClient::new());
    http.respond(STUDENTS_ATTENDANCE_PATH, 200, roster_body(vec![student(1, "ann", false)]));
    http.respond(ADD_STUDENT_PATH, 500, json!("Server error"));
    let mut session = session(http.clone(), &dir);
    session.start().await;

    let out = run(&mut session, "add cy;6;East;absent").await;
    assert!(out.contains("error: Error while adding student"));
    assert!(out.contains("Add student (not saved): cy; 6; East; absent"));

    let out = run(&mut session, "cancel").await;
    assert!(!out.contains("Add student (not saved)"));
    assert_eq!(http.calls_to(ADD_STUDENT_PATH).len(), 1);
}

#[tokio::test]
async fn refresh_moves_a_stale_session_to_today() {
    let dir = tempfile::tempdir().unwrap();
    let http = Arc::new(ScriptedHttpClient::new());
    http.respond(STUDENTS_ATTENDANCE_PATH, 200, roster_body(vec![student(1, "ann", true)]));
    http.respond(STUDENTS_ATTENDANCE_PATH, 200, roster_body(vec![student(2, "bob", false)]));
    let mut session = session(http.clone(), &dir);
    session
        .state()
        .roster
        .set_date(NaiveDate::from_ymd_opt(2021, 5, 3).unwrap());
    session.start().await;

    let today = format_roster_date(Local::now().date_naive());
    let out = run(&mut session, "refresh").await;

    assert!(out.contains(&format!("Date: {}", today)));
    assert!(out.contains("bob"));
    let calls = http.calls_to(STUDENTS_ATTENDANCE_PATH);
    assert_eq!(calls[0].params[0].1, "03/05/21");
    assert_eq!(calls[1].params[0].1, today);
}
