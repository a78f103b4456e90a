mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use rollcall::error::AppError;
use rollcall::services::add_student::ADD_STUDENT_PATH;
use rollcall::services::roster::STUDENTS_ATTENDANCE_PATH;
use rollcall::services::{AddStudentFlow, AddStudentForm, RosterViewModel};
use serde_json::json;

use common::{ScriptedHttpClient, roster_body, student};

async fn setup() -> (Arc<ScriptedHttpClient>, RosterViewModel, AddStudentFlow) {
    let http = Arc::new(ScriptedHttpClient::new());
    http.respond(STUDENTS_ATTENDANCE_PATH, 200, roster_body(vec![student(1, "ann", false)]));
    let roster = RosterViewModel::new(http.clone(), NaiveDate::from_ymd_opt(2021, 5, 3).unwrap());
    roster.load().await.unwrap();
    let mut flow = AddStudentFlow::new(http.clone());
    flow.open();
    (http, roster, flow)
}

fn fill(flow: &mut AddStudentFlow, name: &str) {
    flow.set_name(name);
    flow.set_class("5");
    flow.set_place("North");
}

#[tokio::test]
async fn submit_stays_disabled_until_every_field_is_filled() {
    let (_http, roster, mut flow) = setup().await;

    assert!(!flow.can_submit(&roster));
    flow.set_name("Bob");
    assert!(!flow.can_submit(&roster));
    flow.set_class("5");
    assert!(!flow.can_submit(&roster));
    flow.set_place("North");
    assert!(flow.can_submit(&roster));

    flow.set_class("");
    assert!(!flow.can_submit(&roster));
}

#[tokio::test]
async fn duplicate_name_blocks_submission() {
    let (http, roster, mut flow) = setup().await;

    fill(&mut flow, "Ann");
    assert!(flow.is_duplicate(&roster));
    assert!(flow.form().is_complete());
    assert!(!flow.can_submit(&roster));

    flow.set_name("  ANN ");
    assert!(flow.is_duplicate(&roster));

    let err = flow.submit(&roster).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidForm(_)));
    assert!(http.calls_to(ADD_STUDENT_PATH).is_empty());

    flow.set_name("Annie");
    assert!(!flow.is_duplicate(&roster));
    assert!(flow.can_submit(&roster));
}

#[tokio::test]
async fn incomplete_form_is_not_sent() {
    let (http, roster, mut flow) = setup().await;
    flow.set_name("Bob");

    assert!(matches!(flow.submit(&roster).await, Err(AppError::InvalidForm(_))));
    assert!(http.calls_to(ADD_STUDENT_PATH).is_empty());
}

#[tokio::test]
async fn successful_add_resets_closes_and_reloads() {
    let (http, roster, mut flow) = setup().await;
    http.respond(ADD_STUDENT_PATH, 201, json!({"message": "Student added"}));
    http.respond(
        STUDENTS_ATTENDANCE_PATH,
        200,
        roster_body(vec![student(1, "ann", false), student(2, "bob", false)]),
    );

    fill(&mut flow, "bob");
    flow.set_attendance(false);
    let notice = flow.submit(&roster).await.unwrap();

    assert!(!notice.is_error());
    assert!(!flow.is_open());
    assert_eq!(flow.form(), &AddStudentForm::default());

    let posted = http.calls_to(ADD_STUDENT_PATH);
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].method, "POST");
    assert_eq!(
        posted[0].body,
        Some(json!({"name": "bob", "class": "5", "place": "North", "attendance": false}))
    );

    assert_eq!(http.calls_to(STUDENTS_ATTENDANCE_PATH).len(), 2);
    assert_eq!(roster.full_list().len(), 2);
    assert!(roster.contains_name("Bob"));
}

#[tokio::test]
async fn only_created_counts_as_success() {
    let (http, roster, mut flow) = setup().await;
    http.respond(ADD_STUDENT_PATH, 200, json!({"message": "ok"}));

    fill(&mut flow, "bob");
    let notice = flow.submit(&roster).await.unwrap();

    assert!(notice.is_error());
    assert!(flow.is_open());
}

#[tokio::test]
async fn failed_add_keeps_the_form() {
    let (http, roster, mut flow) = setup().await;
    http.respond(ADD_STUDENT_PATH, 500, json!("Server error"));

    fill(&mut flow, "bob");
    let notice = flow.submit(&roster).await.unwrap();

    assert!(notice.is_error());
    assert_eq!(notice.message, "Error while adding student");
    assert!(flow.is_open());
    assert_eq!(flow.form().name, "bob");
    assert_eq!(flow.form().place, "North");
    assert!(!flow.is_submitting());
    assert_eq!(http.calls_to(STUDENTS_ATTENDANCE_PATH).len(), 1);
}

#[tokio::test]
async fn cancel_discards_the_form() {
    let (_http, _roster, mut flow) = setup().await;
    fill(&mut flow, "bob");

    flow.cancel();

    assert!(!flow.is_open());
    assert_eq!(flow.form(), &AddStudentForm::default());
}
