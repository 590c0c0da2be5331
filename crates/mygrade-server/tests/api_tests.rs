//! End-to-end tests for the JSON API and the admin gate
//!
//! Every test drives the assembled router with an in-memory store and the
//! local identity service.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, body_text, location, workbook, EventReader, TestApp};
use mygrade_server::store::CollectionPath;
use serde_json::{json, Value};

const SHEET_HEADERS: [&str; 6] = [
    "idNumber",
    "firstName",
    "lastName",
    "quiz1",
    "prelim",
    "midtermGrade",
];

async fn upload_john_doe(app: &mut TestApp, class_id: &str) -> Value {
    let bytes = workbook(
        &SHEET_HEADERS,
        &[vec![
            json!("2022123456"),
            json!("John"),
            json!("Doe"),
            Value::Null,
            Value::Null,
            json!(2.5),
        ]],
    );
    let response = app
        .post_file(
            &format!("/api/v1/classes/{}/students/upload", class_id),
            "grades.xlsx",
            &bytes,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ============================================================================
// Student lookup
// ============================================================================

#[tokio::test]
async fn test_uploaded_student_can_look_up_grade() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;

    let upload = upload_john_doe(&mut app, &class_id).await;
    assert_eq!(upload["data"]["uploaded"], 1);
    assert_eq!(upload["data"]["message"], "1 records uploaded.");

    let flat = app
        .store()
        .get(&CollectionPath::students(), "2022123456")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(flat.data["quiz1"].as_f64(), Some(-1.0));
    assert_eq!(flat.data["prelim"].as_f64(), Some(-1.0));
    assert_eq!(flat.data["attendance"].as_f64(), Some(-1.0));
    assert_eq!(flat.data["midtermGrade"].as_f64(), Some(2.5));

    // A student on another browser
    app.clear_cookies();
    let response = app
        .post_json(
            "/api/v1/lookup",
            json!({ "firstName": "john", "lastName": "DOE", "idNumber": " 2022123456 " }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["grade"]["value"], "2.50");
    assert_eq!(json["data"]["grade"]["standing"], "passing");
    assert_eq!(json["data"]["grade"]["celebration"]["durationMs"], 4000);
    assert_eq!(json["data"]["recordUrl"], "/viewrecord");

    let response = app.get("/api/v1/record").await;
    assert_eq!(response.status(), StatusCode::OK);
    let record = body_json(response).await;
    assert_eq!(record["data"]["displayName"], "DOE, JOHN");
    assert_eq!(record["data"]["midtermGrade"], "2.50");
}

#[tokio::test]
async fn test_lookup_with_wrong_name_saves_nothing() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;
    upload_john_doe(&mut app, &class_id).await;
    app.clear_cookies();

    let response = app
        .post_json(
            "/api/v1/lookup",
            json!({ "firstName": "John", "lastName": "Smith", "idNumber": "2022123456" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(json["error"]["message"], "Invalid name or ID number.");

    let response = app.get("/api/v1/record").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lookup_requires_every_field() {
    let mut app = TestApp::new();

    let response = app
        .post_json(
            "/api/v1/lookup",
            json!({ "firstName": "John", "lastName": "", "idNumber": "1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json(
            "/api/v1/lookup",
            json!({ "firstName": "John", "lastName": "Doe", "idNumber": "404" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["message"], "Student record not found.");
}

#[tokio::test]
async fn test_lookup_page_renders_grade_badge() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;
    upload_john_doe(&mut app, &class_id).await;
    app.clear_cookies();

    let response = app
        .post_form("/", "firstName=John&lastName=Doe&idNumber=2022123456")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("2.50"));
    assert!(html.contains("View Record"));

    let response = app.get("/viewrecord").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("DOE, JOHN"));

    let response = app.post_form("/viewrecord/back", "").await;
    assert_eq!(location(&response), "/");
    let response = app.get("/viewrecord").await;
    assert_eq!(location(&response), "/");
}

// ============================================================================
// Class records
// ============================================================================

#[tokio::test]
async fn test_class_edit_keeps_identity_and_reaches_live_list() {
    let mut app = TestApp::new();
    app.sign_in().await;

    let live = app.get("/api/v1/classes/live").await;
    assert_eq!(live.status(), StatusCode::OK);
    let mut events = EventReader::new(live);
    assert_eq!(events.next_snapshot().await, json!([]));

    let class_id = app.create_class("CS101", "Intro", "1A").await;
    let snapshot = events.next_snapshot().await;
    assert_eq!(snapshot.as_array().unwrap().len(), 1);
    assert_eq!(snapshot[0]["courseCode"], "CS101");

    let response = app
        .send_json(
            Method::PUT,
            &format!("/api/v1/classes/{}", class_id),
            json!({ "courseCode": "CS101", "subjectName": "Intro", "yearSection": "1B" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut snapshot = events.next_snapshot().await;
    while snapshot[0]["yearSection"] != "1B" {
        snapshot = events.next_snapshot().await;
    }
    assert_eq!(snapshot.as_array().unwrap().len(), 1);
    assert_eq!(snapshot[0]["id"], class_id.as_str());

    let response = app.get("/api/v1/classes").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["id"], class_id.as_str());
}

#[tokio::test]
async fn test_class_requires_every_field() {
    let mut app = TestApp::new();
    app.sign_in().await;

    let response = app
        .post_json(
            "/api/v1/classes",
            json!({ "courseCode": "CS101", "subjectName": " ", "yearSection": "1A" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/v1/classes").await;
    assert_eq!(body_json(response).await["data"], json!([]));
}

#[tokio::test]
async fn test_class_delete_needs_confirmation_and_cascades() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;
    upload_john_doe(&mut app, &class_id).await;

    let uri = format!("/api/v1/classes/{}", class_id);
    let response = app.delete(&uri).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "CONFIRMATION_REQUIRED");

    let response = app.delete(&format!("{}?confirm=true", uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["studentsDeleted"], 1);

    let response = app.get(&uri).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let roster = CollectionPath::class_students(&class_id).unwrap();
    assert!(app.store().list(&roster).await.unwrap().is_empty());
}

// ============================================================================
// Grade grid
// ============================================================================

#[tokio::test]
async fn test_grid_edit_and_delete_write_both_collections() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;
    upload_john_doe(&mut app, &class_id).await;

    let row_uri = format!("/api/v1/classes/{}/students/2022123456", class_id);
    let response = app
        .send_json(
            Method::PUT,
            &row_uri,
            json!({ "fields": { "firstName": "Johnny", "lastName": "Doe", "quiz1": 9 } }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let flat = app
        .store()
        .get(&CollectionPath::students(), "2022123456")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(flat.text("firstName"), Some("Johnny"));
    assert_eq!(flat.data["quiz1"].as_f64(), Some(9.0));
    // grades the edit did not send keep their uploaded values
    assert_eq!(flat.data["midtermGrade"].as_f64(), Some(2.5));
    assert_eq!(flat.data["prelim"].as_f64(), Some(-1.0));

    let response = app.delete(&format!("{}?confirm=true", row_uri)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .get(&format!("/api/v1/classes/{}/students", class_id))
        .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["pagination"]["total"], 0);
    assert!(app
        .store()
        .get(&CollectionPath::students(), "2022123456")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_sheet_form_edit_keeps_hidden_columns() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;

    let stored = json!({
        "idNumber": "2022123456",
        "firstName": "John",
        "lastName": "Doe",
        "quiz1": 18,
        "quiz4": 20,
        "prelim": 45,
        "assignment1": 10,
        "midtermGrade": 2.5,
    });
    for path in [
        CollectionPath::class_students(&class_id).unwrap(),
        CollectionPath::students(),
    ] {
        app.store()
            .set_merge(&path, "2022123456", stored.as_object().cloned().unwrap())
            .await
            .unwrap();
    }

    // the default grid posts only the name and midterm columns
    let response = app
        .post_form(
            &format!("/admin/classrecord/{}/rows/2022123456", class_id),
            "firstName=Johnny&lastName=Doe&midtermGrade=inf",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let roster = CollectionPath::class_students(&class_id).unwrap();
    for path in [roster, CollectionPath::students()] {
        let document = app.store().get(&path, "2022123456").await.unwrap().unwrap();
        assert_eq!(document.text("firstName"), Some("Johnny"));
        assert_eq!(document.data["quiz1"], json!(18));
        assert_eq!(document.data["quiz4"], json!(20));
        assert_eq!(document.data["prelim"], json!(45));
        assert_eq!(document.data["assignment1"], json!(10));
        // non-finite input is kept as typed rather than read as missed
        assert_eq!(document.text("midtermGrade"), Some("inf"));
    }
}

#[tokio::test]
async fn test_malformed_upload_is_rejected() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;

    let response = app
        .post_file(
            &format!("/api/v1/classes/{}/students/upload", class_id),
            "grades.xlsx",
            b"not a workbook",
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"]["message"],
        "Invalid Excel file."
    );
}

// ============================================================================
// Admin gate
// ============================================================================

#[tokio::test]
async fn test_admin_surfaces_require_sign_in() {
    let mut app = TestApp::new();

    let response = app.get("/api/v1/classes").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"]["details"]["redirect"],
        "/admin-login"
    );

    let response = app.get("/admin/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin-login");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let mut app = TestApp::new();

    let response = app
        .post_json(
            "/api/v1/auth/sign-in",
            json!({ "email": common::ADMIN_EMAIL, "password": "wrong" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_page_flow_reaches_dashboard() {
    let mut app = TestApp::new();

    let response = app
        .post_form(
            "/admin-login",
            "email=admin%40school.edu&password=correct+horse",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/admin");

    let response = app.get("/admin/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Total Students"));
    assert!(html.contains("Calendar"));

    let response = app.get("/admin/logout").await;
    assert_eq!(location(&response), "/admin-login");

    let response = app.get("/admin/dashboard").await;
    assert_eq!(location(&response), "/admin-login");
}

#[tokio::test]
async fn test_dashboard_counts() {
    let mut app = TestApp::new();
    app.sign_in().await;
    let class_id = app.create_class("CS101", "Intro", "1A").await;
    app.create_class("CS102", "Intro", "1B").await;
    upload_john_doe(&mut app, &class_id).await;

    let response = app.get("/api/v1/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["stats"]["totalStudents"], 1);
    assert_eq!(json["data"]["stats"]["passed"], 1);
    assert_eq!(json["data"]["stats"]["failed"], 0);
    assert_eq!(json["data"]["stats"]["totalClasses"], 2);
    assert_eq!(json["data"]["stats"]["totalSubjects"], 1);
}
