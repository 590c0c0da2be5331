//! Shared harness for MyGrade integration tests
//!
//! [`TestApp`] drives the full router (pages, JSON API, session layer) with
//! `tower::ServiceExt::oneshot` and carries the session cookie from one
//! request to the next, like a single browser would.

#![allow(dead_code)]

use argon2::Params;
use axum::{
    body::{Body, BodyDataStream},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use futures::StreamExt;
use mygrade_server::{
    api::{self, AppState},
    config::{AdminAccount, Config},
    identity::local::{hash_password, LocalIdentity},
    store::{DocumentStore, MemoryStore},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@school.edu";
pub const ADMIN_PASSWORD: &str = "correct horse";
pub const INACTIVITY: Duration = Duration::from_secs(600);

const MULTIPART_BOUNDARY: &str = "mygrade-test-boundary";

pub struct TestApp {
    pub state: AppState,
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        Self::with_store(store)
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        let identity = LocalIdentity::new(&[AdminAccount {
            email: ADMIN_EMAIL.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD, Params::new(1024, 1, 1, None).unwrap())
                .unwrap(),
        }]);
        let state = AppState::new(store, Arc::new(identity), INACTIVITY);
        let router = api::create_router(state.clone(), &Config::default());

        Self {
            state,
            router,
            cookie: None,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.state.store.as_ref()
    }

    /// Forget the session cookie, as a fresh browser would
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    pub async fn send(&mut self, request: Request<Body>) -> Response {
        let mut request = request;
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    pub async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&mut self, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn send_json(&mut self, method: Method, uri: &str, body: Value) -> Response {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&mut self, uri: &str, body: Value) -> Response {
        self.send_json(Method::POST, uri, body).await
    }

    pub async fn post_form(&mut self, uri: &str, body: &str) -> Response {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_file(&mut self, uri: &str, file_name: &str, bytes: &[u8]) -> Response {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
                 Content-Type: application/vnd.openxmlformats-officedocument.spreadsheetml.sheet\r\n\r\n",
                b = MULTIPART_BOUNDARY,
                f = file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Sign in through the API and keep the admin session cookie
    pub async fn sign_in(&mut self) {
        let response = self
            .post_json(
                "/api/v1/auth/sign-in",
                serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    /// Create a class through the API and return its ID
    pub async fn create_class(&mut self, course: &str, subject: &str, section: &str) -> String {
        let response = self
            .post_json(
                "/api/v1/classes",
                serde_json::json!({
                    "courseCode": course,
                    "subjectName": subject,
                    "yearSection": section,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        json["data"]["id"].as_str().unwrap().to_string()
    }
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

/// Let spawned watchdog tasks observe a time jump
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Server-sent event reader over a streaming response body
pub struct EventReader {
    stream: BodyDataStream,
    buffer: String,
}

impl EventReader {
    pub fn new(response: Response) -> Self {
        Self {
            stream: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    /// Payload of the next `snapshot` event
    pub async fn next_snapshot(&mut self) -> Value {
        loop {
            while let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                if !frame.lines().any(|line| line == "event: snapshot") {
                    continue;
                }
                let data: String = frame
                    .lines()
                    .filter_map(|line| line.strip_prefix("data: "))
                    .collect();
                return serde_json::from_str(&data).unwrap();
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.stream.next())
                .await
                .expect("timed out waiting for an event")
                .expect("event stream ended")
                .unwrap();
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }
}

/// Build a workbook with a header row and the given rows
pub fn workbook(headers: &[&str], rows: &[Vec<Value>]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (index, row) in rows.iter().enumerate() {
        let row_number = index as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            let col = col as u16;
            match value {
                Value::String(text) => {
                    sheet.write_string(row_number, col, text).unwrap();
                },
                Value::Number(number) => {
                    sheet
                        .write_number(row_number, col, number.as_f64().unwrap())
                        .unwrap();
                },
                Value::Bool(flag) => {
                    sheet.write_boolean(row_number, col, *flag).unwrap();
                },
                _ => {},
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}
