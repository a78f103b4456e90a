#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rollcall::http::{ApiResponse, HttpClient};
use serde_json::{Value, json};

#[derive(Debug, Clone)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// In-memory stand-in for the attendance service. Responses are queued per
/// path and handed out in order; an unscripted call answers 500.
#[derive(Default)]
pub struct ScriptedHttpClient {
    responses: Mutex<HashMap<String, VecDeque<(Duration, ApiResponse)>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, status: u16, payload: Value) -> &Self {
        self.respond_after(path, Duration::ZERO, status, payload)
    }

    pub fn respond_after(&self, path: &str, delay: Duration, status: u16, payload: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back((delay, ApiResponse::new(status, payload)));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    async fn answer(
        &self,
        method: &'static str,
        path: &str,
        params: &[(&str, String)],
        body: Option<Value>,
    ) -> ApiResponse {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            params: params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            body,
        });
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        match next {
            Some((delay, response)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                response
            }
            None => ApiResponse::server_error(),
        }
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, path: &str, params: &[(&str, String)]) -> ApiResponse {
        self.answer("GET", path, params, None).await
    }

    async fn post(&self, path: &str, body: Value) -> ApiResponse {
        self.answer("POST", path, &[], Some(body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ApiResponse {
        self.answer("PUT", path, &[], Some(body)).await
    }
}

pub fn student(id: i64, name: &str, attendance: bool) -> Value {
    json!({
        "_id": id,
        "name": name,
        "class": "5",
        "place": "North",
        "attendance": attendance,
    })
}

pub fn roster_body(students: Vec<Value>) -> Value {
    json!({ "data": { "students": students } })
}
