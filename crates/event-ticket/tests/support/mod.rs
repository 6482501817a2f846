#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use event_ticket::config::ClientConfig;
use event_ticket::http_client::HttpClient;
use event_ticket::session::DrupalClient;
use http::{Response as HttpResponse, StatusCode};
use serde_json::{Value, json};
use tokio::sync::Mutex;

pub const ENDPOINT: &str = "https://example.com/api";

#[derive(Clone, Default)]
pub struct MockClient {
    // Queue of HTTP responses (or transport failures) to pop for each send_http call
    queue: Arc<Mutex<VecDeque<Result<HttpResponse<Vec<u8>>, std::io::Error>>>>,
    // Capture requests for assertions
    log: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
}

impl MockClient {
    pub async fn push(&self, status: StatusCode, body: Value) {
        self.queue.lock().await.push_back(Ok(json_response(status, body)));
    }

    pub async fn push_err(&self, err: std::io::Error) {
        self.queue.lock().await.push_back(Err(err));
    }

    pub async fn take_log(&self) -> Vec<http::Request<Vec<u8>>> {
        let mut log = self.log.lock().await;
        let out = log.clone();
        log.clear();
        out
    }

    pub async fn request_count(&self) -> usize {
        self.log.lock().await.len()
    }
}

impl HttpClient for MockClient {
    type Error = std::io::Error;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>,
    > + Send {
        let log = self.log.clone();
        let queue = self.queue.clone();
        async move {
            log.lock().await.push(request);
            queue.lock().await.pop_front().expect("no queued response")
        }
    }
}

pub fn json_response(status: StatusCode, body: Value) -> HttpResponse<Vec<u8>> {
    HttpResponse::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(serde_json::to_vec(&body).unwrap())
        .unwrap()
}

/// Services 3.x login response body.
pub fn login_body(uid: u64, name: &str, token: &str) -> Value {
    json!({
        "sessid": "abc",
        "session_name": "SESS123",
        "token": token,
        "user": {"uid": uid, "name": name}
    })
}

pub fn request_body(request: &http::Request<Vec<u8>>) -> Value {
    serde_json::from_slice(request.body()).unwrap()
}

pub fn csrf_header(request: &http::Request<Vec<u8>>) -> Option<&str> {
    request
        .headers()
        .get("x-csrf-token")
        .map(|v| v.to_str().unwrap())
}

pub fn client(mock: &Arc<MockClient>) -> DrupalClient<Arc<MockClient>> {
    DrupalClient::new(
        ClientConfig::from_endpoint(ENDPOINT).unwrap(),
        mock.clone(),
    )
}

/// A client logged in as `alice` (uid 7, token `tok1`), with the request log cleared.
pub async fn logged_in_client(mock: &Arc<MockClient>) -> DrupalClient<Arc<MockClient>> {
    let drupal = client(mock);
    mock.push(StatusCode::OK, login_body(7, "alice", "tok1")).await;
    drupal.login("alice", "secret").await.expect("login ok");
    mock.take_log().await;
    drupal
}
