//! In-memory stand-in for the conversion service.

#![allow(dead_code)]

use convertorio::{
    ClientConfig, ConversionEvent, ConversionFailure, ConvertorioClient, EventKind, HttpRequest,
    HttpResponse, Method, Transport,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://api.convertorio.test";
pub const UPLOAD_URL: &str = "https://storage.convertorio.test/upload/job-42?sig=abc";
pub const DOWNLOAD_URL: &str = "https://storage.convertorio.test/download/job-42.jpg?sig=def";
pub const JOB_ID: &str = "job-42";
pub const CONVERTED_BYTES: &[u8] = b"converted-jpeg-bytes";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn job(status: &str) -> Value {
    json!({ "id": JOB_ID, "status": status })
}

pub fn completed_job() -> Value {
    json!({
        "id": JOB_ID,
        "status": "completed",
        "download_url": DOWNLOAD_URL,
        "processing_time_ms": 1250,
        "tokens_used": 3
    })
}

/// Answers each endpoint from canned JSON and records every request.
pub struct FakeService {
    pub upload_url_reply: Mutex<Value>,
    pub confirm_reply: Mutex<Value>,
    /// Job records returned by successive status polls; the last one repeats.
    pub poll_replies: Mutex<VecDeque<Value>>,
    /// Envelope returned for job lookups in place of `poll_replies`.
    pub job_reply: Mutex<Option<Value>>,
    pub jobs_reply: Mutex<Value>,
    pub account_reply: Mutex<Value>,
    pub upload_url_status: Mutex<u16>,
    pub upload_status: Mutex<u16>,
    pub download_body: Mutex<Vec<u8>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self {
            upload_url_reply: Mutex::new(json!({
                "success": true,
                "job_id": JOB_ID,
                "upload_url": UPLOAD_URL
            })),
            confirm_reply: Mutex::new(json!({ "success": true, "status": "queued" })),
            poll_replies: Mutex::new(VecDeque::from(vec![completed_job()])),
            job_reply: Mutex::new(None),
            jobs_reply: Mutex::new(json!({ "success": true, "jobs": [] })),
            account_reply: Mutex::new(json!({ "success": false })),
            upload_url_status: Mutex::new(200),
            upload_status: Mutex::new(200),
            download_body: Mutex::new(CONVERTED_BYTES.to_vec()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_polls(polls: Vec<Value>) -> Arc<Self> {
        let service = Self::default();
        *service.poll_replies.lock().unwrap() = VecDeque::from(polls);
        Arc::new(service)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn status_polls(&self) -> usize {
        let job_url = format!("{}/v1/jobs/{}", BASE_URL, JOB_ID);
        self.requests()
            .iter()
            .filter(|r| r.method == Method::GET && r.url == job_url)
            .count()
    }

    fn next_poll(&self) -> Value {
        if let Some(reply) = self.job_reply.lock().unwrap().clone() {
            return reply;
        }
        let mut polls = self.poll_replies.lock().unwrap();
        let job = if polls.len() > 1 {
            polls.pop_front().unwrap()
        } else {
            polls.front().cloned().unwrap_or_else(|| job("processing"))
        };
        json!({ "success": true, "job": job })
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let method = &request.method;
        let path = request.url.strip_prefix(BASE_URL).unwrap_or("");

        if *method == Method::POST && path == "/v1/convert/upload-url" {
            let status = *self.upload_url_status.lock().unwrap();
            HttpResponse::from_bytes(status, self.upload_url_reply.lock().unwrap().to_string())
        } else if *method == Method::POST && path == "/v1/convert/confirm" {
            json_reply(&self.confirm_reply.lock().unwrap())
        } else if *method == Method::GET && path == "/v1/account" {
            json_reply(&self.account_reply.lock().unwrap())
        } else if *method == Method::GET && path.starts_with("/v1/jobs?") {
            json_reply(&self.jobs_reply.lock().unwrap())
        } else if *method == Method::GET && path.starts_with("/v1/jobs/") {
            json_reply(&self.next_poll())
        } else if *method == Method::PUT && request.url == UPLOAD_URL {
            HttpResponse::from_bytes(*self.upload_status.lock().unwrap(), "")
        } else if *method == Method::GET && request.url == DOWNLOAD_URL {
            HttpResponse::from_bytes(200, self.download_body.lock().unwrap().clone())
        } else {
            HttpResponse::from_bytes(404, r#"{"success":false,"error":"No such route"}"#)
        }
    }
}

fn json_reply(body: &Value) -> HttpResponse {
    HttpResponse::from_bytes(200, body.to_string())
}

#[async_trait::async_trait]
impl Transport for FakeService {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ConversionFailure> {
        let response = self.route(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

pub fn client(service: &Arc<FakeService>) -> ConvertorioClient {
    client_with_polling(service, Duration::from_secs(2), 60)
}

pub fn client_with_polling(
    service: &Arc<FakeService>,
    interval: Duration,
    max_attempts: u32,
) -> ConvertorioClient {
    let mut config = ClientConfig::with_api_key("test-key");
    config.base_url = BASE_URL.to_string();

    ConvertorioClient::builder()
        .config(config)
        .poll_interval(interval)
        .max_attempts(max_attempts)
        .transport(service.clone())
        .build()
        .unwrap()
}

/// Records every event delivered to the client, across all kinds.
pub fn record_events(client: &ConvertorioClient) -> Arc<Mutex<Vec<ConversionEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let sink = events.clone();
        client.on(kind, move |event| sink.lock().unwrap().push(event.clone()));
    }
    events
}
