//! Shared test utilities for integration tests
//!
//! Provides a scripted generation client, HOME/XDG isolation for config loading, and a
//! minimal HTTP stub for exercising the real client against canned responses.

use async_trait::async_trait;
use corpusgen::error::ProviderError;
use corpusgen::provider::{GenerationClient, RawResponse, ResponsesPayload};
use serde_json::Value;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Mutex;
use std::thread::JoinHandle;
use tempfile::TempDir;

/// Global mutex to serialize HOME/XDG/CORPUSGEN environment access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "CORPUSGEN_ENV",
    "OPENAI_MODEL",
];

/// Run `f` with HOME pointing inside `test_dir` and no user-level config in scope.
/// Also holds the environment lock, so tests that set variables should run inside it.
pub fn with_isolated_home<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|k| (*k, std::env::var(k).ok()))
        .collect();

    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    for key in &ISOLATED_VARS[1..] {
        std::env::remove_var(key);
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(v) => std::env::set_var(key, v),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Generation client that replays a fixed script of outcomes and records every payload
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<Value, ProviderError>>>,
    payloads: Mutex<Vec<ResponsesPayload>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<Value, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn payloads(&self) -> Vec<ResponsesPayload> {
        self.payloads.lock().unwrap().clone()
    }

    /// User hints of every request, in call order.
    pub fn hints(&self) -> Vec<String> {
        self.payloads()
            .iter()
            .map(|p| p.input[1].content[0].text.clone())
            .collect()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn create_response(
        &self,
        payload: &ResponsesPayload,
    ) -> Result<RawResponse, ProviderError> {
        self.payloads.lock().unwrap().push(payload.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Unexpected("script exhausted".to_string())))
            .map(RawResponse::from_value)
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

pub fn malformed() -> ProviderError {
    ProviderError::MalformedRequest {
        status: 400,
        message: "Unknown parameter: 'input[0].content[0].cache_control'".to_string(),
    }
}

pub fn numbered_lines(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{} {}", prefix, i)).collect()
}

/// One request as seen by the HTTP stub
#[derive(Debug, Clone)]
pub struct StubRequest {
    /// Request line and headers, as sent.
    pub head: String,
    pub body: String,
}

impl StubRequest {
    /// Value of the first header named `name`, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim())
        })
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Serve one canned `(status, body)` per connection, in order. Returns the base URL and a
/// handle yielding the requests received.
pub fn spawn_http_stub(responses: Vec<(u16, String)>) -> (String, JoinHandle<Vec<StubRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
        let mut requests = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().unwrap();
            requests.push(read_request(&mut stream));
            let reason = match status {
                200 => "OK",
                400 => "Bad Request",
                401 => "Unauthorized",
                422 => "Unprocessable Entity",
                500 => "Internal Server Error",
                _ => "Status",
            };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        requests
    });
    (format!("http://{}/v1", addr), handle)
}

fn read_request(stream: &mut TcpStream) -> StubRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut expected: Option<(usize, usize)> = None;
    loop {
        if let Some((body_start, len)) = expected {
            if buf.len() >= body_start + len {
                return StubRequest {
                    head: String::from_utf8_lossy(&buf[..body_start - 4]).to_string(),
                    body: String::from_utf8_lossy(&buf[body_start..body_start + len]).to_string(),
                };
            }
        }
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return StubRequest {
                head: String::from_utf8_lossy(&buf).to_string(),
                body: String::new(),
            };
        }
        buf.extend_from_slice(&chunk[..n]);
        if expected.is_none() {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let len = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                expected = Some((pos + 4, len));
            }
        }
    }
}
