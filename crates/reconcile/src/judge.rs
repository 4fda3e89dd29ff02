use crate::error::JudgeError;
use async_trait::async_trait;
use reqgate_protocol::{
    judge_response_schema, truncate_chars, JudgeRequest, JudgeResponse, Status,
};
use serde_json::Value;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(300);

/// Characters of stderr / error body quoted in transport errors.
const ERROR_EXCERPT_CHARS: usize = 500;

/// External oracle that proposes statuses for one batch of requirements.
///
/// Its output is untrusted: every proposal passes through [`crate::gate::apply`]
/// before it can reach the ledger.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeResponse, JudgeError>;

    /// Short identity recorded in run metadata (`command:…`, `http:…`, `replay:…`).
    fn describe(&self) -> String;
}

/// Parse a judge's raw output. Status labels are accepted leniently (`IMPLEMENTED`,
/// `in_progress`); anything that still isn't one of the five labels is malformed.
pub fn parse_response(raw: &str) -> Result<JudgeResponse, JudgeError> {
    let mut value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| JudgeError::malformed(format!("invalid JSON: {e}")))?;

    if let Some(statuses) = value
        .get_mut("updated_statuses")
        .and_then(Value::as_array_mut)
    {
        for item in statuses {
            let Some(label) = item.get("status").and_then(Value::as_str) else {
                continue;
            };
            let status = Status::parse(label)
                .ok_or_else(|| JudgeError::malformed(format!("unknown status label '{label}'")))?;
            item["status"] = Value::String(status.as_str().to_string());
        }
    }

    serde_json::from_value(value).map_err(|e| JudgeError::malformed(e.to_string()))
}

/// Judge backed by a local program: request JSON on stdin, response JSON on stdout.
#[derive(Debug, Clone)]
pub struct CommandJudge {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandJudge {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: DEFAULT_JUDGE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Judge for CommandJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeResponse, JudgeError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| JudgeError::transport(format!("failed to encode request: {e}")))?;

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| JudgeError::transport(format!("failed to spawn {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| JudgeError::transport("judge stdin unavailable"))?;
        let write = async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await
        };

        let exchange = async { tokio::join!(write, child.wait_with_output()) };
        let (written, output) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| {
                JudgeError::transport(format!(
                    "{} did not answer within {:?}",
                    self.program, self.timeout
                ))
            })?;
        let output = output.map_err(|e| {
            JudgeError::transport(format!("failed to wait for {}: {e}", self.program))
        })?;
        if let Err(err) = written {
            log::debug!("Judge {} closed stdin early: {err}", self.program);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JudgeError::transport(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                truncate_chars(stderr.trim(), ERROR_EXCERPT_CHARS)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }

    fn describe(&self) -> String {
        format!("command:{}", self.program)
    }
}

/// Judge behind an HTTP adapter: POSTs `{request, response_schema}` and reads the
/// response body as a [`JudgeResponse`].
#[derive(Debug, Clone)]
pub struct HttpJudge {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpJudge {
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("reqgate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| JudgeError::transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }
}

#[async_trait]
impl Judge for HttpJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<JudgeResponse, JudgeError> {
        let body = serde_json::json!({
            "request": request,
            "response_schema": judge_response_schema(),
        });

        let mut call = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            call = call.bearer_auth(token);
        }
        let response = call
            .send()
            .await
            .map_err(|e| JudgeError::transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| JudgeError::transport(e.to_string()))?;
        if !status.is_success() {
            return Err(JudgeError::transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                truncate_chars(text.trim(), ERROR_EXCERPT_CHARS)
            )));
        }
        parse_response(&text)
    }

    fn describe(&self) -> String {
        format!("http:{}", self.url)
    }
}

/// Serves pre-recorded responses in order, one per batch.
#[derive(Debug)]
pub struct ReplayJudge {
    source: String,
    responses: Vec<String>,
    served: AtomicUsize,
}

impl ReplayJudge {
    /// Accepts a JSON array of responses or one response per line.
    pub fn from_text(source: impl Into<String>, text: &str) -> Result<Self, JudgeError> {
        let trimmed = text.trim();
        let responses = if trimmed.starts_with('[') {
            let values: Vec<Value> = serde_json::from_str(trimmed)
                .map_err(|e| JudgeError::malformed(format!("invalid replay array: {e}")))?;
            values.iter().map(Value::to_string).collect()
        } else {
            trimmed
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        };
        Ok(Self {
            source: source.into(),
            responses,
            served: AtomicUsize::new(0),
        })
    }

    pub fn load(path: &Path) -> Result<Self, JudgeError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            JudgeError::transport(format!("failed to read replay file {}: {e}", path.display()))
        })?;
        Self::from_text(path.display().to_string(), &text)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[async_trait]
impl Judge for ReplayJudge {
    async fn judge(&self, _request: &JudgeRequest) -> Result<JudgeResponse, JudgeError> {
        let idx = self.served.fetch_add(1, Ordering::SeqCst);
        let raw = self.responses.get(idx).ok_or(JudgeError::Exhausted {
            served: self.responses.len(),
        })?;
        parse_response(raw)
    }

    fn describe(&self) -> String {
        format!("replay:{}", self.source)
    }
}
