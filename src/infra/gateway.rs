//! # Model Gateway Module / 模型网关模块
//!
//! This module abstracts over LLM providers behind a single `Gateway` trait.
//! A logical model name such as `ollama/llama3` or `gpt-4` is mapped to a
//! concrete backend call which returns the raw text output and its latency.
//!
//! 此模块通过统一的 `Gateway` trait 抽象各个 LLM 提供商。
//! 逻辑模型名（如 `ollama/llama3` 或 `gpt-4`）被映射到具体的后端调用，
//! 返回原始文本输出及其延迟。

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::time::{Duration, Instant};
use thiserror::Error;

/// The judge model used for LLM-as-a-judge assertions unless overridden.
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-3.5-turbo";

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// A single model invocation: what to ask, whom to ask, and how long to wait.
#[derive(Debug, Clone)]
pub struct InvokeRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f64,
    pub timeout: Duration,
}

/// The raw outcome of a successful model call.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub text: String,
    pub latency: Duration,
}

/// Classified transport failures. The runner retries `RateLimited` with
/// backoff; `Timeout` and `Other` are terminal for the attempt.
///
/// 分类的传输层失败。运行器会对 `RateLimited` 进行退避重试；
/// `Timeout` 和 `Other` 对该次尝试是终结性的。
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider throttled the request; eligible for retry with backoff.
    #[error("provider rate limit hit: {0}")]
    RateLimited(String),
    /// The call did not complete within its deadline.
    #[error("call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// Any other transport-level failure.
    #[error("{0}")]
    Other(String),
}

/// The gateway abstraction consumed by the runner and the assertion engine.
///
/// Implementations must be shareable across concurrently executing test
/// cases; any connection pooling is their own internal concern.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn invoke(&self, request: InvokeRequest) -> Result<GatewayResponse, GatewayError>;
}

/// Gateway configuration, built once at the CLI boundary and passed in at
/// construction. The environment is only consulted at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of an OpenAI-compatible chat-completions endpoint.
    pub openai_base_url: String,
    /// Bearer token for the OpenAI-compatible endpoint, if required.
    pub api_key: Option<String>,
    /// Base URL of a local or remote Ollama server.
    pub ollama_base_url: String,
    /// Model used for judge calls (`sentiment` assertions).
    pub judge_model: String,
}

impl GatewayConfig {
    /// Builds a configuration from the conventional environment variables,
    /// with an optional judge-model override from the CLI.
    pub fn from_env(judge_model: Option<String>) -> Self {
        Self {
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            api_key: env::var("OPENAI_API_KEY").ok(),
            ollama_base_url: env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string()),
            judge_model: judge_model.unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string()),
        }
    }
}

/// HTTP gateway covering two provider families:
///
/// - `ollama/<name>` models are sent to an Ollama server's `/api/generate`.
/// - every other model name is sent to an OpenAI-compatible
///   `/chat/completions` endpoint.
///
/// HTTP 429 responses are classified as `RateLimited`, client timeouts as
/// `Timeout`, and everything else as `Other`.
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionReply {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaReply {
    response: String,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Calls an Ollama server with the `ollama/` prefix stripped off.
    async fn invoke_ollama(
        &self,
        model: &str,
        request: &InvokeRequest,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/api/generate", self.config.ollama_base_url);
        let body = json!({
            "model": model,
            "prompt": request.prompt,
            "stream": false,
            "options": { "temperature": request.temperature },
        });

        let response = self
            .client
            .post(&url)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, request))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &request.model, response.text().await.ok()));
        }

        let reply: OllamaReply = response
            .json()
            .await
            .map_err(|e| GatewayError::Other(format!("malformed Ollama response: {e}")))?;
        Ok(reply.response)
    }

    /// Calls an OpenAI-compatible chat-completions endpoint.
    async fn invoke_openai(&self, request: &InvokeRequest) -> Result<String, GatewayError> {
        let url = format!("{}/chat/completions", self.config.openai_base_url);
        let body = json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "temperature": request.temperature,
        });

        let mut builder = self.client.post(&url).timeout(request.timeout).json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(e, request))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, &request.model, response.text().await.ok()));
        }

        let reply: ChatCompletionReply = response
            .json()
            .await
            .map_err(|e| GatewayError::Other(format!("malformed completion response: {e}")))?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(content)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn invoke(&self, request: InvokeRequest) -> Result<GatewayResponse, GatewayError> {
        let started = Instant::now();
        let text = match request.model.strip_prefix("ollama/") {
            Some(model) => self.invoke_ollama(model, &request).await?,
            None => self.invoke_openai(&request).await?,
        };
        Ok(GatewayResponse {
            text,
            latency: started.elapsed(),
        })
    }
}

fn classify_reqwest_error(error: reqwest::Error, request: &InvokeRequest) -> GatewayError {
    if error.is_timeout() {
        GatewayError::Timeout(request.timeout)
    } else {
        GatewayError::Other(format!("call to '{}' failed: {error}", request.model))
    }
}

fn classify_status(status: StatusCode, model: &str, body: Option<String>) -> GatewayError {
    let detail = body.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS {
        GatewayError::RateLimited(format!("'{model}' returned 429: {detail}"))
    } else {
        GatewayError::Other(format!("'{model}' returned {status}: {detail}"))
    }
}
