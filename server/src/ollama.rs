use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::Sender;
use tokio_stream::StreamExt;
use tracing::debug;

/// Model used for search summaries.
const MODEL: &str = "llama3.2:1b";

/// Upper bound on generated tokens per summary.
const NUM_PREDICT: u32 = 300;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Minimal streaming client for the Ollama generate API.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

impl OllamaClient {
    /// Reads the endpoint from `OLLAMA_HOST`, defaulting to the local daemon.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Opens a streaming generate request for `query`. The response body is an
    /// NDJSON sequence of chunks; feed it to [`forward_chunks`].
    pub async fn start_generate(&self, query: &str) -> Result<reqwest::Response> {
        let req = GenerateRequest {
            model: MODEL,
            prompt: format!(
                "You are a helpful search engine assistant. \
                 Answer this question in a single english sentence: ` {query} `"
            ),
            options: GenerateOptions {
                num_predict: NUM_PREDICT,
            },
        };

        self.http
            .post(format!("{}/api/generate", self.base_url))
            .json(&req)
            .send()
            .await
            .context("failed to reach ollama")?
            .error_for_status()
            .context("ollama generate request failed")
    }
}

/// Relays each NDJSON chunk of an open generate response into `tx`, in receive
/// order. Stops quietly when the receiver is dropped.
pub async fn forward_chunks(resp: reqwest::Response, tx: Sender<String>) -> Result<()> {
    let mut stream = resp.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk.context("failed to read ollama stream")?);
        while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buf.drain(..=pos).collect();
            let parsed: GenerateChunk = match serde_json::from_slice(&line) {
                Ok(parsed) => parsed,
                Err(err) => {
                    debug!(%err, "skipping undecodable ollama chunk");
                    continue;
                }
            };
            if tx.send(parsed.response).await.is_err() {
                return Ok(());
            }
            if parsed.done {
                return Ok(());
            }
        }
    }
    Ok(())
}

/// Payload of one SSE frame: the raw chunk with newlines substituted so each
/// chunk stays a single `data:` line.
pub fn sse_payload(chunk: &str) -> String {
    chunk.replace('\n', "<newline>")
}
