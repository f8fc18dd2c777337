//! The external classification service.

use std::{future::Future, time::Duration};

use base64::Engine as _;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, prompt::build_prompt};

// ─── Seam ────────────────────────────────────────────────────────────────────

/// Everything the service needs for one document.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
  pub mime_type: String,
  pub content:   Bytes,
  /// Candidate department names, in roster order.
  pub labels:    Vec<String>,
}

/// A service that reads a document and answers with free-form text that
/// should contain the ranked departments.
pub trait Classifier: Send + Sync {
  fn classify(
    &self,
    request: ClassifyRequest,
  ) -> impl Future<Output = Result<String>> + Send + '_;
}

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
  /// Base URL of the generative-language API.
  pub endpoint:     String,
  pub model:        String,
  /// Supplied at process start; empty means the classifier is disabled.
  pub api_key:      String,
  pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
  fn default() -> Self {
    Self {
      endpoint:     "https://generativelanguage.googleapis.com".to_owned(),
      model:        "gemini-2.0-flash".to_owned(),
      api_key:      String::new(),
      timeout_secs: 30,
    }
  }
}

// ─── Gemini ──────────────────────────────────────────────────────────────────

/// [`Classifier`] backed by the Gemini `generateContent` endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GeminiClassifier {
  client: Client,
  config: ClassifierConfig,
}

impl GeminiClassifier {
  pub fn new(config: ClassifierConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.config.endpoint.trim_end_matches('/'),
      self.config.model,
    )
  }
}

#[derive(Serialize)]
struct GenerateRequest {
  contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
  Inline {
    #[serde(rename = "inlineData")]
    inline_data: InlineData,
  },
  Text {
    text: String,
  },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
  mime_type: String,
  data:      String,
}

fn request_body(request: ClassifyRequest) -> GenerateRequest {
  let data = base64::engine::general_purpose::STANDARD.encode(&request.content);
  GenerateRequest {
    contents: vec![Content {
      parts: vec![
        Part::Inline {
          inline_data: InlineData { mime_type: request.mime_type, data },
        },
        Part::Text { text: build_prompt(&request.labels) },
      ],
    }],
  }
}

/// `candidates[0].content.parts[0].text`
fn reply_text(envelope: &Value) -> Result<String> {
  envelope
    .pointer("/candidates/0/content/parts/0/text")
    .and_then(Value::as_str)
    .map(str::to_owned)
    .ok_or_else(|| {
      let error = envelope
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("no candidate text");
      Error::Envelope(error.to_owned())
    })
}

impl Classifier for GeminiClassifier {
  async fn classify(&self, request: ClassifyRequest) -> Result<String> {
    if self.config.api_key.trim().is_empty() {
      return Err(Error::NotConfigured("api_key is empty"));
    }

    let resp = self
      .client
      .post(self.url())
      .query(&[("key", self.config.api_key.as_str())])
      .json(&request_body(request))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { status: status.as_u16(), body });
    }

    let envelope: Value = resp.json().await?;
    reply_text(&envelope)
  }
}
