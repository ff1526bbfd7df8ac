use std::path::Path;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::Responder;
use crate::config::Config;
use crate::error::ResponderError;
use crate::figure::Figure;
use crate::retry::RetryPolicy;

#[derive(Serialize)]
struct ChatRequest<'a> {
    figure_id: i64,
    question: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    answer: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: i64,
}

/// Talks to the chat backend over HTTP.
#[derive(Clone)]
pub struct RemoteResponder {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl RemoteResponder {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ResponderError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.api_base(),
            retry: config.retry_policy(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn ask_once(&self, figure_id: i64, question: &str) -> Result<String, ResponderError> {
        let url = format!("{}/pdfs/chat/", self.base_url);

        let request = ChatRequest { figure_id, question };

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        interpret_chat_response(status, &body)
    }
}

/// Maps a status and body from `/pdfs/chat/` onto an answer or a failure.
fn interpret_chat_response(status: StatusCode, body: &str) -> Result<String, ResponderError> {
    let parsed = serde_json::from_str::<ChatResponse>(body);

    if !status.is_success() {
        return Err(ResponderError::Remote {
            status: Some(status.as_u16()),
            message: parsed.ok().and_then(|r| r.error),
        });
    }

    let parsed = parsed
        .map_err(|e| ResponderError::Transport(format!("malformed response: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(ResponderError::Remote {
            status: Some(status.as_u16()),
            message: Some(error),
        });
    }

    parsed
        .answer
        .ok_or_else(|| ResponderError::Transport("response has no answer".to_string()))
}

#[async_trait]
impl Responder for RemoteResponder {
    async fn ask(&self, figure: &Figure, question: &str) -> Result<String, ResponderError> {
        let figure_id = figure.chat_id();
        log::debug!("asking {} (figure {}) via {}", figure.name, figure_id, self.base_url);
        self.retry.run(|| self.ask_once(figure_id, question)).await
    }

    async fn upload_pdf(&self, path: &Path) -> Result<Option<i64>, ResponderError> {
        let url = format!("{}/pdfs/", self.base_url);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ResponderError::Transport(format!("could not read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ResponderError::Remote {
                status: Some(status.as_u16()),
                message: serde_json::from_str::<ChatResponse>(&text).ok().and_then(|r| r.error),
            });
        }

        let created: UploadResponse = response
            .json()
            .await
            .map_err(|e| ResponderError::Transport(format!("malformed upload response: {}", e)))?;
        log::info!("uploaded {} as pdf {}", path.display(), created.id);
        Ok(Some(created.id))
    }

    fn label(&self) -> String {
        self.base_url.clone()
    }
}
