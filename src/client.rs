//! Generation backend client.
//!
//! The backend is a thin proxy over third-party generation APIs exposing a
//! single contract: `POST /generate`. One request, one response, no retries
//! here; retry and backoff live on the server side. Any failure collapses
//! into one [`GenerateError`] carrying a message fit for the toast.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::Duration;
use url::Url;

use crate::story::Story;

/// The backend accepts between 2 and 10 pages per story.
pub const MIN_PAGES: u32 = 2;
pub const MAX_PAGES: u32 = 10;
/// Prompts shorter than this (after trimming) are rejected locally.
const MIN_PROMPT_CHARS: usize = 3;

/// Story generation can take a while: the backend calls an LLM and an image
/// model per page.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Please provide a valid story prompt")]
    InvalidPrompt,
    #[error("Story generation failed: {detail}")]
    Backend { status: u16, detail: String },
    #[error("Could not reach the story service: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    user_prompt: &'a str,
    max_pages: u32,
}

/// Error body the backend sends on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GenerationClient {
    pub fn new(base_url: Url) -> Result<Self, GenerateError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Request one generated story.
    ///
    /// The prompt must carry at least three non-whitespace characters and
    /// `max_pages` is clamped into the backend's accepted range before the
    /// request goes out.
    pub async fn generate(&self, user_prompt: &str, max_pages: u32) -> Result<Story, GenerateError> {
        let prompt = user_prompt.trim();
        if prompt.chars().count() < MIN_PROMPT_CHARS {
            return Err(GenerateError::InvalidPrompt);
        }
        let max_pages = max_pages.clamp(MIN_PAGES, MAX_PAGES);

        let url = self
            .base_url
            .join("generate")
            .map_err(|_| GenerateError::Backend {
                status: 0,
                detail: "invalid backend URL".to_string(),
            })?;

        tracing::info!(%url, max_pages, "requesting story generation");
        let response = self
            .http
            .post(url)
            .json(&GenerateRequest {
                user_prompt: prompt,
                max_pages,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.detail)
                .unwrap_or_else(|_| status.to_string());
            tracing::warn!(status = status.as_u16(), %detail, "generation failed");
            return Err(GenerateError::Backend {
                status: status.as_u16(),
                detail,
            });
        }

        let story: Story = response.json().await?;
        let story = story.normalize();
        tracing::info!(title = %story.title, pages = story.page_count(), "story generated");
        Ok(story)
    }
}
