pub mod html;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::error::{AcquireError, AcquireResult};
use crate::icon::validate_image;

const CLIENT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single GET. Implemented over reqwest for real runs and by in-memory
/// fakes in tests.
#[allow(async_fn_in_trait)]
pub trait Fetch {
    async fn get(&self, url: &str, user_agent: Option<&str>) -> AcquireResult<FetchResponse>;

    /// GET `url` and keep the body only if it is a non-empty, readable image.
    async fn get_image(&self, url: &str, user_agent: Option<&str>) -> AcquireResult<Vec<u8>> {
        let response = self.get(url, user_agent).await?;
        if !response.is_success() {
            return Err(AcquireError::Status(response.status));
        }
        if response.body.is_empty() {
            return Err(AcquireError::EmptyBody);
        }
        validate_image(&response.body).map_err(|e| AcquireError::InvalidImage(e.to_string()))?;
        Ok(response.body)
    }
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Every request made through this client is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .timeout(timeout)
            .redirect(Policy::limited(10))
            .user_agent(CLIENT_USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpClient {
    async fn get(&self, url: &str, user_agent: Option<&str>) -> AcquireResult<FetchResponse> {
        let mut request = self.client.get(url);
        if let Some(agent) = user_agent {
            request = request.header(USER_AGENT, agent);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(FetchResponse {
                status: status.as_u16(),
                body: Vec::new(),
            });
        }

        let body = response.bytes().await?;
        Ok(FetchResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
