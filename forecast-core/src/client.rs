use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;
use tracing::debug;

use crate::{Config, error::TransportError};

/// Fetches the raw forecast payload for a city.
#[async_trait]
pub trait ForecastClient: Send + Sync + Debug {
    /// Issue exactly one request; no retries, no caching.
    async fn fetch(&self, city_name: &str) -> Result<Vec<u8>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct HttpForecastClient {
    url: String,
    city_param: String,
    http: Client,
}

impl HttpForecastClient {
    pub fn new(url: impl Into<String>, city_param: impl Into<String>) -> Self {
        Self { url: url.into(), city_param: city_param.into(), http: Client::new() }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            url: config.endpoint.url.clone(),
            city_param: config.endpoint.city_param.clone(),
            http,
        })
    }
}

#[async_trait]
impl ForecastClient for HttpForecastClient {
    async fn fetch(&self, city_name: &str) -> Result<Vec<u8>, TransportError> {
        debug!(url = %self.url, city = city_name, "sending forecast request");

        let res = self
            .http
            .get(&self.url)
            .query(&[(self.city_param.as_str(), city_name)])
            .send()
            .await?;

        let status = res.status();
        let body = res.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::new(format!(
                "request failed with status {}: {}",
                status,
                truncate_body(&String::from_utf8_lossy(&body)),
            )));
        }

        debug!(bytes = body.len(), "forecast response received");
        Ok(body.to_vec())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
