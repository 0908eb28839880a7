//! Webhook sink: HTTP POST of the event payload as JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{required_url, NotifierSink, SinkError};
use crate::event::NotifierEvent;
use burrow_core::{BurrowError, NotifierConfig, Result};

pub struct WebhookSink {
    name: String,
    url: String,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let url = required_url(config)?;

        let mut headers = HeaderMap::new();
        for (key, value) in &config.extra_headers {
            let name = key.parse::<HeaderName>().map_err(|e| {
                BurrowError::Config(format!(
                    "notifier {} has an invalid header name {}: {}",
                    config.name, key, e
                ))
            })?;
            let value = value.parse::<HeaderValue>().map_err(|e| {
                BurrowError::Config(format!(
                    "notifier {} has an invalid header value for {}: {}",
                    config.name, key, e
                ))
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                BurrowError::Config(format!("notifier {}: cannot build http client: {}", config.name, e))
            })?;

        Ok(WebhookSink {
            name: config.name.clone(),
            url,
            client,
        })
    }
}

#[async_trait]
impl NotifierSink for WebhookSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn dispatch(&self, event: &NotifierEvent) -> std::result::Result<(), SinkError> {
        let response = self.client.post(&self.url).json(event).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}
