use std::{collections::HashMap, sync::Arc, time::Duration};

use log::*;
use reqwest::Client;
use serde_json::Value;

use crate::{UltraMsgApiError, UltraMsgConfig, WhatsAppMessage, WhatsAppSender};

/// Outbound requests must complete well inside the 60-second handling deadline that webhook callers give
/// the server, so the client enforces a stricter bound of its own.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(50);

#[derive(Clone)]
pub struct UltraMsgApi {
    config: UltraMsgConfig,
    client: Arc<Client>,
}

impl UltraMsgApi {
    pub fn new(config: UltraMsgConfig) -> Result<Self, UltraMsgApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| UltraMsgApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}/{endpoint}", self.config.api_url, self.config.instance_id)
    }

    /// POST a message request to the gateway.
    ///
    /// UltraMsg documents `application/x-www-form-urlencoded` bodies, but some instances only accept JSON.
    /// The request is sent form-encoded first; if the gateway answers with any 4xx/5xx status, it is retried
    /// exactly once with a JSON body. A failure of the retry is terminal. Transport errors (DNS, timeout)
    /// are never retried.
    async fn post_message(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, UltraMsgApiError> {
        let url = self.url(endpoint);
        trace!("📤️ POST {url} (form-encoded)");
        let response =
            self.client.post(&url).form(&params).send().await.map_err(|e| UltraMsgApiError::RequestError(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            trace!("📤️ Gateway accepted the form-encoded request. {status}");
            return response.json::<Value>().await.map_err(|e| UltraMsgApiError::JsonError(e.to_string()));
        }
        warn!("📤️ Gateway returned {status} for the form-encoded request to {endpoint}. Retrying with a JSON body.");
        let body: HashMap<&str, &str> = params.iter().copied().collect();
        let retry =
            self.client.post(&url).json(&body).send().await.map_err(|e| UltraMsgApiError::RequestError(e.to_string()))?;
        if retry.status().is_success() {
            debug!("📤️ JSON retry to {endpoint} succeeded.");
            retry.json::<Value>().await.map_err(|e| UltraMsgApiError::JsonError(e.to_string()))
        } else {
            let status = retry.status().as_u16();
            let message = retry.text().await.map_err(|e| UltraMsgApiError::RequestError(e.to_string()))?;
            Err(UltraMsgApiError::QueryError { status, message })
        }
    }

    /// Send a complete message: image with caption when an image URL is attached, plain text otherwise.
    pub async fn send_message(&self, message: &WhatsAppMessage) -> Result<Value, UltraMsgApiError> {
        match &message.image {
            Some(image) => self.send_image(&message.to, image, &message.body).await,
            None => self.send_text(&message.to, &message.body).await,
        }
    }

    /// Query the status of the gateway instance. Used for operational smoke checks only.
    pub async fn instance_status(&self) -> Result<Value, UltraMsgApiError> {
        let url = self.url("instance/status");
        debug!("📤️ Checking gateway instance status");
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.config.token.reveal().as_str())])
            .send()
            .await
            .map_err(|e| UltraMsgApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            response.json::<Value>().await.map_err(|e| UltraMsgApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| UltraMsgApiError::RequestError(e.to_string()))?;
            Err(UltraMsgApiError::QueryError { status, message })
        }
    }
}

impl WhatsAppSender for UltraMsgApi {
    async fn send_text(&self, to: &str, body: &str) -> Result<Value, UltraMsgApiError> {
        debug!("📤️ Sending text message to {to} ({} chars)", body.len());
        let token = self.config.token.reveal().clone();
        let params = [("token", token.as_str()), ("to", to), ("body", body)];
        let receipt = self.post_message("messages/chat", &params).await?;
        info!("📤️ Text message to {to} accepted by the gateway.");
        Ok(receipt)
    }

    async fn send_image(&self, to: &str, image_url: &str, caption: &str) -> Result<Value, UltraMsgApiError> {
        debug!("📤️ Sending image message to {to} ({image_url})");
        let token = self.config.token.reveal().clone();
        let params = [("token", token.as_str()), ("to", to), ("image", image_url), ("caption", caption)];
        let receipt = self.post_message("messages/image", &params).await?;
        info!("📤️ Image message to {to} accepted by the gateway.");
        Ok(receipt)
    }
}
