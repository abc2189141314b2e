use super::RemoteIncidentGateway;
use crate::config::GatewayConfig;
use crate::error::{AppError, Result};
use crate::models::{
    CreateIncidentDto, Incident, IncidentStatus, Severity, SeverityPatch, StatusPatch,
    UpdateIncidentDto,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const RESOURCE: &str = "incidents";

/// Incident service client over HTTP/JSON
#[derive(Clone)]
pub struct HttpIncidentGateway {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    pub(crate) timeout_secs: u64,
}

impl HttpIncidentGateway {
    /// Create a new gateway
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            AppError::Configuration(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Configuration(format!(
                "Base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            timeout_secs: config.timeout_secs,
        })
    }

    /// `{base}/incidents[/segment...]`, with each segment percent-encoded
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AppError::Configuration(format!("Base URL '{}' cannot carry a path", self.base_url))
            })?;
            path.pop_if_empty().push(RESOURCE).extend(segments);
        }
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        debug!(method = %method, url = %url, "Incident service request");
        Ok(self
            .client
            .request(method, url)
            .header("Accept", "application/json"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!(
                    "Incident service request timed out after {} seconds",
                    self.timeout_secs
                ))
            } else if e.is_connect() {
                AppError::Network(format!("Failed to connect to incident service: {}", e))
            } else {
                AppError::Network(format!("Incident service request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            warn!(
                status = status.as_u16(),
                body_length = body.len(),
                "Incident service returned non-success status"
            );
            return Err(AppError::Http {
                status: status.as_u16(),
                body: if body.is_empty() {
                    "No response body".to_string()
                } else {
                    body
                },
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl RemoteIncidentGateway for HttpIncidentGateway {
    async fn list(&self) -> Result<Vec<Incident>> {
        self.send_json(self.request(Method::GET, &[])?).await
    }

    async fn get(&self, id: &str) -> Result<Incident> {
        self.send_json(self.request(Method::GET, &[id])?).await
    }

    async fn create(&self, dto: &CreateIncidentDto) -> Result<Incident> {
        self.send_json(self.request(Method::POST, &[])?.json(dto))
            .await
    }

    async fn update(&self, id: &str, dto: &UpdateIncidentDto) -> Result<Incident> {
        self.send_json(self.request(Method::PATCH, &[id])?.json(dto))
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, &[id])?).await?;
        Ok(())
    }

    async fn update_status(&self, id: &str, status: IncidentStatus) -> Result<Incident> {
        self.send_json(
            self.request(Method::PATCH, &[id, "status"])?
                .json(&StatusPatch { status }),
        )
        .await
    }

    async fn update_severity(&self, id: &str, severity: Severity) -> Result<Incident> {
        self.send_json(
            self.request(Method::PATCH, &[id, "severity"])?
                .json(&SeverityPatch { severity }),
        )
        .await
    }
}
