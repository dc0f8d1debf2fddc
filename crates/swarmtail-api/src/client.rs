//! HTTP client for the swarm management API

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, ApiResult};
use swarmtail_types::{ServiceInfo, StackInfo};

/// Read-only source of valid scope/service values for filter population
#[async_trait]
pub trait Directory: Send + Sync {
    /// All stacks with their services
    async fn stacks(&self) -> ApiResult<Vec<StackInfo>>;

    /// Services belonging to one stack
    async fn stack_services(&self, stack: &str) -> ApiResult<Vec<ServiceInfo>>;
}

/// Management API client
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for an API base such as `https://swarm.example.com/api`
    pub fn new(base: Url) -> ApiResult<Self> {
        if base.cannot_be_a_base() {
            return Err(ApiError::NotABase(base.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("swarmtail/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base })
    }

    /// The API base this client talks to
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Join path segments onto the base, percent-encoding each one
    pub(crate) fn url_for(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::NotABase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ApiResult<T> {
        debug!(%url, "directory request");
        let response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Directory for ApiClient {
    async fn stacks(&self) -> ApiResult<Vec<StackInfo>> {
        let url = self.url_for(&["stacks"])?;
        // The API encodes an empty list as `null`
        let stacks: Option<Vec<StackInfo>> = self.get_json(url).await?;
        let mut stacks = stacks.unwrap_or_default();
        stacks.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stacks)
    }

    async fn stack_services(&self, stack: &str) -> ApiResult<Vec<ServiceInfo>> {
        let url = self.url_for(&["stacks", stack])?;
        let services: Option<Vec<ServiceInfo>> = self.get_json(url).await?;
        let mut services = services.unwrap_or_default();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }
}
