//! HTTP client for the remote schema registry's `GetImage`/`Search` RPCs.

use super::descriptor_json::JsonFileDescriptorProto;
use crate::error::{McpError, McpResult};
use prost_types::FileDescriptorProto;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);
const TRANSPORT_CAP: Duration = Duration::from_secs(30);

pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
    max_error_body_sample: usize,
}

#[derive(Debug, Serialize)]
struct GetImageRequest<'a> {
    owner: &'a str,
    repository: &'a str,
    reference: &'a str,
}

#[derive(Debug, Deserialize)]
struct GetImageResponse {
    image: Image,
}

#[derive(Debug, Deserialize)]
struct Image {
    /// Each entry is a `google.protobuf.FileDescriptorProto` rendered via
    /// protobuf's canonical JSON mapping (`file` is a repeated message
    /// field, not `bytes`). Parsed through [`JsonFileDescriptorProto`],
    /// which drops unrecognized keys instead of erroring on them.
    file: Vec<JsonFileDescriptorProto>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    #[serde(rename = "pageSize")]
    page_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "searchResults")]
    pub search_results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub repository: RepositoryRef,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>, max_error_body_sample: usize) -> McpResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(TRANSPORT_CAP)
            .timeout(TRANSPORT_CAP)
            .build()
            .map_err(|e| McpError::Internal(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            max_error_body_sample,
        })
    }

    fn bearer_token() -> Option<String> {
        std::env::var("BUF_TOKEN").ok()
    }

    async fn bound_body_sample(resp: reqwest::Response, cap: usize) -> String {
        match resp.text().await {
            Ok(body) => {
                let mut end = body.len().min(cap);
                while end > 0 && !body.is_char_boundary(end) {
                    end -= 1;
                }
                body[..end].to_string()
            }
            Err(_) => String::new(),
        }
    }

    /// `POST <base>/.../ImageService/GetImage`, returning the file
    /// descriptors decoded from the registry's JSON response.
    pub async fn get_image(
        &self,
        owner: &str,
        repository: &str,
        reference: &str,
        deadline: Option<Duration>,
    ) -> McpResult<Vec<FileDescriptorProto>> {
        let deadline = deadline.unwrap_or(DEFAULT_DEADLINE);
        let url = format!("{}/buf.alpha.registry.v1alpha1.ImageService/GetImage", self.base_url);

        let mut req = self
            .http
            .post(&url)
            .json(&GetImageRequest {
                owner,
                repository,
                reference,
            })
            .timeout(deadline);
        if let Some(token) = Self::bearer_token() {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| McpError::RegistryUnreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = Self::bound_body_sample(resp, self.max_error_body_sample).await;
            return Err(McpError::RegistryStatus { status, body });
        }

        let parsed: GetImageResponse = resp
            .json()
            .await
            .map_err(|e| McpError::MalformedMessage(e.to_string()))?;
        parsed
            .image
            .file
            .into_iter()
            .map(JsonFileDescriptorProto::into_proto)
            .collect()
    }

    /// `POST <base>/.../SearchService/Search`.
    pub async fn search(
        &self,
        query: &str,
        page_size: u32,
        deadline: Option<Duration>,
    ) -> McpResult<SearchResponse> {
        let deadline = deadline.unwrap_or(DEFAULT_DEADLINE);
        let url = format!("{}/buf.alpha.registry.v1alpha1.SearchService/Search", self.base_url);

        let mut req = self
            .http
            .post(&url)
            .json(&SearchRequest { query, page_size })
            .timeout(deadline);
        if let Some(token) = Self::bearer_token() {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| McpError::RegistryUnreachable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = Self::bound_body_sample(resp, self.max_error_body_sample).await;
            return Err(McpError::RegistryStatus { status, body });
        }

        resp.json()
            .await
            .map_err(|e| McpError::MalformedMessage(e.to_string()))
    }
}
