//! PokeAPI client with response caching
//!
//! Every request goes through the shared [`TtlCache`]: the raw body is looked
//! up by URL first, and only fetched from the network on a miss. Bodies are
//! cached after they decode successfully, so error responses and transport
//! failures are never stored.

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{LocationArea, LocationAreaPage, Pokemon};
use crate::cache::TtlCache;

/// Base URL for the PokeAPI
pub const POKEAPI_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of location areas shown per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Errors that can occur when fetching from the PokeAPI
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status
    #[error("Response failed with status code: {code} and\nbody: {body}")]
    Status { code: u16, body: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Client for the PokeAPI endpoints used by the REPL
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    http_client: Client,
    cache: TtlCache,
    base_url: String,
    page_size: u32,
}

impl PokeApiClient {
    /// Creates a client for the public PokeAPI backed by `cache`
    pub fn new(cache: TtlCache) -> Self {
        Self {
            http_client: Client::new(),
            cache,
            base_url: POKEAPI_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Points the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets how many location areas the first page requests
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// The response cache this client reads and fills
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// URL of the first location-area page
    pub fn first_page_url(&self) -> String {
        format!(
            "{}/location-area/?offset=0&limit={}",
            self.base_url, self.page_size
        )
    }

    /// URL of a single location area
    pub fn location_area_url(&self, name: &str) -> String {
        format!("{}/location-area/{}/", self.base_url, path_segment(name))
    }

    /// URL of a single Pokemon
    pub fn pokemon_url(&self, name: &str) -> String {
        format!("{}/pokemon/{}/", self.base_url, path_segment(name))
    }

    /// Fetches a page of location areas
    ///
    /// # Arguments
    /// * `page_url` - A `next`/`previous` URL from an earlier page, or `None` for the first page
    pub async fn location_areas(&self, page_url: Option<&str>) -> Result<LocationAreaPage, ApiError> {
        match page_url {
            Some(url) => self.fetch_json(url).await,
            None => self.fetch_json(&self.first_page_url()).await,
        }
    }

    /// Fetches one location area by name or id
    pub async fn location_area(&self, name: &str) -> Result<LocationArea, ApiError> {
        self.fetch_json(&self.location_area_url(name)).await
    }

    /// Fetches one Pokemon by name or id
    pub async fn pokemon(&self, name: &str) -> Result<Pokemon, ApiError> {
        self.fetch_json(&self.pokemon_url(name)).await
    }

    /// Decodes the body for `url`, from cache if present, otherwise from the API
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        if let Some(body) = self.cache.get(url) {
            debug!(url, "cache hit");
            return Ok(serde_json::from_slice(&body)?);
        }

        debug!(url, "cache miss");
        let body = self.fetch_from_api(url).await?;
        let decoded = serde_json::from_slice(&body)?;
        self.cache.add(url, body);
        Ok(decoded)
    }

    /// Performs the GET request and validates the status code
    async fn fetch_from_api(&self, url: &str) -> Result<Bytes, ApiError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body)
    }
}

/// Escapes characters that would change the meaning of a URL path segment
fn path_segment(s: &str) -> String {
    s.replace('%', "%25")
        .replace(' ', "%20")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('#', "%23")
}

/// Serves one canned HTTP response on a local port and returns its API root
#[cfg(test)]
pub(crate) async fn serve_once(status_line: &'static str, body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Listener has no address");

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("Failed to accept connection");

        // Drain the request head before answering
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/api/v2")
}
