//! HTTP requests backed by reqwest.

use super::r#trait::*;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::debug;

/// [`HttpRequester`] using a shared reqwest client.
#[derive(Clone)]
pub struct ReqwestRequester {
    client: Client,
}

impl ReqwestRequester {
    /// Create a requester with a default client.
    pub fn new() -> Self {
        Self {
            client: ClientBuilder::new().build().unwrap_or_default(),
        }
    }

    /// Use an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestRequester {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpRequester for ReqwestRequester {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("{} {}", request.method, request.url);

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url).form(&request.form),
        };

        for (k, v) in &request.headers {
            builder = builder.header(k.as_str(), v.as_str());
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
