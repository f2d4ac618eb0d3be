//! HTTP transport over reqwest.

use std::future::Future;

use postboard_proto::{AUTHORIZATION, AuthorizedRequest, Method, Response};
use reqwest::header::CONTENT_TYPE;

use crate::{AppConfig, Transport, TransportError};

/// Production transport.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from the application configuration.
    pub fn new(config: &AppConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::NoResponse(format!("http client: {e}")))?;

        Ok(Self { base_url: config.base_url.trim_end_matches('/').to_string(), client })
    }

    /// Server root requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: AuthorizedRequest,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send + 'static {
        let endpoint = request.request.endpoint().clone();
        let url = format!("{}{}", self.base_url, endpoint.path());
        let mut builder = self.client.request(method(endpoint.method()), url);

        if let Some(value) = request.authorization.as_deref() {
            builder = builder.header(AUTHORIZATION, value);
        }

        let body = request.request.encode_body();

        async move {
            match body {
                Ok(Some(bytes)) => builder = builder.header(CONTENT_TYPE, "application/json").body(bytes),
                Ok(None) => {},
                Err(e) => return Err(TransportError::NoResponse(e.to_string())),
            }

            let response = builder.send().await.map_err(|e| {
                tracing::debug!(%endpoint, error = %e, "no response");
                TransportError::NoResponse(e.to_string())
            })?;

            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::NoResponse(format!("reading body: {e}")))?;

            tracing::debug!(%endpoint, status, "response received");
            Ok(Response { status, body: body.to_vec() })
        }
    }
}
