// JSON-RPC over HTTP: one POST per call.

use std::future::Future;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::warn;
use url::Url;

use flame_common::protocol::jsonrpc::NOT_LOGGED_IN;

use super::{decode_response, RequestIds, Transport, TransportError};

#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    url: Url,
    ids: RequestIds,
}

impl HttpTransport {
    pub fn new(url: Url) -> Result<Self, TransportError> {
        let client = Client::builder().build().map_err(|error| {
            TransportError::Unavailable(format!("failed to build http client: {error}"))
        })?;
        Ok(Self::with_client(client, url))
    }

    /// Use a preconfigured client (proxies, TLS roots, default headers).
    pub fn with_client(client: Client, url: Url) -> Self {
        Self { client, url, ids: RequestIds::default() }
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        method: &'static str,
        params: Value,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send {
        async move {
            let request = self.ids.next_request(method, params);

            let response =
                self.client.post(self.url.clone()).json(&request).send().await.map_err(|error| {
                    warn!(method, url = %self.url, %error, "http request failed");
                    TransportError::Unavailable(format!(
                        "failed to reach `{}`: {error}",
                        self.url
                    ))
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(status_error(status));
            }

            let body = response.bytes().await.map_err(|error| {
                TransportError::Unavailable(format!("failed reading response body: {error}"))
            })?;
            decode_response(&body)
        }
    }
}

fn status_error(status: StatusCode) -> TransportError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Rejected {
            code: NOT_LOGGED_IN,
            message: format!("http status {status}"),
        },
        _ => TransportError::Unavailable(format!("http status {status}")),
    }
}
