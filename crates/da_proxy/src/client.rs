//! JSON-RPC client implementing the DA interface against a remote server.

use crate::rpc::*;
use async_trait::async_trait;
use da::{Blob, Commitment, DaError, DataAvailability, Id, Proof, SubmitOptions, SubmitResult};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default server endpoint.
pub const DEFAULT_URL: &str = "http://localhost:7980";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL.
    pub url: String,
    /// Per-request timeout; exceeding it yields [`DaError::DeadlineExceeded`].
    pub timeout: Option<Duration>,
    /// Bearer token sent with every request.
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            timeout: None,
            token: None,
        }
    }
}

/// Remote DA client.
#[derive(Clone)]
pub struct DaClient {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
    request_id: Arc<AtomicU64>,
}

impl DaClient {
    /// Create a client for the given URL with default settings.
    pub fn new(url: impl Into<String>) -> Result<Self, DaError> {
        Self::from_config(ClientConfig {
            url: url.into(),
            ..Default::default()
        })
    }

    pub fn from_config(config: ClientConfig) -> Result<Self, DaError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;

        Ok(Self {
            client,
            url: config.url,
            token: config.token,
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        params: P,
    ) -> Result<R, DaError> {
        let request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION,
            id: self.next_id(),
            method: method.name(),
            params,
        };

        debug!("Calling {} on {}", method.name(), self.url);

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await.map_err(transport_error)?;

        let status = response.status();
        let json: JsonRpcResponse<R> = match response.json().await {
            Ok(json) => json,
            Err(_) if !status.is_success() => {
                return Err(DaError::Transport(format!("HTTP status {}", status)));
            }
            Err(e) => return Err(transport_error(e)),
        };

        if let Some(error) = json.error {
            return Err(error.into_da_error());
        }

        json.result
            .ok_or_else(|| DaError::InvalidResponse("no result in response".to_string()))
    }
}

#[async_trait]
impl DataAvailability for DaClient {
    async fn max_blob_size(&self) -> Result<u64, DaError> {
        let response: MaxBlobSizeResponse = self.call(Method::MaxBlobSize, ()).await?;
        Ok(response.max_blob_size)
    }

    async fn get(&self, ids: &[Id]) -> Result<Vec<Blob>, DaError> {
        let request = GetRequest { ids: ids.to_vec() };
        let response: GetResponse = self.call(Method::Get, request).await?;
        expect_len("blobs", response.blobs.len(), ids.len())?;
        Ok(response.blobs)
    }

    async fn get_ids(&self, height: u64) -> Result<Vec<Id>, DaError> {
        let response: GetIdsResponse = self.call(Method::GetIds, GetIdsRequest { height }).await?;
        Ok(response.ids)
    }

    async fn commit(&self, blobs: &[Blob]) -> Result<Vec<Commitment>, DaError> {
        let request = CommitRequest {
            blobs: blobs.to_vec(),
        };
        let response: CommitResponse = self.call(Method::Commit, request).await?;
        expect_len("commitments", response.commitments.len(), blobs.len())?;
        Ok(response.commitments)
    }

    async fn submit(
        &self,
        blobs: &[Blob],
        options: Option<&SubmitOptions>,
    ) -> Result<SubmitResult, DaError> {
        let request = SubmitRequest {
            blobs: blobs.to_vec(),
            options: options.map(WireSubmitOptions::from),
        };
        let response: SubmitResponse = self.call(Method::Submit, request).await?;
        expect_len("ids", response.ids.len(), blobs.len())?;
        expect_len("proofs", response.proofs.len(), blobs.len())?;
        Ok(SubmitResult {
            ids: response.ids,
            proofs: response.proofs,
        })
    }

    async fn validate(&self, ids: &[Id], proofs: &[Proof]) -> Result<Vec<bool>, DaError> {
        let request = ValidateRequest {
            ids: ids.to_vec(),
            proofs: proofs.to_vec(),
        };
        let response: ValidateResponse = self.call(Method::Validate, request).await?;
        expect_len("results", response.results.len(), ids.len())?;
        Ok(response.results)
    }
}

// Helper functions

fn transport_error(e: reqwest::Error) -> DaError {
    if e.is_timeout() {
        DaError::DeadlineExceeded
    } else if e.is_decode() {
        DaError::InvalidResponse(e.to_string())
    } else {
        DaError::Transport(e.to_string())
    }
}

fn expect_len(field: &str, got: usize, expected: usize) -> Result<(), DaError> {
    if got != expected {
        return Err(DaError::InvalidResponse(format!(
            "expected {} {}, got {}",
            expected, field, got
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.url, DEFAULT_URL);
        assert!(config.timeout.is_none());
        assert!(config.token.is_none());
    }

    #[test]
    fn test_request_ids_increase() {
        let client = DaClient::new("http://127.0.0.1:1").unwrap();
        let first = client.next_id();
        assert_eq!(client.clone().next_id(), first + 1);
    }

    #[test]
    fn test_expect_len() {
        assert!(expect_len("ids", 2, 2).is_ok());
        assert!(matches!(
            expect_len("ids", 1, 2),
            Err(DaError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = DaClient::new("http://127.0.0.1:1").unwrap();
        let err = client.get_ids(1).await.unwrap_err();
        assert!(matches!(err, DaError::Transport(_)), "got {err:?}");
    }
}
