//! JSON-RPC proxy for the DA interface.
//!
//! [`DaServer`] exposes any [`da::DataAvailability`] backend over HTTP and
//! [`DaClient`] implements the same trait by forwarding every call to such a
//! server. Domain errors cross the wire as a numeric code plus a structured
//! detail, so callers see the same [`da::DaError`] kinds whether the backend is
//! local or remote.

pub mod auth;
pub mod client;
pub mod rpc;
pub mod server;

pub use auth::{
    AuthDisabled, AuthError, AuthGate, Permission, TokenAuth, TokenIssuer, ALL_PERMS,
    DEFAULT_PERMS, READ_PERMS, READ_WRITE_PERMS,
};
pub use client::{ClientConfig, DaClient, DEFAULT_URL};
pub use server::{DaServer, ServerConfig, ServerError, ServerHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use da::{
        Blob, Commitment, DaError, DataAvailability, ErrorCode, Id, Proof, SubmitOptions,
        SubmitResult,
    };
    use dummy_da::DummyDa;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn localhost() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    /// Backend failing every call with a configurable error.
    struct FailingDa {
        error: Mutex<DaError>,
    }

    impl FailingDa {
        fn new(error: DaError) -> Self {
            Self {
                error: Mutex::new(error),
            }
        }

        fn set(&self, error: DaError) {
            *self.error.lock().unwrap() = error;
        }

        fn fail<T>(&self) -> Result<T, DaError> {
            Err(self.error.lock().unwrap().clone())
        }
    }

    #[async_trait]
    impl DataAvailability for FailingDa {
        async fn max_blob_size(&self) -> Result<u64, DaError> {
            self.fail()
        }
        async fn get(&self, _ids: &[Id]) -> Result<Vec<Blob>, DaError> {
            self.fail()
        }
        async fn get_ids(&self, _height: u64) -> Result<Vec<Id>, DaError> {
            self.fail()
        }
        async fn commit(&self, _blobs: &[Blob]) -> Result<Vec<Commitment>, DaError> {
            self.fail()
        }
        async fn submit(
            &self,
            _blobs: &[Blob],
            _options: Option<&SubmitOptions>,
        ) -> Result<SubmitResult, DaError> {
            self.fail()
        }
        async fn validate(&self, _ids: &[Id], _proofs: &[Proof]) -> Result<Vec<bool>, DaError> {
            self.fail()
        }
    }

    /// Backend whose `get_ids` takes longer than any test timeout.
    struct SlowDa {
        inner: DummyDa,
        delay: Duration,
    }

    #[async_trait]
    impl DataAvailability for SlowDa {
        async fn max_blob_size(&self) -> Result<u64, DaError> {
            self.inner.max_blob_size().await
        }
        async fn get(&self, ids: &[Id]) -> Result<Vec<Blob>, DaError> {
            self.inner.get(ids).await
        }
        async fn get_ids(&self, height: u64) -> Result<Vec<Id>, DaError> {
            tokio::time::sleep(self.delay).await;
            self.inner.get_ids(height).await
        }
        async fn commit(&self, blobs: &[Blob]) -> Result<Vec<Commitment>, DaError> {
            self.inner.commit(blobs).await
        }
        async fn submit(
            &self,
            blobs: &[Blob],
            options: Option<&SubmitOptions>,
        ) -> Result<SubmitResult, DaError> {
            self.inner.submit(blobs, options).await
        }
        async fn validate(&self, ids: &[Id], proofs: &[Proof]) -> Result<Vec<bool>, DaError> {
            self.inner.validate(ids, proofs).await
        }
    }

    fn slow_da() -> Arc<SlowDa> {
        Arc::new(SlowDa {
            inner: DummyDa::new(),
            delay: Duration::from_millis(500),
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_proxy_suite() {
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::new(handle.url()).unwrap();

        da_test_suite::run_da_test_suite(Arc::new(client)).await;

        handle.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_proxy_suite_with_auth() {
        let issuer = TokenIssuer::generate();
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .with_auth(Arc::new(issuer.gate()))
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::from_config(ClientConfig {
            url: handle.url(),
            token: Some(issuer.issue(READ_WRITE_PERMS).unwrap()),
            ..Default::default()
        })
        .unwrap();

        da_test_suite::run_da_test_suite(Arc::new(client)).await;

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_suite_over_dyn_backend() {
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .start(localhost())
            .await
            .unwrap();
        let backends: Vec<Arc<dyn DataAvailability>> = vec![
            Arc::new(DummyDa::new()),
            Arc::new(DaClient::new(handle.url()).unwrap()),
        ];
        for backend in backends {
            da_test_suite::basic_da_test(backend.as_ref()).await;
            da_test_suite::check_errors(backend.as_ref()).await;
        }
    }

    #[tokio::test]
    async fn test_max_blob_size_through_proxy() {
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::new(handle.url()).unwrap();
        assert_eq!(
            client.max_blob_size().await.unwrap(),
            dummy_da::DEFAULT_MAX_BLOB_SIZE
        );
    }

    #[tokio::test]
    async fn test_domain_errors_roundtrip() {
        let backend = Arc::new(FailingDa::new(DaError::BlobNotFound));
        let handle = DaServer::new(backend.clone())
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::new(handle.url()).unwrap();

        for code in ErrorCode::ALL {
            let expected = DaError::from(code);
            backend.set(expected.clone());
            assert_eq!(client.get(&[vec![0u8; 40]]).await.unwrap_err(), expected);
            assert_eq!(
                client.submit(&[b"x".to_vec()], None).await.unwrap_err(),
                expected
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_error_stays_opaque() {
        let backend = Arc::new(FailingDa::new(DaError::Backend("disk on fire".into())));
        let handle = DaServer::new(backend).start(localhost()).await.unwrap();
        let client = DaClient::new(handle.url()).unwrap();

        match client.get_ids(1).await.unwrap_err() {
            DaError::Rpc { code, message } => {
                assert_eq!(code, rpc::SERVER_ERROR);
                assert!(message.contains("disk on fire"));
            }
            other => panic!("expected opaque RPC error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_token_cannot_submit() {
        let issuer = TokenIssuer::generate();
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .with_auth(Arc::new(issuer.gate()))
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::from_config(ClientConfig {
            url: handle.url(),
            token: Some(issuer.issue(READ_PERMS).unwrap()),
            ..Default::default()
        })
        .unwrap();

        assert!(client.get_ids(1).await.unwrap().is_empty());
        match client.submit(&[b"x".to_vec()], None).await.unwrap_err() {
            DaError::Rpc { code, .. } => assert_eq!(code, rpc::PERMISSION_DENIED),
            other => panic!("expected permission error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_token_only_public() {
        let issuer = TokenIssuer::generate();
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .with_auth(Arc::new(issuer.gate()))
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::new(handle.url()).unwrap();

        match client.get_ids(1).await.unwrap_err() {
            DaError::Rpc { code, .. } => assert_eq!(code, rpc::PERMISSION_DENIED),
            other => panic!("expected permission error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_forged_token_rejected() {
        let issuer = TokenIssuer::generate();
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .with_auth(Arc::new(issuer.gate()))
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::from_config(ClientConfig {
            url: handle.url(),
            token: Some(TokenIssuer::generate().issue(ALL_PERMS).unwrap()),
            ..Default::default()
        })
        .unwrap();

        match client.get_ids(1).await.unwrap_err() {
            DaError::Rpc { code, .. } => assert_eq!(code, rpc::UNAUTHORIZED),
            other => panic!("expected unauthorized error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_timeout_is_deadline_exceeded() {
        let handle = DaServer::new(slow_da()).start(localhost()).await.unwrap();
        let client = DaClient::from_config(ClientConfig {
            url: handle.url(),
            timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            client.get_ids(1).await.unwrap_err(),
            DaError::DeadlineExceeded
        );
    }

    #[tokio::test]
    async fn test_server_timeout_is_deadline_exceeded() {
        let config = ServerConfig {
            request_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let handle = DaServer::new(slow_da())
            .with_config(config)
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::new(handle.url()).unwrap();

        assert_eq!(
            client.get_ids(1).await.unwrap_err(),
            DaError::DeadlineExceeded
        );
        // Calls that finish in time are unaffected.
        assert!(client.commit(&[b"x".to_vec()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_stopped_server_unreachable() {
        let handle = DaServer::new(Arc::new(DummyDa::new()))
            .start(localhost())
            .await
            .unwrap();
        let client = DaClient::new(handle.url()).unwrap();
        assert!(client.get_ids(1).await.is_ok());

        handle.stop().await.unwrap();
        assert!(matches!(
            client.get_ids(1).await.unwrap_err(),
            DaError::Transport(_)
        ));
    }
}
