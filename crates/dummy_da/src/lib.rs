//! In-memory DA backend.
//!
//! Not production ready, intended for tests and local development. Blobs are
//! kept in a map keyed by height, where every `submit` call opens a new height.
//! IDs are `LE64(height) ++ SHA-256(blob)`, commitments are SHA-256 hashes and
//! proofs are Ed25519 signatures over the commitment.

use async_trait::async_trait;
use da::crypto::VerifyingKey;
use da::{
    decode_height, encode_id, hash_blob, id_commitment, verify, Blob, Commitment, DaError,
    DataAvailability, Id, Proof, Signer, SubmitOptions, SubmitResult,
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Default maximum blob size in bytes.
pub const DEFAULT_MAX_BLOB_SIZE: u64 = 64 * 64 * 482;

/// Configuration for the in-memory store.
#[derive(Debug, Clone)]
pub struct DummyDaConfig {
    /// Blobs larger than this are rejected with [`DaError::BlobSizeOverLimit`].
    pub max_blob_size: u64,
    /// When set, `get_ids` fails with [`DaError::FutureHeight`] for heights
    /// more than this many blocks above the current height.
    pub future_height_tolerance: Option<u64>,
}

impl Default for DummyDaConfig {
    fn default() -> Self {
        Self {
            max_blob_size: DEFAULT_MAX_BLOB_SIZE,
            future_height_tolerance: None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    id: Id,
    blob: Blob,
}

#[derive(Debug, Default)]
struct StoreState {
    height: u64,
    data: HashMap<u64, Vec<Entry>>,
}

/// In-memory implementation of [`DataAvailability`].
#[derive(Debug)]
pub struct DummyDa {
    /// Guards the height counter and the stored entries together.
    state: Mutex<StoreState>,
    signer: Signer,
    config: DummyDaConfig,
}

impl DummyDa {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DummyDaConfig::default())
    }

    /// Create an empty store with a fresh signing key.
    pub fn with_config(config: DummyDaConfig) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            signer: Signer::generate(),
            config,
        }
    }

    /// Current height (number of completed submissions).
    pub async fn height(&self) -> u64 {
        self.state.lock().await.height
    }

    /// Key that proofs issued by this store verify against.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signer.verifying_key()
    }

    pub fn config(&self) -> &DummyDaConfig {
        &self.config
    }
}

impl Default for DummyDa {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataAvailability for DummyDa {
    async fn max_blob_size(&self) -> Result<u64, DaError> {
        Ok(self.config.max_blob_size)
    }

    async fn get(&self, ids: &[Id]) -> Result<Vec<Blob>, DaError> {
        let heights = ids
            .iter()
            .map(|id| decode_height(id))
            .collect::<Result<Vec<_>, _>>()?;

        let state = self.state.lock().await;
        ids.iter()
            .zip(heights)
            .map(|(id, height)| {
                state
                    .data
                    .get(&height)
                    .and_then(|entries| entries.iter().find(|e| &e.id == id))
                    .map(|e| e.blob.clone())
                    .ok_or(DaError::BlobNotFound)
            })
            .collect()
    }

    async fn get_ids(&self, height: u64) -> Result<Vec<Id>, DaError> {
        let state = self.state.lock().await;
        if let Some(tolerance) = self.config.future_height_tolerance {
            if height > state.height.saturating_add(tolerance) {
                return Err(DaError::FutureHeight);
            }
        }
        Ok(state
            .data
            .get(&height)
            .map(|entries| entries.iter().map(|e| e.id.clone()).collect())
            .unwrap_or_default())
    }

    async fn commit(&self, blobs: &[Blob]) -> Result<Vec<Commitment>, DaError> {
        Ok(blobs.iter().map(|b| hash_blob(b).to_vec()).collect())
    }

    async fn submit(
        &self,
        blobs: &[Blob],
        options: Option<&SubmitOptions>,
    ) -> Result<SubmitResult, DaError> {
        if blobs
            .iter()
            .any(|b| b.len() as u64 > self.config.max_blob_size)
        {
            return Err(DaError::BlobSizeOverLimit);
        }

        let mut state = self.state.lock().await;
        state.height += 1;
        let height = state.height;

        let mut ids = Vec::with_capacity(blobs.len());
        let mut proofs = Vec::with_capacity(blobs.len());
        let mut entries = Vec::with_capacity(blobs.len());
        for blob in blobs {
            let commitment = hash_blob(blob);
            let id = encode_id(height, &commitment);
            proofs.push(self.signer.sign(&commitment));
            ids.push(id.clone());
            entries.push(Entry {
                id,
                blob: blob.clone(),
            });
        }
        state.data.entry(height).or_default().extend(entries);

        debug!(
            "Submitted {} blobs at height {} (namespace={})",
            blobs.len(),
            height,
            options.map(|o| hex::encode(&o.namespace)).unwrap_or_default()
        );

        Ok(SubmitResult { ids, proofs })
    }

    async fn validate(&self, ids: &[Id], proofs: &[Proof]) -> Result<Vec<bool>, DaError> {
        if ids.len() != proofs.len() {
            return Err(DaError::LengthMismatch);
        }
        let key = self.signer.verifying_key();
        Ok(ids
            .iter()
            .zip(proofs)
            .map(|(id, proof)| {
                id_commitment(id)
                    .map(|commitment| verify(&key, commitment, proof))
                    .unwrap_or(false)
            })
            .collect())
    }
}
