//! Generic Data Availability interface.
//!
//! This crate defines the contract every DA backend implements: submit opaque
//! blobs, fetch them back by ID, list IDs per height, compute commitments and
//! validate proofs of publication. It also holds the closed error taxonomy
//! shared by backends and proxies, and the ID/commitment/proof primitives used
//! by the reference store.

pub mod crypto;
pub mod encoding;
pub mod error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use crypto::{hash_blob, verify, Signer};
pub use encoding::{decode_height, encode_id, id_commitment, ID_PREFIX_LEN};
pub use error::{DaError, ErrorCode, ErrorDetails};

/// Data submitted to and retrieved from the DA layer.
pub type Blob = Vec<u8>;

/// Serialized data required by the backend to locate a blob.
pub type Id = Vec<u8>;

/// Serialized cryptographic commitment to a blob.
pub type Commitment = Vec<u8>;

/// Serialized proof of publication of a blob.
pub type Proof = Vec<u8>;

/// A 32-byte hash value.
pub type Hash32 = [u8; 32];

/// Backend routing hints attached to a submission.
///
/// The core contract does not interpret these; real backends may use them to
/// pick a fee or a target namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Gas price to pay for the submission (backend specific, `0.0` = default).
    pub gas_price: f64,
    /// Target namespace.
    pub namespace: Vec<u8>,
}

impl SubmitOptions {
    /// Options targeting the given namespace with the default gas price.
    pub fn with_namespace(namespace: impl Into<Vec<u8>>) -> Self {
        Self {
            gas_price: 0.0,
            namespace: namespace.into(),
        }
    }
}

/// Result of a successful submission.
///
/// `ids[i]` and `proofs[i]` belong to the i-th submitted blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub ids: Vec<Id>,
    pub proofs: Vec<Proof>,
}

/// Generic interface for interaction with Data Availability layers.
///
/// Every operation is batched and preserves positional correspondence with its
/// input. A call either returns a complete result or a [`DaError`], never a
/// partial result.
#[async_trait]
pub trait DataAvailability: Send + Sync {
    /// Maximum size of a single blob in bytes.
    async fn max_blob_size(&self) -> Result<u64, DaError>;

    /// Get the blobs for the given IDs, in request order.
    ///
    /// Fails with [`DaError::InvalidId`] if an ID is malformed and with
    /// [`DaError::BlobNotFound`] if an ID is unknown to the backend.
    async fn get(&self, ids: &[Id]) -> Result<Vec<Blob>, DaError>;

    /// IDs of all blobs submitted at the given height, in submission order.
    async fn get_ids(&self, height: u64) -> Result<Vec<Id>, DaError>;

    /// Commitments for the given blobs. Does not touch storage.
    async fn commit(&self, blobs: &[Blob]) -> Result<Vec<Commitment>, DaError>;

    /// Submit a batch of blobs.
    ///
    /// All blobs of one call land at the same height, or none do.
    async fn submit(
        &self,
        blobs: &[Blob],
        options: Option<&SubmitOptions>,
    ) -> Result<SubmitResult, DaError>;

    /// Check each proof against its ID without retrieving the blob.
    async fn validate(&self, ids: &[Id], proofs: &[Proof]) -> Result<Vec<bool>, DaError>;
}
