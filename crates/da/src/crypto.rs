//! Commitment hashing and proof signing.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _};
use sha2::{Digest, Sha256};

use crate::{Hash32, Proof};

pub use ed25519_dalek::VerifyingKey;

/// Compute the commitment of a blob (SHA-256).
pub fn hash_blob(data: &[u8]) -> Hash32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Ed25519 key used to issue proofs.
pub struct Signer(SigningKey);

impl Signer {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self(SigningKey::generate(&mut csprng))
    }

    /// Create from a raw 32-byte secret.
    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self(SigningKey::from_bytes(&secret))
    }

    /// The public key proofs verify against.
    pub fn verifying_key(&self) -> VerifyingKey {
        self.0.verifying_key()
    }

    /// Sign a message, producing a 64-byte proof.
    pub fn sign(&self, message: &[u8]) -> Proof {
        self.0.sign(message).to_bytes().to_vec()
    }

    /// Raw secret key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Signer({})",
            hex::encode(self.0.verifying_key().to_bytes())
        )
    }
}

/// Check a proof over `message`.
///
/// Malformed proofs are reported as `false`, not as an error.
pub fn verify(key: &VerifyingKey, message: &[u8], proof: &[u8]) -> bool {
    let Ok(bytes) = <[u8; 64]>::try_from(proof) else {
        return false;
    };
    key.verify(message, &Signature::from_bytes(&bytes)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash_blob(b"message 1"), hash_blob(b"message 1"));
        assert_ne!(hash_blob(b"message 1"), hash_blob(b"message 2"));
    }

    #[test]
    fn test_hash_known_vector() {
        assert_eq!(
            hex::encode(hash_blob(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = Signer::generate();
        let commitment = hash_blob(b"message 1");
        let proof = signer.sign(&commitment);
        assert_eq!(proof.len(), 64);
        assert!(verify(&signer.verifying_key(), &commitment, &proof));
    }

    #[test]
    fn test_verify_wrong_message() {
        let signer = Signer::generate();
        let proof = signer.sign(&hash_blob(b"message 1"));
        assert!(!verify(
            &signer.verifying_key(),
            &hash_blob(b"message 2"),
            &proof
        ));
    }

    #[test]
    fn test_verify_wrong_key() {
        let signer = Signer::generate();
        let other = Signer::generate();
        let commitment = hash_blob(b"message");
        let proof = signer.sign(&commitment);
        assert!(!verify(&other.verifying_key(), &commitment, &proof));
    }

    #[test]
    fn test_verify_malformed_proof() {
        let signer = Signer::generate();
        let commitment = hash_blob(b"message");
        assert!(!verify(&signer.verifying_key(), &commitment, b"not a signature"));
        assert!(!verify(&signer.verifying_key(), &commitment, &[]));
    }

    #[test]
    fn test_from_bytes_stable() {
        let a = Signer::from_bytes([7u8; 32]);
        let b = Signer::from_bytes([7u8; 32]);
        assert_eq!(a.verifying_key(), b.verifying_key());
        assert_eq!(a.as_bytes(), &[7u8; 32]);
    }
}
