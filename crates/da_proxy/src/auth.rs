//! Permission gate in front of the DA service.
//!
//! Each method requires one [`Permission`]. An [`AuthGate`] turns the caller's
//! bearer token into a permission set, and the server checks the method's
//! requirement against it before dispatching.
//!
//! Tokens issued by [`TokenIssuer`] have the form
//! `base64url(json payload) "." base64url(ed25519 signature)`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use da::crypto::VerifyingKey;
use da::{verify, Signer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rpc::Method;

/// Access levels for DA methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Public,
    Read,
    Write,
    Admin,
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Public => "public",
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Permission {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            other => Err(AuthError::UnknownPermission(other.to_string())),
        }
    }
}

/// Granted to callers without a token.
pub const DEFAULT_PERMS: &[Permission] = &[Permission::Public];
pub const READ_PERMS: &[Permission] = &[Permission::Public, Permission::Read];
pub const READ_WRITE_PERMS: &[Permission] =
    &[Permission::Public, Permission::Read, Permission::Write];
pub const ALL_PERMS: &[Permission] = &[
    Permission::Public,
    Permission::Read,
    Permission::Write,
    Permission::Admin,
];

/// Permission a caller needs to invoke `method`.
pub fn required_permission(method: Method) -> Permission {
    match method {
        Method::MaxBlobSize | Method::Get | Method::GetIds | Method::Commit | Method::Validate => {
            Permission::Read
        }
        Method::Submit => Permission::Write,
    }
}

/// Errors from token handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed token")]
    MalformedToken,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("invalid token payload: {0}")]
    InvalidPayload(String),
    #[error("unknown permission: {0}")]
    UnknownPermission(String),
}

/// Resolves the permissions of a caller.
pub trait AuthGate: Send + Sync {
    /// Permissions granted for `token` (`None` when no token was presented).
    fn permissions(&self, token: Option<&str>) -> Result<Vec<Permission>, AuthError>;
}

/// Grants every permission to every caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthDisabled;

impl AuthGate for AuthDisabled {
    fn permissions(&self, _token: Option<&str>) -> Result<Vec<Permission>, AuthError> {
        Ok(ALL_PERMS.to_vec())
    }
}

#[derive(Serialize, Deserialize)]
struct TokenPayload {
    allow: Vec<Permission>,
}

/// Issues signed permission tokens.
#[derive(Debug)]
pub struct TokenIssuer {
    signer: Signer,
}

impl TokenIssuer {
    /// Create an issuer with a random secret.
    pub fn generate() -> Self {
        Self {
            signer: Signer::generate(),
        }
    }

    pub fn from_secret(secret: [u8; 32]) -> Self {
        Self {
            signer: Signer::from_bytes(secret),
        }
    }

    pub fn secret(&self) -> &[u8; 32] {
        self.signer.as_bytes()
    }

    /// Sign a token granting `permissions`.
    pub fn issue(&self, permissions: &[Permission]) -> Result<String, AuthError> {
        let payload = serde_json::to_vec(&TokenPayload {
            allow: permissions.to_vec(),
        })
        .map_err(|e| AuthError::InvalidPayload(e.to_string()))?;
        let signature = self.signer.sign(&payload);
        Ok(format!(
            "{}.{}",
            BASE64_URL.encode(&payload),
            BASE64_URL.encode(&signature)
        ))
    }

    /// Gate accepting the tokens of this issuer.
    pub fn gate(&self) -> TokenAuth {
        TokenAuth::new(self.signer.verifying_key())
    }
}

/// Verifies tokens signed by a [`TokenIssuer`].
#[derive(Debug, Clone)]
pub struct TokenAuth {
    key: VerifyingKey,
}

impl TokenAuth {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }
}

impl AuthGate for TokenAuth {
    fn permissions(&self, token: Option<&str>) -> Result<Vec<Permission>, AuthError> {
        let Some(token) = token else {
            return Ok(DEFAULT_PERMS.to_vec());
        };

        let (payload, signature) = token.split_once('.').ok_or(AuthError::MalformedToken)?;
        let payload = BASE64_URL
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let signature = BASE64_URL
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken)?;

        if !verify(&self.key, &payload, &signature) {
            return Err(AuthError::InvalidSignature);
        }

        let payload: TokenPayload = serde_json::from_slice(&payload)
            .map_err(|e| AuthError::InvalidPayload(e.to_string()))?;
        Ok(payload.allow)
    }
}
