//! JSON-RPC 2.0 envelope and DA message shapes.
//!
//! Byte arrays travel as standard base64 strings. Domain errors carry an
//! [`ErrorDetails`] payload in the error's `data` field so the client can
//! rebuild the typed [`DaError`].

use da::{DaError, ErrorDetails, SubmitOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
/// Uncategorized backend failure.
pub const SERVER_ERROR: i64 = -32000;
/// The bearer token could not be verified.
pub const UNAUTHORIZED: i64 = -32001;
/// The caller lacks the permission the method requires.
pub const PERMISSION_DENIED: i64 = -32003;

/// Methods of the DA service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    MaxBlobSize,
    Get,
    GetIds,
    Commit,
    Submit,
    Validate,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::MaxBlobSize,
        Method::Get,
        Method::GetIds,
        Method::Commit,
        Method::Submit,
        Method::Validate,
    ];

    /// Name used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Self::MaxBlobSize => "da.MaxBlobSize",
            Self::Get => "da.Get",
            Self::GetIds => "da.GetIDs",
            Self::Commit => "da.Commit",
            Self::Submit => "da.Submit",
            Self::Validate => "da.Validate",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

/// JSON-RPC request as sent by the client.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

/// JSON-RPC request as received by the server, params still untyped.
#[derive(Debug, Deserialize)]
pub struct RawRequest {
    pub jsonrpc: String,
    /// `None` for notifications. An explicit `null` id is kept as `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// JSON-RPC response structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse<T> {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl<T> JsonRpcResponse<T> {
    pub fn success(id: Value, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Map a backend error onto the wire.
    ///
    /// Domain kinds get their own code plus a structured detail; anything else
    /// becomes an opaque [`SERVER_ERROR`].
    pub fn from_da_error(err: &DaError) -> Self {
        match err.details() {
            Some(details) => Self {
                code: details.code.as_i64(),
                message: err.to_string(),
                data: serde_json::to_value(&details).ok(),
            },
            None => Self::new(SERVER_ERROR, err.to_string()),
        }
    }

    /// Rebuild the typed error from the detail payload.
    ///
    /// Without a parseable detail the wire error is returned unchanged as
    /// [`DaError::Rpc`].
    pub fn into_da_error(self) -> DaError {
        let details = self
            .data
            .and_then(|data| serde_json::from_value::<ErrorDetails>(data).ok());
        match details {
            Some(details) => DaError::from(details.code),
            None => DaError::Rpc {
                code: self.code,
                message: self.message,
            },
        }
    }
}

// Message shapes

#[derive(Debug, Serialize, Deserialize)]
pub struct GetRequest {
    #[serde(with = "base64_list")]
    pub ids: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(with = "base64_list")]
    pub blobs: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetIdsRequest {
    pub height: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetIdsResponse {
    #[serde(with = "base64_list")]
    pub ids: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitRequest {
    #[serde(with = "base64_list")]
    pub blobs: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommitResponse {
    #[serde(with = "base64_list")]
    pub commitments: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(with = "base64_list")]
    pub blobs: Vec<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<WireSubmitOptions>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireSubmitOptions {
    #[serde(default)]
    pub gas_price: f64,
    #[serde(default, with = "base64_bytes")]
    pub namespace: Vec<u8>,
}

impl From<&SubmitOptions> for WireSubmitOptions {
    fn from(options: &SubmitOptions) -> Self {
        Self {
            gas_price: options.gas_price,
            namespace: options.namespace.clone(),
        }
    }
}

impl From<WireSubmitOptions> for SubmitOptions {
    fn from(options: WireSubmitOptions) -> Self {
        Self {
            gas_price: options.gas_price,
            namespace: options.namespace,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    #[serde(with = "base64_list")]
    pub ids: Vec<Vec<u8>>,
    #[serde(with = "base64_list")]
    pub proofs: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    #[serde(with = "base64_list")]
    pub ids: Vec<Vec<u8>>,
    #[serde(with = "base64_list")]
    pub proofs: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub results: Vec<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaxBlobSizeResponse {
    pub max_blob_size: u64,
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BASE64.decode(s).map_err(serde::de::Error::custom)
    }
}

mod base64_list {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&BASE64.encode(item))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .iter()
            .map(|s| BASE64.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use da::ErrorCode;

    #[test]
    fn test_method_names() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.name()), Some(method));
        }
        assert_eq!(Method::from_name("da.GetIDs"), Some(Method::GetIds));
        assert_eq!(Method::from_name("da.Delete"), None);
    }

    #[test]
    fn test_byte_arrays_as_base64() {
        let request = GetRequest {
            ids: vec![b"abc".to_vec(), vec![]],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "ids": ["YWJj", ""] }));

        let parsed: GetRequest = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.ids, request.ids);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let json = serde_json::json!({ "blobs": ["not base64!"] });
        assert!(serde_json::from_value::<CommitRequest>(json).is_err());
    }

    #[test]
    fn test_submit_options_optional() {
        let json = serde_json::json!({ "blobs": [] });
        let parsed: SubmitRequest = serde_json::from_value(json).unwrap();
        assert!(parsed.options.is_none());

        let json = serde_json::json!({
            "blobs": ["AA=="],
            "options": { "gas_price": 1.5, "namespace": "CQgH" }
        });
        let parsed: SubmitRequest = serde_json::from_value(json).unwrap();
        let options: SubmitOptions = parsed.options.unwrap().into();
        assert_eq!(options.gas_price, 1.5);
        assert_eq!(options.namespace, vec![9, 8, 7]);
    }

    #[test]
    fn test_domain_error_carries_detail() {
        let error = JsonRpcError::from_da_error(&DaError::TxTooLarge);
        assert_eq!(error.code, ErrorCode::TxTooLarge.as_i64());
        assert_eq!(error.data.as_ref().unwrap()["code"], "tx_too_large");
        assert_eq!(error.into_da_error(), DaError::TxTooLarge);
    }

    #[test]
    fn test_all_domain_errors_roundtrip() {
        for code in ErrorCode::ALL {
            let err = DaError::from(code);
            let wire = serde_json::to_string(&JsonRpcError::from_da_error(&err)).unwrap();
            let parsed: JsonRpcError = serde_json::from_str(&wire).unwrap();
            assert_eq!(parsed.into_da_error(), err);
        }
    }

    #[test]
    fn test_opaque_error_passes_through() {
        let error = JsonRpcError::from_da_error(&DaError::Backend("disk full".into()));
        assert_eq!(error.code, SERVER_ERROR);
        assert!(error.data.is_none());
        assert_eq!(
            error.into_da_error(),
            DaError::Rpc {
                code: SERVER_ERROR,
                message: "backend error: disk full".into()
            }
        );
    }

    #[test]
    fn test_unparseable_detail_passes_through() {
        let error = JsonRpcError {
            code: 32099,
            message: "out of gas".into(),
            data: Some(serde_json::json!({ "code": "out_of_gas", "message": "out of gas" })),
        };
        assert_eq!(
            error.into_da_error(),
            DaError::Rpc {
                code: 32099,
                message: "out of gas".into()
            }
        );
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let response = JsonRpcResponse::success(Value::from(1), ValidateResponse {
            results: vec![true],
        });
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["result"]["results"], serde_json::json!([true]));
    }
}
