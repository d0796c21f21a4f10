//! Protocol messages carried inside signed envelopes.
//!
//! Requests are read leniently: a vault server must answer every request,
//! including ones whose fields have the wrong JSON type, so
//! [`VaultRequest::from_payload`] never fails. Interpretation of the fields
//! happens in the keeper.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{Classified, ErrorKind};
use crate::types::Address;

/// `txnType` of a request to a vault server.
pub const VAULT_REQUEST: &str = "VaultRequest";
/// `txnType` of a vault server's reply.
pub const VAULT_RESPONSE: &str = "VaultResponse";
/// Default `txnType` expected by [`crate::envelope::validate_response`].
pub const GENERAL_RESPONSE: &str = "GeneralResponse";

/// The five vault operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Create,
    Write,
    Append,
    Read,
    Delete,
}

impl RequestType {
    pub const ALL: [RequestType; 5] = [
        RequestType::Create,
        RequestType::Write,
        RequestType::Append,
        RequestType::Read,
        RequestType::Delete,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RequestType::Create => "create",
            RequestType::Write => "write",
            RequestType::Append => "append",
            RequestType::Read => "read",
            RequestType::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to a vault server.
///
/// `request_type` and `contract` stay as strings: the keeper must be able to
/// report exactly what it was sent when it rejects a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultRequest {
    pub txn_type: String,
    pub request_type: String,
    pub contract: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl VaultRequest {
    /// Build a well-formed request.
    pub fn new(request_type: RequestType, contract: Address) -> Self {
        Self {
            txn_type: VAULT_REQUEST.to_string(),
            request_type: request_type.as_str().to_string(),
            contract: contract.to_hex(),
            file: None,
            data: None,
            options: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Read a request out of a decoded payload without failing.
    ///
    /// Missing string fields become empty. Non-string values keep their JSON
    /// text so they can be echoed back in error messages.
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            txn_type: lenient_str(payload.get("txnType")),
            request_type: lenient_str(payload.get("requestType")),
            contract: lenient_str(payload.get("contract")),
            file: payload.get("file").map(|v| lenient_str(Some(v))),
            data: payload.get("data").cloned(),
            options: payload.get("options").cloned(),
        }
    }

    /// The parsed operation, if `request_type` names one.
    pub fn operation(&self) -> Option<RequestType> {
        RequestType::parse(&self.request_type)
    }
}

fn lenient_str(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Outcome carried by a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Success,
    Error,
}

/// Wire form of an error: `{name, message, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default)]
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorObject {
    pub fn from_error<E: Classified + ?Sized>(error: &E) -> Self {
        Self {
            name: error.kind().name().to_string(),
            message: error.to_string(),
            details: error.details(),
        }
    }

    /// The kind named by this object. Unknown names map to the root kind.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from_name(&self.name)
    }
}

/// A server response. `txn_type` is `VaultResponse` for vault servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultResponse {
    pub txn_type: String,
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl VaultResponse {
    /// A successful `VaultResponse`.
    pub fn success(data: Option<Value>) -> Self {
        create_success_response(VAULT_RESPONSE, data)
    }

    /// An error `VaultResponse` describing `error`.
    pub fn failure<E: Classified + ?Sized>(error: &E) -> Self {
        create_error_response(VAULT_RESPONSE, error)
    }

    pub fn is_success(&self) -> bool {
        self.response_type == ResponseType::Success
    }
}

/// Build a success response of the given transaction type.
pub fn create_success_response(txn_type: &str, data: Option<Value>) -> VaultResponse {
    VaultResponse {
        txn_type: txn_type.to_string(),
        response_type: ResponseType::Success,
        data,
        error: None,
    }
}

/// Build an error response of the given transaction type.
pub fn create_error_response<E: Classified + ?Sized>(txn_type: &str, error: &E) -> VaultResponse {
    VaultResponse {
        txn_type: txn_type.to_string(),
        response_type: ResponseType::Error,
        data: None,
        error: Some(ErrorObject::from_error(error)),
    }
}
