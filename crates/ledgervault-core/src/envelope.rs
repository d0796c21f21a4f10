//! The signed envelope codec.
//!
//! Wire form: `{"signature": "<130 hex>", "txn": <payload>}`. The signature
//! is over `keccak256(canonical_json(payload))`, so the signatory can be
//! recovered from the envelope alone.
//!
//! Recovering a signatory does not authenticate it. Callers compare the
//! recovered address with the peer they expected to hear from.

use serde::Serialize;
use serde_json::{json, Value};

use crate::canonical::canonical_json;
use crate::crypto::{hash, recover, Key};
use crate::error::{CoreError, Result};
use crate::types::{Address, RecoverableSignature};

/// A decoded envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub payload: Value,
    pub signatory: Address,
}

/// Serialize, sign and wrap `payload`.
pub fn encode<T: Serialize + ?Sized>(payload: &T, key: &Key) -> Result<String> {
    let value = serde_json::to_value(payload)?;
    encode_value(&value, key)
}

/// [`encode`] for an already-built JSON value.
pub fn encode_value(payload: &Value, key: &Key) -> Result<String> {
    let digest = hash(&canonical_json(payload));
    let signature = key.sign(&digest)?;
    let envelope = json!({
        "txn": payload,
        "signature": signature.to_hex(),
    });
    Ok(canonical_json(&envelope))
}

/// Unwrap an envelope and recover its signatory.
///
/// Every failure, whether JSON syntax, a missing field or a bad signature,
/// surfaces as a `MalformedTransactionError` carrying the underlying message.
pub fn decode(envelope: &str) -> Result<Decoded> {
    let parsed: Value =
        serde_json::from_str(envelope).map_err(|e| CoreError::malformed(e.to_string()))?;

    let payload = match parsed.get("txn") {
        None | Some(Value::Null) => return Err(CoreError::malformed("txn is missing or empty")),
        Some(txn) => txn,
    };
    let signature = match parsed.get("signature") {
        None | Some(Value::Null) => {
            return Err(CoreError::malformed("signature is missing or empty"))
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            return Err(CoreError::malformed("signature is missing or empty"))
        }
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(CoreError::malformed(
                "signature: invalid type. Expected hex string",
            ))
        }
    };

    let signature = RecoverableSignature::from_hex(signature)
        .map_err(|e| CoreError::malformed(e.to_string()))?;
    let digest = hash(&canonical_json(payload));
    let signatory = recover(&digest, &signature).map_err(|e| CoreError::malformed(e.to_string()))?;

    Ok(Decoded {
        payload: payload.clone(),
        signatory,
    })
}

/// Check that `payload` is a well-formed response of type `expected_txn_type`.
///
/// Success responses need nothing more. Error responses need an `error`
/// object with a non-empty `message`.
pub fn validate_response(payload: &Value, expected_txn_type: &str) -> Result<()> {
    check_response_shape(payload, expected_txn_type).map_err(|reason| {
        CoreError::transaction(format!("{} is invalid: {}", expected_txn_type, reason))
    })
}

fn check_response_shape(payload: &Value, expected_txn_type: &str) -> std::result::Result<(), String> {
    let txn = payload.as_object().ok_or_else(|| {
        format!(
            "{} constructor txn: invalid type. Expected Object",
            expected_txn_type
        )
    })?;

    let txn_type = required_str(txn.get("txnType"), "txnType")?;
    if txn_type != expected_txn_type {
        return Err(format!("invalid transaction type ('{}')", txn_type));
    }

    let response_type = required_str(txn.get("responseType"), "responseType")?;
    match response_type {
        "success" => Ok(()),
        "error" => {
            let error = txn
                .get("error")
                .and_then(Value::as_object)
                .ok_or_else(|| "error: invalid type. Expected Object".to_string())?;
            match error.get("message") {
                None | Some(Value::Null) => Err("error message is missing or empty".into()),
                Some(Value::String(s)) if s.trim().is_empty() => {
                    Err("error message is missing or empty".into())
                }
                Some(_) => Ok(()),
            }
        }
        other => Err(format!("invalid response type ({})", other)),
    }
}

fn required_str<'a>(value: Option<&'a Value>, name: &str) -> std::result::Result<&'a str, String> {
    match value {
        None | Some(Value::Null) => Err(format!("{} is missing or empty", name)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(format!("{} is missing or empty", name)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(format!("{}: invalid type. Expected string", name)),
    }
}
