//! DataServer trait: the abstract interface for vault contents.
//!
//! A data server stores what the keeper has already authorized. It performs
//! no access control of its own.

use std::sync::Arc;

use async_trait::async_trait;
use ledgervault_core::Address;
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Storage for vault objects, keyed by contract address and full file name.
///
/// `file` is the full object name (`0x..01` or `0x..02/notes.txt`).
/// `options` is passed through from the request untouched.
///
/// # Design Notes
///
/// - **No locking across calls**: an `append` is a read followed by a write.
///   Concurrent appends to one object are serialized only as far as a single
///   call is.
/// - **Directories are implicit**: a directory exists while any object in it does.
#[async_trait]
pub trait DataServer: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Vault Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an empty vault controlled by `contract`.
    async fn create(&self, contract: &Address, options: Option<&Value>) -> Result<()>;

    /// Delete the vault and everything in it.
    async fn delete(&self, contract: &Address, options: Option<&Value>) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // File Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create or overwrite `file`.
    async fn write(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        options: Option<&Value>,
    ) -> Result<()>;

    /// Create `file` or extend it. Strings concatenate, arrays grow by one
    /// element.
    async fn append(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        options: Option<&Value>,
    ) -> Result<()>;

    async fn read(&self, contract: &Address, file: &str, options: Option<&Value>) -> Result<Value>;

    /// Names of the objects in `dir`, sorted and joined with `\n`.
    async fn read_dir(
        &self,
        contract: &Address,
        dir: &Address,
        options: Option<&Value>,
    ) -> Result<String>;
}

#[async_trait]
impl<D: DataServer + ?Sized> DataServer for Arc<D> {
    async fn create(&self, contract: &Address, options: Option<&Value>) -> Result<()> {
        (**self).create(contract, options).await
    }

    async fn delete(&self, contract: &Address, options: Option<&Value>) -> Result<()> {
        (**self).delete(contract, options).await
    }

    async fn write(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        options: Option<&Value>,
    ) -> Result<()> {
        (**self).write(contract, file, data, options).await
    }

    async fn append(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        options: Option<&Value>,
    ) -> Result<()> {
        (**self).append(contract, file, data, options).await
    }

    async fn read(&self, contract: &Address, file: &str, options: Option<&Value>) -> Result<Value> {
        (**self).read(contract, file, options).await
    }

    async fn read_dir(
        &self,
        contract: &Address,
        dir: &Address,
        options: Option<&Value>,
    ) -> Result<String> {
        (**self).read_dir(contract, dir, options).await
    }
}

/// The value `file` holds after appending `data` to `existing`.
pub(crate) fn appended(existing: Option<Value>, data: &Value) -> Result<Value> {
    match (existing, data) {
        (None, data) => Ok(data.clone()),
        (Some(Value::String(mut s)), Value::String(more)) => {
            s.push_str(more);
            Ok(Value::String(s))
        }
        (Some(Value::Array(mut items)), data) => {
            items.push(data.clone());
            Ok(Value::Array(items))
        }
        (Some(existing), data) => Err(StoreError::NotAppendable {
            existing: type_name(&existing),
            data: type_name(data),
        }),
    }
}

/// Join the file components of the `names` that sit directly in `dir`.
/// Names are expected in canonical (lowercase address) form.
pub(crate) fn list_directory<'a>(names: impl IntoIterator<Item = &'a str>, dir: &Address) -> String {
    let prefix = format!("{}/", dir.to_hex());
    let mut files: Vec<&str> = names
        .into_iter()
        .filter_map(|name| name.strip_prefix(prefix.as_str()))
        .collect();
    files.sort_unstable();
    files.join("\n")
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_appended() {
        assert_eq!(appended(None, &json!("a")).unwrap(), json!("a"));
        assert_eq!(appended(Some(json!("a")), &json!("b")).unwrap(), json!("ab"));
        assert_eq!(appended(Some(json!([1])), &json!({"x": 2})).unwrap(), json!([1, {"x": 2}]));

        let err = appended(Some(json!("a")), &json!(5)).unwrap_err();
        assert_eq!(err.to_string(), "cannot append number data to a string file");
        assert!(appended(Some(json!({"a": 1})), &json!("b")).is_err());
    }

    #[test]
    fn test_list_directory() {
        let dir = Address::from_bytes([2; 20]);
        let other = Address::from_bytes([3; 20]);
        let names = [
            format!("{}/proof_of_address.pdf", dir),
            format!("{}/passport.png", dir),
            format!("{}/elsewhere.txt", other),
            dir.to_hex(),
        ];
        let listing = list_directory(names.iter().map(String::as_str), &dir);
        assert_eq!(listing, "passport.png\nproof_of_address.pdf");
        assert_eq!(list_directory(names.iter().map(String::as_str), &Address::ZERO), "");
    }
}
