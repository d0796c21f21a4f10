//! RemoteVault: a client for one vault on one vault server.

use serde_json::Value;

use ledgervault_comms::{connect, ClientConfig, ServerUrl, Transport};
use ledgervault_core::{
    decode, encode, validate_response, Address, CoreError, Key, RequestType, VaultRequest,
    VaultResponse, VAULT_RESPONSE,
};

use crate::error::{Result, VaultError};

/// Signs vault requests with the caller's key and checks that replies come
/// from the expected server.
///
/// An error response from the server is returned as [`VaultError::Remote`]
/// with the server's error name and message.
pub struct RemoteVault {
    transport: Box<dyn Transport>,
    contract: Address,
    key: Key,
    remote: Address,
}

impl std::fmt::Debug for RemoteVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteVault")
            .field("contract", &self.contract)
            .field("signer", &self.key.address())
            .field("remote", &self.remote)
            .finish()
    }
}

impl RemoteVault {
    /// Client for the vault controlled by `contract` on the server at `url`,
    /// which signs its replies as `remote`.
    pub fn new(url: &str, contract: &str, key: Key, remote: &str) -> Result<Self> {
        Self::connect(url, contract, key, remote, ClientConfig::default())
    }

    pub fn connect(
        url: &str,
        contract: &str,
        key: Key,
        remote: &str,
        config: ClientConfig,
    ) -> Result<Self> {
        let url: ServerUrl = url.parse().map_err(VaultError::construction)?;
        let transport = connect(&url, &config).map_err(VaultError::construction)?;
        Self::with_transport(transport, contract, key, remote)
    }

    /// Client over an already-built transport.
    pub fn with_transport(
        transport: Box<dyn Transport>,
        contract: &str,
        key: Key,
        remote: &str,
    ) -> Result<Self> {
        let contract =
            Address::parse_named(contract, "contract").map_err(VaultError::construction)?;
        let remote = Address::parse_named(remote, "remote").map_err(VaultError::construction)?;
        Ok(Self {
            transport,
            contract,
            key,
            remote,
        })
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vault Operations
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create(&self) -> Result<VaultResponse> {
        self.send(VaultRequest::new(RequestType::Create, self.contract)).await
    }

    /// Overwrite `file`, or the root object when `file` is `None`.
    pub async fn write(&self, data: Value, file: Option<&str>) -> Result<VaultResponse> {
        let request = self.file_request(RequestType::Write, file).with_data(data);
        self.send(request).await
    }

    pub async fn append(&self, data: Value, file: Option<&str>) -> Result<VaultResponse> {
        let request = self.file_request(RequestType::Append, file).with_data(data);
        self.send(request).await
    }

    /// Read `file`, the root object, or a directory listing. Returns the
    /// response data, `null` if the server sent none.
    pub async fn read(&self, file: Option<&str>) -> Result<Value> {
        let response = self.send(self.file_request(RequestType::Read, file)).await?;
        Ok(response.data.unwrap_or(Value::Null))
    }

    pub async fn delete(&self) -> Result<VaultResponse> {
        self.send(VaultRequest::new(RequestType::Delete, self.contract)).await
    }

    fn file_request(&self, request_type: RequestType, file: Option<&str>) -> VaultRequest {
        let request = VaultRequest::new(request_type, self.contract);
        match file {
            Some(file) => request.with_file(file),
            None => request,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Exchange
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign and send `request`, then authenticate and unpack the reply.
    pub async fn send(&self, request: VaultRequest) -> Result<VaultResponse> {
        let envelope = encode(&request, &self.key)?;
        tracing::debug!(
            contract = %self.contract,
            request_type = %request.request_type,
            "sending vault request"
        );
        let reply = self.transport.send(envelope).await?;

        let decoded = decode(&reply)?;
        if decoded.signatory != self.remote {
            return Err(CoreError::Transaction {
                message: "Validation failure. Wrong signatory".into(),
                details: Some(Value::String(format!(
                    "Expected: {}, Received: {}",
                    self.remote, decoded.signatory
                ))),
            }
            .into());
        }
        validate_response(&decoded.payload, VAULT_RESPONSE)?;

        let response: VaultResponse = serde_json::from_value(decoded.payload)
            .map_err(|e| CoreError::malformed(e.to_string()))?;
        if !response.is_success() {
            if let Some(error) = response.error {
                return Err(VaultError::Remote {
                    kind: error.kind(),
                    message: error.message,
                    details: error.details,
                });
            }
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::VaultKeeper;
    use async_trait::async_trait;
    use ledgervault_comms::{CommsError, LoopbackTransport};
    use ledgervault_core::{encode_value, Classified, ErrorKind};
    use ledgervault_perms::{MemoryLedger, Permissions};
    use ledgervault_store::MemoryDataServer;
    use serde_json::json;
    use std::sync::Arc;

    /// Replies with a fixed payload signed by a fixed key.
    struct Canned {
        key: Key,
        payload: Value,
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, _: String) -> ledgervault_comms::Result<String> {
            Ok(encode_value(&self.payload, &self.key).unwrap())
        }
    }

    fn canned(key: &Key, payload: Value) -> Box<dyn Transport> {
        Box::new(Canned {
            key: key.clone(),
            payload,
        })
    }

    const CONTRACT: &str = "0x0000000000000000000000000000000000000abc";

    #[test]
    fn test_construction_errors() {
        let key = Key::generate();
        let remote = Key::generate().address().to_hex();

        let err = RemoteVault::new("ftp://localhost:21", CONTRACT, key.clone(), &remote).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Vault);
        assert_eq!(err.to_string(), "Failed to construct vault: Unsupported url scheme: ftp");

        let err = RemoteVault::new("localhost", CONTRACT, key.clone(), &remote).unwrap_err();
        assert!(err.to_string().starts_with("Failed to construct vault: "));

        let err = RemoteVault::new("file://localhost:8124", "0x12", key, &remote).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to construct vault: contract: invalid type. Expected address"
        );
    }

    #[test]
    fn test_construction_does_not_connect() {
        let vault = RemoteVault::new(
            "file://localhost:1",
            CONTRACT,
            Key::generate(),
            &Key::generate().address().to_hex(),
        )
        .unwrap();
        assert_eq!(vault.contract().to_hex(), CONTRACT);
    }

    #[tokio::test]
    async fn test_wrong_signatory() {
        let server = Key::generate();
        let expected = Key::generate().address();
        let transport = canned(&server, json!({"txnType": "VaultResponse", "responseType": "success"}));
        let vault = RemoteVault::with_transport(transport, CONTRACT, Key::generate(), &expected.to_hex()).unwrap();

        let err = vault.create().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert_eq!(err.to_string(), "Validation failure. Wrong signatory");
        assert_eq!(
            err.details(),
            Some(json!(format!("Expected: {}, Received: {}", expected, server.address())))
        );
    }

    #[tokio::test]
    async fn test_invalid_response() {
        let server = Key::generate();
        let transport = canned(&server, json!({"txnType": "GeneralResponse", "responseType": "success"}));
        let vault = RemoteVault::with_transport(transport, CONTRACT, Key::generate(), &server.address().to_hex()).unwrap();

        let err = vault.create().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transaction);
        assert!(err.to_string().starts_with("VaultResponse is invalid"));
    }

    #[tokio::test]
    async fn test_remote_error_is_raised() {
        let server = Key::generate();
        let transport = canned(
            &server,
            json!({
                "txnType": "VaultResponse",
                "responseType": "error",
                "error": {"name": "PermissionError", "message": "permission denied"}
            }),
        );
        let vault = RemoteVault::with_transport(transport, CONTRACT, Key::generate(), &server.address().to_hex()).unwrap();

        let err = vault.read(None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Permission);
        assert_eq!(err.to_string(), "permission denied");
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        struct Down;

        #[async_trait]
        impl Transport for Down {
            async fn send(&self, _: String) -> ledgervault_comms::Result<String> {
                Err(CommsError::Timeout)
            }
        }

        let vault = RemoteVault::with_transport(
            Box::new(Down),
            CONTRACT,
            Key::generate(),
            &Key::generate().address().to_hex(),
        )
        .unwrap();
        let err = vault.delete().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Communication);
        assert_eq!(err.to_string(), "Connection timeout");
    }

    #[tokio::test]
    async fn test_against_keeper() {
        let ledger = MemoryLedger::new();
        let owner = Key::generate();
        let contract = ledger.deploy(&owner.address(), "6080").await.unwrap();
        ledger
            .set_permissions(&owner.address(), &contract, &owner.address(), &Address::ZERO, Permissions::ALL)
            .unwrap();

        let keeper = Arc::new(VaultKeeper::new(MemoryDataServer::new(), ledger, Key::generate()));
        let remote = keeper.address().to_hex();
        let transport = Box::new(LoopbackTransport::new(keeper));
        let vault = RemoteVault::with_transport(transport, &contract.to_hex(), owner, &remote).unwrap();

        vault.create().await.unwrap();
        vault.write(json!("Hello World!"), None).await.unwrap();
        vault.append(json!(" Again"), None).await.unwrap();
        assert_eq!(vault.read(None).await.unwrap(), json!("Hello World! Again"));

        let err = vault.create().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Vault);
        assert_eq!(err.to_string(), "vault already exists");
    }
}
