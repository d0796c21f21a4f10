//! VaultKeeper: the server side of the vault protocol.
//!
//! The keeper authenticates a signed request, asks the ledger contract
//! whether the signatory may perform it, and only then touches the data
//! server. Every outcome, including garbage input and internal panics, is
//! answered with a `VaultResponse` signed by the keeper's key.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;

use ledgervault_comms::RequestHandler;
use ledgervault_core::{
    decode, encode, Address, Classified, CoreError, Key, RequestType, VaultRequest,
    VaultResponse, VAULT_REQUEST,
};
use ledgervault_perms::{Ledger, LedgerContractExt, PermsError, VaultFilename};
use ledgervault_store::DataServer;

use crate::error::{Result, VaultError};

/// Configuration for a [`VaultKeeper`].
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// Log each rejected request through `tracing`.
    pub log_rejections: bool,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            log_rejections: true,
        }
    }
}

/// Authorizes vault requests against a ledger and executes them on a data server.
///
/// # Design Notes
///
/// - **Stateless per call**: nothing is cached between requests. Ownership,
///   expiry and permissions are read from the ledger every time.
/// - **No per-object locking**: two appends to one object may interleave at
///   the data server.
/// - **Storage keys are canonical**: object names are stored with their
///   address part lowercased, so `0xAB..` and `0xab..` name one object.
pub struct VaultKeeper<D, L> {
    data_server: D,
    ledger: L,
    key: Key,
    config: KeeperConfig,
}

impl<D: DataServer, L: Ledger> VaultKeeper<D, L> {
    pub fn new(data_server: D, ledger: L, key: Key) -> Self {
        Self::with_config(data_server, ledger, key, KeeperConfig::default())
    }

    pub fn with_config(data_server: D, ledger: L, key: Key, config: KeeperConfig) -> Self {
        Self {
            data_server,
            ledger,
            key,
            config,
        }
    }

    /// The address responses are signed by. Clients expect replies from it.
    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn data_server(&self) -> &D {
        &self.data_server
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Envelope Boundary
    // ─────────────────────────────────────────────────────────────────────────

    /// Decode, authorize and execute a signed request, returning the signed
    /// response envelope.
    ///
    /// Never fails. Malformed envelopes, rejected requests and panics inside
    /// collaborators all come back as signed error responses.
    pub async fn handle_signed_request(&self, envelope: &str) -> String {
        let response = match AssertUnwindSafe(self.route(envelope)).catch_unwind().await {
            Ok(response) => response,
            Err(_) => {
                let error = internal_failure("internal failure");
                self.log_rejection(&error, None, None, "");
                VaultResponse::failure(&error)
            }
        };
        self.sign(&response)
    }

    async fn route(&self, envelope: &str) -> VaultResponse {
        let decoded = match decode(envelope) {
            Ok(decoded) => decoded,
            Err(e) => {
                let error = VaultError::from(e);
                self.log_rejection(&error, None, None, "");
                return VaultResponse::failure(&error);
            }
        };
        let request = VaultRequest::from_payload(&decoded.payload);
        let signatory = decoded.signatory;

        if request.txn_type != VAULT_REQUEST {
            let error = VaultError::Request(format!(
                "Invalid transaction type ('{}')",
                request.txn_type
            ));
            self.log_rejection(&error, None, Some(&signatory), &request.request_type);
            return VaultResponse::failure(&error);
        }

        match request.operation() {
            Some(operation) => self.respond(operation, &request, &signatory).await,
            None => {
                let error = VaultError::InvalidTransaction(format!(
                    "Invalid request type ('{}')",
                    request.request_type
                ));
                self.log_rejection(&error, None, Some(&signatory), &request.request_type);
                VaultResponse::failure(&error)
            }
        }
    }

    /// Sign `response`. If that fails, sign an error response in its place;
    /// if even that fails, the reply goes out unsigned and the client will
    /// reject it.
    fn sign(&self, response: &VaultResponse) -> String {
        let error = match encode(response, &self.key) {
            Ok(signed) => return signed,
            Err(e) => internal_failure(&e.to_string()),
        };
        tracing::warn!(error = %error, "failed to sign vault response");
        let failure = VaultResponse::failure(&error);
        encode(&failure, &self.key).unwrap_or_else(|_| {
            let txn = serde_json::to_string(&failure).unwrap_or_else(|_| "null".to_string());
            format!("{{\"txn\":{}}}", txn)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Vault Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a vault. Only the contract owner may, and only before expiry.
    pub async fn create_vault(&self, request: &VaultRequest, signatory: &Address) -> VaultResponse {
        self.respond(RequestType::Create, request, signatory).await
    }

    /// Overwrite an object. Needs write permission on it and `data`.
    pub async fn write_vault(&self, request: &VaultRequest, signatory: &Address) -> VaultResponse {
        self.respond(RequestType::Write, request, signatory).await
    }

    /// Extend an object. Needs append permission on it and `data`.
    pub async fn append_vault(&self, request: &VaultRequest, signatory: &Address) -> VaultResponse {
        self.respond(RequestType::Append, request, signatory).await
    }

    /// Read an object, or list a directory named by its bare address.
    pub async fn read_vault(&self, request: &VaultRequest, signatory: &Address) -> VaultResponse {
        self.respond(RequestType::Read, request, signatory).await
    }

    /// Delete a vault. Only the owner may, and only once the contract has expired.
    pub async fn delete_vault(&self, request: &VaultRequest, signatory: &Address) -> VaultResponse {
        self.respond(RequestType::Delete, request, signatory).await
    }

    async fn respond(
        &self,
        expected: RequestType,
        request: &VaultRequest,
        signatory: &Address,
    ) -> VaultResponse {
        match self.dispatch(expected, request, signatory).await {
            Ok(data) => {
                tracing::debug!(
                    contract = %request.contract,
                    signatory = %signatory,
                    request_type = %expected,
                    "vault request accepted"
                );
                VaultResponse::success(data)
            }
            Err(error) => {
                let contract = Address::parse(&request.contract);
                self.log_rejection(&error, contract.as_ref(), Some(signatory), expected.as_str());
                VaultResponse::failure(&error)
            }
        }
    }

    async fn dispatch(
        &self,
        expected: RequestType,
        request: &VaultRequest,
        signatory: &Address,
    ) -> Result<Option<Value>> {
        if request.request_type != expected.as_str() {
            return Err(VaultError::InvalidTransaction(format!(
                "attempted to {} a vault with in an invalid request type '{}'",
                expected, request.request_type
            )));
        }

        let contract_address = Address::parse(&request.contract).ok_or_else(|| {
            CoreError::MalformedTransaction {
                message: "Invalid request contract field".into(),
                details: Some(Value::String(request.contract.clone())),
            }
        })?;
        let contract = self.ledger.contract(&contract_address);

        let file = match &request.file {
            Some(name) => VaultFilename::parse(name),
            None => VaultFilename::root(),
        };
        let (permission_address, storage_name) = match (file.permission_address(), file.canonical_name()) {
            (Some(address), Some(name)) => (address, name),
            _ => {
                return Err(CoreError::MalformedTransaction {
                    message: "Invalid request file field".into(),
                    details: Some(Value::String(file.full_filename().to_string())),
                }
                .into())
            }
        };
        let names_directory = !file.has_directory();
        let options = request.options.as_ref();

        match expected {
            RequestType::Create => {
                contract.assert_owner(signatory).await?;
                contract.assert_not_expired().await?;
                self.data_server.create(&contract_address, options).await?;
                Ok(None)
            }
            RequestType::Write => {
                let data = required_data(request)?;
                let permissions = contract.assert_can_write(signatory, &permission_address).await?;
                contract.assert_not_expired().await?;
                if permissions.is_directory() && names_directory {
                    return Err(PermsError::Permission("Cannot write to a directory".into()).into());
                }
                self.data_server
                    .write(&contract_address, &storage_name, data, options)
                    .await?;
                Ok(None)
            }
            RequestType::Append => {
                let data = required_data(request)?;
                let permissions = contract.assert_can_append(signatory, &permission_address).await?;
                contract.assert_not_expired().await?;
                if permissions.is_directory() && names_directory {
                    return Err(
                        PermsError::Permission("Cannot append data to a directory".into()).into(),
                    );
                }
                self.data_server
                    .append(&contract_address, &storage_name, data, options)
                    .await?;
                Ok(None)
            }
            RequestType::Read => {
                let permissions = contract.assert_can_read(signatory, &permission_address).await?;
                contract.assert_not_expired().await?;
                let data = if permissions.is_directory() && names_directory {
                    let listing = self
                        .data_server
                        .read_dir(&contract_address, &permission_address, options)
                        .await?;
                    Value::String(listing)
                } else {
                    self.data_server
                        .read(&contract_address, &storage_name, options)
                        .await?
                };
                Ok(Some(data))
            }
            RequestType::Delete => {
                contract.assert_owner(signatory).await?;
                contract.assert_has_expired().await?;
                self.data_server.delete(&contract_address, options).await?;
                Ok(None)
            }
        }
    }

    fn log_rejection(
        &self,
        error: &VaultError,
        contract: Option<&Address>,
        signatory: Option<&Address>,
        request_type: &str,
    ) {
        if !self.config.log_rejections {
            return;
        }
        let contract = contract.map(Address::to_hex).unwrap_or_default();
        let signatory = signatory.map(Address::to_hex).unwrap_or_default();
        if error.is_failure() {
            tracing::warn!(
                %contract,
                %signatory,
                request_type,
                error = %error,
                kind = %error.kind(),
                "vault request failed"
            );
        } else {
            tracing::debug!(
                %contract,
                %signatory,
                request_type,
                error = %error,
                kind = %error.kind(),
                "vault request rejected"
            );
        }
    }
}

fn required_data(request: &VaultRequest) -> Result<&Value> {
    request
        .data
        .as_ref()
        .ok_or_else(|| CoreError::malformed("Missing request data field").into())
}

fn internal_failure(message: &str) -> VaultError {
    VaultError::Internal(format!("VaultKeeper handleSignedRequest: {}", message))
}

#[async_trait]
impl<D, L> RequestHandler for VaultKeeper<D, L>
where
    D: DataServer + 'static,
    L: Ledger + 'static,
{
    async fn handle(&self, envelope: String) -> String {
        self.handle_signed_request(&envelope).await
    }
}
