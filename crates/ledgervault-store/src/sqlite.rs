//! SQLite implementation of the DataServer trait.
//!
//! The persistent backend. Uses rusqlite with bundled SQLite; every call runs
//! on tokio's blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ledgervault_core::Address;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{appended, list_directory, DataServer};

/// SQLite-based data server. Thread-safe via internal Mutex.
pub struct SqliteDataServer {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDataServer {
    /// Open a SQLite database at the given path, creating and migrating it
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("spawn_blocking failed: {}", e)),
            ))
        })?
    }
}

fn ensure_vault(conn: &Connection, contract: &Address) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM vaults WHERE contract = ?1",
            params![contract.to_hex()],
            |row| row.get(0),
        )
        .optional()?;
    match exists {
        Some(_) => Ok(()),
        None => Err(StoreError::VaultNotFound(*contract)),
    }
}

fn load_file(conn: &Connection, contract: &Address, file: &str) -> Result<Option<Value>> {
    let text: Option<String> = conn
        .query_row(
            "SELECT data FROM files WHERE contract = ?1 AND name = ?2",
            params![contract.to_hex(), file],
            |row| row.get(0),
        )
        .optional()?;
    text.map(|t| serde_json::from_str(&t).map_err(StoreError::from))
        .transpose()
}

fn store_file(conn: &Connection, contract: &Address, file: &str, data: &Value) -> Result<()> {
    conn.execute(
        "INSERT INTO files (contract, name, data, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(contract, name) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![contract.to_hex(), file, serde_json::to_string(data)?, now_millis()],
    )?;
    Ok(())
}

#[async_trait]
impl DataServer for SqliteDataServer {
    async fn create(&self, contract: &Address, _options: Option<&Value>) -> Result<()> {
        let contract = *contract;
        self.run(move |conn| {
            let tx = conn.transaction()?;
            if ensure_vault(&tx, &contract).is_ok() {
                return Err(StoreError::VaultExists(contract));
            }
            tx.execute(
                "INSERT INTO vaults (contract, created_at) VALUES (?1, ?2)",
                params![contract.to_hex(), now_millis()],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, contract: &Address, _options: Option<&Value>) -> Result<()> {
        let contract = *contract;
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM vaults WHERE contract = ?1",
                params![contract.to_hex()],
            )?;
            if removed == 0 {
                return Err(StoreError::VaultNotFound(contract));
            }
            tx.execute("DELETE FROM files WHERE contract = ?1", params![contract.to_hex()])?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn write(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        _options: Option<&Value>,
    ) -> Result<()> {
        let (contract, file, data) = (*contract, file.to_string(), data.clone());
        self.run(move |conn| {
            ensure_vault(conn, &contract)?;
            store_file(conn, &contract, &file, &data)
        })
        .await
    }

    async fn append(
        &self,
        contract: &Address,
        file: &str,
        data: &Value,
        _options: Option<&Value>,
    ) -> Result<()> {
        let (contract, file, data) = (*contract, file.to_string(), data.clone());
        self.run(move |conn| {
            let tx = conn.transaction()?;
            ensure_vault(&tx, &contract)?;
            let updated = appended(load_file(&tx, &contract, &file)?, &data)?;
            store_file(&tx, &contract, &file, &updated)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn read(&self, contract: &Address, file: &str, _options: Option<&Value>) -> Result<Value> {
        let (contract, file) = (*contract, file.to_string());
        self.run(move |conn| {
            ensure_vault(conn, &contract)?;
            load_file(conn, &contract, &file)?.ok_or(StoreError::FileNotFound(file))
        })
        .await
    }

    async fn read_dir(
        &self,
        contract: &Address,
        dir: &Address,
        _options: Option<&Value>,
    ) -> Result<String> {
        let (contract, dir) = (*contract, *dir);
        self.run(move |conn| {
            ensure_vault(conn, &contract)?;
            let mut stmt = conn.prepare("SELECT name FROM files WHERE contract = ?1")?;
            let names = stmt
                .query_map(params![contract.to_hex()], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(list_directory(names.iter().map(String::as_str), &dir))
        })
        .await
    }
}
