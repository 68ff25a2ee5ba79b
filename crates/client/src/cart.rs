//! Durable shopping cart.
//!
//! The cart is an append-only list of product snapshots persisted as a JSON
//! array under the key [`CART_KEY`]. Every `add` rewrites the whole list.
//! Missing or unreadable data loads as an empty cart.

use std::collections::HashMap;
use std::fmt;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use dharma_core::ProductSummary;

/// Storage key holding the cart.
pub const CART_KEY: &str = "cart";

/// Errors persisting the cart.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// String key-value storage that survives restarts.
pub trait DurableStorage: Send + Sync {
    /// Read the value under `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Io` if the value exists but cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, CartError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Io` if the value cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), CartError>;
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, so readers see either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CartError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CartError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;
        file.write_all(value.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.path(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Process-local storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CartError> {
        let values = self.values.lock().map_err(|_| CartError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CartError> {
        let mut values = self.values.lock().map_err(|_| CartError::Poisoned)?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// User-visible confirmation raised by cart actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ItemAdded,
}

impl Notice {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ItemAdded => "Item Added to cart",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// The shopper's cart, mirrored to durable storage on every change.
pub struct CartStore {
    storage: Arc<dyn DurableStorage>,
    items: Vec<ProductSummary>,
}

impl CartStore {
    /// Load the persisted cart.
    ///
    /// Absent, unreadable or malformed data yields an empty cart.
    #[must_use]
    pub fn load(storage: Arc<dyn DurableStorage>) -> Self {
        let items = match storage.get(CART_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Persisted cart is malformed, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Could not read persisted cart, starting empty");
                Vec::new()
            }
        };
        debug!(items = items.len(), "Cart loaded");
        Self { storage, items }
    }

    /// Append a snapshot of `product` and persist the whole cart.
    ///
    /// Duplicates are kept. If persisting fails the in-memory cart is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart cannot be encoded or written.
    pub fn add(&mut self, product: ProductSummary) -> Result<Notice, CartError> {
        self.items.push(product);
        if let Err(e) = self.persist() {
            self.items.pop();
            return Err(e);
        }
        Ok(Notice::ItemAdded)
    }

    #[must_use]
    pub fn items(&self) -> &[ProductSummary] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn persist(&self) -> Result<(), CartError> {
        let encoded = serde_json::to_string(&self.items)?;
        self.storage.set(CART_KEY, &encoded)
    }
}
