//! Named client connections.

use crate::client::{Client, ConnectOptions, Database};
use crate::errors::{DocFlexError, DocFlexResult, ErrorKind};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Label used when no client label is given.
pub const DEFAULT_CLIENT_LABEL: &str = "default";

/// Address used when no connection string is given.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017/test";

/// A mapping from client labels to connected clients.
///
/// The registry is an explicit context object: clones share the same
/// entries, and independent registries can coexist in one process (one per
/// test, for instance). Entries live until the registry is dropped.
///
/// Registering a label twice replaces the earlier client. Lookups always read
/// the current entry, so models resolved after a reconnect use the new client.
///
/// # Examples
///
/// ```rust,ignore
/// use docflex::client::ConnectOptions;
/// use docflex::connection::{ConnectionRegistry, DEFAULT_CLIENT_LABEL};
///
/// let registry = ConnectionRegistry::new();
/// registry.connect("mongodb://localhost:27017/app", DEFAULT_CLIENT_LABEL, ConnectOptions::new()).await?;
/// let users = registry.get_database("app", DEFAULT_CLIENT_LABEL)?.collection("users");
/// ```
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    clients: Arc<RwLock<HashMap<String, Client>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry {
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a client for `address` and stores it under `label`.
    ///
    /// No liveness check is made; the backend connects on first use. Any
    /// client previously stored under `label` is replaced.
    pub async fn connect(
        &self,
        address: &str,
        label: &str,
        options: ConnectOptions,
    ) -> DocFlexResult<Client> {
        let client = Client::connect(address, &options).await?;
        self.register(label, client.clone());
        Ok(client)
    }

    /// Stores an already created client under `label`, returning the one it replaces.
    pub fn register(&self, label: &str, client: Client) -> Option<Client> {
        let previous = self.clients.write().insert(label.to_string(), client);
        if previous.is_some() {
            log::warn!("Replacing client registered under label {}", label);
        } else {
            log::debug!("Registered client under label {}", label);
        }
        previous
    }

    /// Returns the client registered under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotConnected`] if no client is registered under it.
    pub fn get_client(&self, label: &str) -> DocFlexResult<Client> {
        match self.clients.read().get(label) {
            Some(client) => Ok(client.clone()),
            None => {
                log::error!("No connection named {}", label);
                Err(DocFlexError::new(
                    &format!("No connection named {}", label),
                    ErrorKind::NotConnected,
                ))
            }
        }
    }

    /// Returns the named database of the client registered under `label`.
    pub fn get_database(&self, db_name: &str, label: &str) -> DocFlexResult<Database> {
        let client = self.get_client(label)?;
        Ok(client.database(db_name))
    }

    /// Returns the database named in the connection string of `label`'s client.
    pub fn get_default_database(&self, label: &str) -> DocFlexResult<Database> {
        self.get_client(label)?.default_database()
    }

    pub fn is_connected(&self, label: &str) -> bool {
        self.clients.read().contains_key(label)
    }

    /// Registered labels in alphabetical order.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.clients.read().keys().cloned().collect();
        labels.sort();
        labels
    }
}
