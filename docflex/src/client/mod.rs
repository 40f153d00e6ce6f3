//! Database client abstraction.
//!
//! docflex performs no I/O of its own. Every read and write goes through a
//! [`Client`] → [`Database`] → [`Collection`] chain whose implementation is
//! provided by a backend:
//!
//! - **MongoDB** (`mongodb://`, `mongodb+srv://`): the official async driver,
//!   available with the `mongodb` cargo feature (on by default).
//! - **In-memory** (`memory://name/database`): an in-process document store
//!   used for tests and examples.
//!
//! The handles are cheap to clone; clones share the backend state.

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;
mod options;

pub use options::*;

use crate::errors::{DocFlexError, DocFlexResult, ErrorKind};
use async_trait::async_trait;
use bson::{Bson, Document};
use futures::stream::BoxStream;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::sync::Arc;

/// A stream of raw documents produced by a backend query.
pub type DocumentStream = BoxStream<'static, DocFlexResult<Document>>;

/// Backend side of a connected client.
pub trait ClientProvider: Send + Sync {
    /// The address the client was created for.
    fn address(&self) -> &str;

    /// The database named in the connection string, if any.
    fn default_database_name(&self) -> Option<String>;

    /// Returns a handle to the named database. No I/O is performed.
    fn database(&self, name: &str) -> Database;
}

/// Backend side of a database handle.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns a handle to the named collection. No I/O is performed.
    fn collection(&self, name: &str) -> Collection;

    async fn list_collection_names(&self) -> DocFlexResult<Vec<String>>;
}

/// Backend side of a collection handle.
#[async_trait]
pub trait CollectionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn find_one(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> DocFlexResult<Option<Document>>;

    async fn find(&self, filter: Document, options: FindOptions) -> DocFlexResult<DocumentStream>;

    async fn insert_one(&self, document: Document) -> DocFlexResult<Bson>;

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocFlexResult<UpdateOutcome>;

    async fn create_indexes(&self, indexes: Vec<IndexSpec>) -> DocFlexResult<()>;

    async fn drop_collection(&self) -> DocFlexResult<()>;
}

/// A connected database client.
///
/// Creating a client does not open a network connection; the backend
/// connects on first use.
#[derive(Clone)]
pub struct Client {
    inner: Arc<dyn ClientProvider>,
}

impl Client {
    pub fn new<T: ClientProvider + 'static>(provider: T) -> Self {
        Client {
            inner: Arc::new(provider),
        }
    }

    /// Creates a client for `address`, selecting the backend from its scheme.
    ///
    /// `options` are forwarded verbatim to the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidAddress`] when the scheme is unknown or the
    /// backend for it is not compiled in, and [`ErrorKind::ClientError`] when
    /// the backend rejects the address or the options.
    pub async fn connect(address: &str, options: &ConnectOptions) -> DocFlexResult<Client> {
        let scheme = match address.split_once("://") {
            Some((scheme, _)) => scheme,
            None => {
                log::error!("Connection address {} has no scheme", address);
                return Err(DocFlexError::new(
                    &format!("Invalid connection address '{}': missing scheme", address),
                    ErrorKind::InvalidAddress,
                ));
            }
        };

        match scheme {
            memory::MEMORY_SCHEME => {
                let client = memory::InMemoryClient::new(address, options.clone())?;
                Ok(Client::new(client))
            }
            #[cfg(feature = "mongodb")]
            "mongodb" | "mongodb+srv" => {
                let client = mongo::MongoClient::new(address, options).await?;
                Ok(Client::new(client))
            }
            other => {
                log::error!("Unsupported connection scheme {}", other);
                Err(DocFlexError::new(
                    &format!("Unsupported connection scheme '{}'", other),
                    ErrorKind::InvalidAddress,
                ))
            }
        }
    }

    /// Returns the database named in the connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NoDatabase`] if the address has no database path.
    pub fn default_database(&self) -> DocFlexResult<Database> {
        match self.inner.default_database_name() {
            Some(name) => Ok(self.inner.database(&name)),
            None => Err(DocFlexError::new(
                &format!("No default database in address '{}'", self.inner.address()),
                ErrorKind::NoDatabase,
            )),
        }
    }
}

impl Deref for Client {
    type Target = Arc<dyn ClientProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("address", &self.inner.address())
            .finish()
    }
}

/// A database handle.
#[derive(Clone)]
pub struct Database {
    inner: Arc<dyn DatabaseProvider>,
}

impl Database {
    pub fn new<T: DatabaseProvider + 'static>(provider: T) -> Self {
        Database {
            inner: Arc::new(provider),
        }
    }
}

impl Deref for Database {
    type Target = Arc<dyn DatabaseProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name())
            .finish()
    }
}

/// A collection handle.
#[derive(Clone)]
pub struct Collection {
    inner: Arc<dyn CollectionProvider>,
}

impl Collection {
    pub fn new<T: CollectionProvider + 'static>(provider: T) -> Self {
        Collection {
            inner: Arc::new(provider),
        }
    }
}

impl Deref for Collection {
    type Target = Arc<dyn CollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Debug for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.inner.name())
            .finish()
    }
}
