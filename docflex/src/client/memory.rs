//! In-process document backend.
//!
//! Addresses take the form `memory://<server>/<database>`. Clients connected
//! to the same server name share its data while any handle to that server is
//! alive; once the last client, database or collection handle is dropped the
//! server and its documents are freed.
//!
//! The backend understands exactly what the repository issues: equality
//! filters on top-level fields (including `_id` and the empty filter),
//! `$set` updates with or without upsert, collection drop and listing.
//! Query operators, dotted paths, find options and secondary indexes are
//! rejected or ignored; use a MongoDB server for those.

use crate::client::{
    Client, ClientProvider, Collection, CollectionProvider, ConnectOptions, Database,
    DatabaseProvider, DocumentStream, FindOptions, IndexSpec, UpdateOutcome,
};
use crate::errors::{DocFlexError, DocFlexResult, ErrorKind};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use futures::StreamExt;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Weak};

pub const MEMORY_SCHEME: &str = "memory";

static SERVERS: LazyLock<Mutex<HashMap<String, Weak<ServerState>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

fn server(name: &str) -> Arc<ServerState> {
    let mut servers = SERVERS.lock();
    if let Some(state) = servers.get(name).and_then(Weak::upgrade) {
        return state;
    }

    // entries of servers nobody holds anymore
    servers.retain(|_, state| state.strong_count() > 0);

    let state = Arc::new(ServerState::default());
    servers.insert(name.to_string(), Arc::downgrade(&state));
    log::debug!("Started in-memory server {}", name);
    state
}

#[derive(Default)]
struct ServerState {
    databases: RwLock<HashMap<String, Arc<DatabaseState>>>,
}

impl ServerState {
    fn database(&self, name: &str) -> Arc<DatabaseState> {
        if let Some(state) = self.databases.read().get(name) {
            return state.clone();
        }
        self.databases
            .write()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[derive(Default)]
struct DatabaseState {
    collections: RwLock<IndexMap<String, Arc<RwLock<Vec<Document>>>>>,
}

impl DatabaseState {
    fn existing(&self, name: &str) -> Option<Arc<RwLock<Vec<Document>>>> {
        self.collections.read().get(name).cloned()
    }

    fn get_or_create(&self, name: &str) -> Arc<RwLock<Vec<Document>>> {
        if let Some(state) = self.existing(name) {
            return state;
        }
        self.collections
            .write()
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

/// Client for the in-process backend.
pub struct InMemoryClient {
    address: String,
    server: Arc<ServerState>,
    default_database: Option<String>,
    options: ConnectOptions,
}

impl InMemoryClient {
    /// Parses `memory://<server>[/<database>][?...]` and attaches to the server.
    pub fn new(address: &str, options: ConnectOptions) -> DocFlexResult<Self> {
        let rest = address
            .strip_prefix(MEMORY_SCHEME)
            .and_then(|rest| rest.strip_prefix("://"))
            .ok_or_else(|| {
                DocFlexError::new(
                    &format!("Not an in-memory address: '{}'", address),
                    ErrorKind::InvalidAddress,
                )
            })?;
        let rest = rest.split('?').next().unwrap_or_default();
        let (host, database) = match rest.split_once('/') {
            Some((host, database)) => (host, database),
            None => (rest, ""),
        };

        if host.is_empty() {
            log::error!("In-memory address {} has no server name", address);
            return Err(DocFlexError::new(
                &format!("Missing server name in address '{}'", address),
                ErrorKind::InvalidAddress,
            ));
        }

        let default_database = if database.is_empty() {
            None
        } else {
            Some(database.to_string())
        };

        Ok(InMemoryClient {
            address: address.to_string(),
            server: server(host),
            default_database,
            options,
        })
    }

    /// The options the client was connected with.
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }
}

impl ClientProvider for InMemoryClient {
    fn address(&self) -> &str {
        &self.address
    }

    fn default_database_name(&self) -> Option<String> {
        self.default_database.clone()
    }

    fn database(&self, name: &str) -> Database {
        Database::new(InMemoryDatabase {
            name: name.to_string(),
            server: self.server.clone(),
            state: self.server.database(name),
        })
    }
}

struct InMemoryDatabase {
    name: String,
    // keeps the server registered while the handle is in use
    server: Arc<ServerState>,
    state: Arc<DatabaseState>,
}

#[async_trait]
impl DatabaseProvider for InMemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self, name: &str) -> Collection {
        Collection::new(InMemoryCollection {
            namespace: format!("{}.{}", self.name, name),
            name: name.to_string(),
            _server: self.server.clone(),
            database: self.state.clone(),
        })
    }

    async fn list_collection_names(&self) -> DocFlexResult<Vec<String>> {
        Ok(self.state.collections.read().keys().cloned().collect())
    }
}

/// Collection handle; the backing state is looked up on every call so that
/// a dropped collection is recreated by the next write.
struct InMemoryCollection {
    namespace: String,
    name: String,
    _server: Arc<ServerState>,
    database: Arc<DatabaseState>,
}

impl InMemoryCollection {
    fn duplicate_id(&self, id: &Bson) -> DocFlexError {
        log::error!("Duplicate _id {} in {}", id, self.namespace);
        DocFlexError::new(
            &format!(
                "E11000 duplicate key error collection: {} index: _id_ dup key: {{ _id: {} }}",
                self.namespace, id
            ),
            ErrorKind::ClientError,
        )
    }
}

#[async_trait]
impl CollectionProvider for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> DocFlexResult<Option<Document>> {
        check_find_options(&options)?;
        check_filter(&filter)?;
        let state = match self.database.existing(&self.name) {
            Some(state) => state,
            None => return Ok(None),
        };
        let found = state
            .read()
            .iter()
            .find(|document| matches(document, &filter))
            .cloned();
        Ok(found)
    }

    async fn find(&self, filter: Document, options: FindOptions) -> DocFlexResult<DocumentStream> {
        check_find_options(&options)?;
        check_filter(&filter)?;
        let selected: Vec<Document> = match self.database.existing(&self.name) {
            Some(state) => state
                .read()
                .iter()
                .filter(|document| matches(document, &filter))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(futures::stream::iter(selected.into_iter().map(Ok)).boxed())
    }

    async fn insert_one(&self, mut document: Document) -> DocFlexResult<Bson> {
        if !document.contains_key("_id") {
            let mut with_id = Document::new();
            with_id.insert("_id", ObjectId::new());
            with_id.extend(document);
            document = with_id;
        }
        let id = document.get("_id").cloned().unwrap_or(Bson::Null);

        let state = self.database.get_or_create(&self.name);
        let mut documents = state.write();
        if documents.iter().any(|other| other.get("_id") == Some(&id)) {
            return Err(self.duplicate_id(&id));
        }
        documents.push(document);
        Ok(id)
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocFlexResult<UpdateOutcome> {
        check_filter(&filter)?;
        let changes = set_changes(&update)?;

        let state = self.database.get_or_create(&self.name);
        let mut documents = state.write();
        let position = documents.iter().position(|document| matches(document, &filter));

        match position {
            Some(position) => {
                let current = &documents[position];
                let mut updated = current.clone();
                updated.extend(changes);
                if updated.get("_id") != current.get("_id") {
                    return Err(DocFlexError::new(
                        "Performing an update on the path '_id' would modify the immutable field '_id'",
                        ErrorKind::ClientError,
                    ));
                }

                let modified = updated != *current;
                documents[position] = updated;
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: if modified { 1 } else { 0 },
                    upserted_id: None,
                })
            }
            None if upsert => {
                let mut inserted = filter;
                inserted.extend(changes);
                if !inserted.contains_key("_id") {
                    let mut with_id = Document::new();
                    with_id.insert("_id", ObjectId::new());
                    with_id.extend(inserted);
                    inserted = with_id;
                }
                let id = inserted.get("_id").cloned().unwrap_or(Bson::Null);
                if documents.iter().any(|other| other.get("_id") == Some(&id)) {
                    return Err(self.duplicate_id(&id));
                }

                documents.push(inserted);
                Ok(UpdateOutcome {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: Some(id),
                })
            }
            None => Ok(UpdateOutcome {
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
            }),
        }
    }

    async fn create_indexes(&self, indexes: Vec<IndexSpec>) -> DocFlexResult<()> {
        for index in &indexes {
            log::debug!(
                "In-memory backend does not build index {} on {}",
                index.name(),
                self.namespace
            );
        }
        Ok(())
    }

    async fn drop_collection(&self) -> DocFlexResult<()> {
        if self.database.collections.write().shift_remove(&self.name).is_some() {
            log::debug!("Dropped collection {}", self.namespace);
        }
        Ok(())
    }
}

fn unsupported(what: &str) -> DocFlexError {
    log::error!("In-memory backend does not support {}", what);
    DocFlexError::new(
        &format!(
            "The in-memory backend does not support {}; use a MongoDB server",
            what
        ),
        ErrorKind::InvalidOperation,
    )
}

fn check_find_options(options: &FindOptions) -> DocFlexResult<()> {
    if *options != FindOptions::default() {
        return Err(unsupported("find options"));
    }
    Ok(())
}

/// Accepts filters made only of `field: value` pairs on top-level fields.
fn check_filter(filter: &Document) -> DocFlexResult<()> {
    for (key, value) in filter {
        if key.starts_with('$') || key.contains('.') {
            return Err(unsupported(&format!("filter key '{}'", key)));
        }
        if let Bson::Document(inner) = value {
            if inner.keys().any(|k| k.starts_with('$')) {
                return Err(unsupported(&format!("query operators on '{}'", key)));
            }
        }
    }
    Ok(())
}

// equality on every filter key; an array field also matches one of its elements
fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(Bson::Array(values)) => {
            values.contains(expected) || matches!(expected, Bson::Array(e) if e == values)
        }
        Some(value) => value == expected,
        None => *expected == Bson::Null,
    })
}

/// Extracts the fields of a `$set`-only update document.
fn set_changes(update: &Document) -> DocFlexResult<Document> {
    let mut changes = Document::new();
    for (operator, fields) in update {
        match (operator.as_str(), fields) {
            ("$set", Bson::Document(fields)) => {
                for (key, value) in fields {
                    if key.contains('.') {
                        return Err(unsupported(&format!("$set on path '{}'", key)));
                    }
                    changes.insert(key.clone(), value.clone());
                }
            }
            _ => return Err(unsupported(&format!("update operator '{}'", operator))),
        }
    }
    Ok(changes)
}

/// Connects a client to the in-process backend without going through a registry.
pub fn connect(address: &str) -> DocFlexResult<Client> {
    Ok(Client::new(InMemoryClient::new(address, ConnectOptions::new())?))
}
