//! MongoDB backend on top of the official async driver.
//!
//! Driver errors are passed through untouched as the source of a
//! [`ErrorKind::ClientError`](crate::errors::ErrorKind::ClientError).

use crate::client::{
    ClientProvider, Collection, CollectionProvider, ConnectOptions, Database, DatabaseProvider,
    DocumentStream, FindOptions, IndexSpec, UpdateOutcome,
};
use crate::errors::{DocFlexError, DocFlexResult};
use async_trait::async_trait;
use bson::{Bson, Document};
use futures::{StreamExt, TryStreamExt};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::IndexModel;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

// everything but the RFC 3986 unreserved characters
const OPTION_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Appends free-form options to a connection string as query parameters.
///
/// Keys and values are percent-encoded, so a value holding `&` or `=` reaches
/// the driver as a single option.
pub(crate) fn connection_string(address: &str, options: &ConnectOptions) -> String {
    if options.is_empty() {
        return address.to_string();
    }

    let mut uri = address.to_string();
    if uri.contains('?') {
        if !uri.ends_with('?') && !uri.ends_with('&') {
            uri.push('&');
        }
    } else {
        let hosts = uri.split_once("://").map(|(_, rest)| rest).unwrap_or_default();
        if !hosts.contains('/') {
            uri.push('/');
        }
        uri.push('?');
    }

    let query = options
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, OPTION_ENCODE_SET),
                utf8_percent_encode(value, OPTION_ENCODE_SET)
            )
        })
        .collect::<Vec<_>>()
        .join("&");
    uri.push_str(&query);
    uri
}

/// Client backed by `mongodb::Client`.
pub struct MongoClient {
    address: String,
    client: mongodb::Client,
    default_database: Option<String>,
}

impl MongoClient {
    /// Parses the connection string and creates the driver client.
    ///
    /// The driver connects lazily; no server round trip happens here except
    /// the DNS lookups required by `mongodb+srv://` addresses.
    pub async fn new(address: &str, options: &ConnectOptions) -> DocFlexResult<Self> {
        let uri = connection_string(address, options);
        let client_options = ClientOptions::parse(&uri).await?;
        let default_database = client_options.default_database.clone();
        let client = mongodb::Client::with_options(client_options)?;

        log::debug!("Created mongodb client for {}", address);
        Ok(MongoClient {
            address: address.to_string(),
            client,
            default_database,
        })
    }

    /// The underlying driver client.
    pub fn driver(&self) -> &mongodb::Client {
        &self.client
    }
}

impl ClientProvider for MongoClient {
    fn address(&self) -> &str {
        &self.address
    }

    fn default_database_name(&self) -> Option<String> {
        self.default_database.clone()
    }

    fn database(&self, name: &str) -> Database {
        Database::new(MongoDatabase {
            database: self.client.database(name),
        })
    }
}

struct MongoDatabase {
    database: mongodb::Database,
}

#[async_trait]
impl DatabaseProvider for MongoDatabase {
    fn name(&self) -> &str {
        self.database.name()
    }

    fn collection(&self, name: &str) -> Collection {
        Collection::new(MongoCollection {
            name: name.to_string(),
            collection: self.database.collection::<Document>(name),
        })
    }

    async fn list_collection_names(&self) -> DocFlexResult<Vec<String>> {
        Ok(self.database.list_collection_names().await?)
    }
}

struct MongoCollection {
    name: String,
    collection: mongodb::Collection<Document>,
}

#[async_trait]
impl CollectionProvider for MongoCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find_one(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> DocFlexResult<Option<Document>> {
        let mut action = self.collection.find_one(filter);
        if let Some(sort) = options.sort {
            action = action.sort(sort);
        }
        if let Some(skip) = options.skip {
            action = action.skip(skip);
        }
        if let Some(projection) = options.projection {
            action = action.projection(projection);
        }
        Ok(action.await?)
    }

    async fn find(&self, filter: Document, options: FindOptions) -> DocFlexResult<DocumentStream> {
        let mut action = self.collection.find(filter);
        if let Some(sort) = options.sort {
            action = action.sort(sort);
        }
        if let Some(skip) = options.skip {
            action = action.skip(skip);
        }
        if let Some(limit) = options.limit {
            action = action.limit(limit);
        }
        if let Some(projection) = options.projection {
            action = action.projection(projection);
        }
        let cursor = action.await?;
        Ok(cursor.map_err(DocFlexError::from).boxed())
    }

    async fn insert_one(&self, document: Document) -> DocFlexResult<Bson> {
        let result = self.collection.insert_one(document).await?;
        Ok(result.inserted_id)
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        upsert: bool,
    ) -> DocFlexResult<UpdateOutcome> {
        let result = self
            .collection
            .update_one(filter, update)
            .upsert(upsert)
            .await?;
        Ok(UpdateOutcome {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        })
    }

    async fn create_indexes(&self, indexes: Vec<IndexSpec>) -> DocFlexResult<()> {
        if indexes.is_empty() {
            return Ok(());
        }

        let models: Vec<IndexModel> = indexes
            .iter()
            .map(|index| {
                let options = IndexOptions::builder()
                    .unique(index.is_unique())
                    .name(index.name())
                    .build();
                IndexModel::builder()
                    .keys(index.keys().clone())
                    .options(options)
                    .build()
            })
            .collect();
        self.collection.create_indexes(models).await?;
        Ok(())
    }

    async fn drop_collection(&self) -> DocFlexResult<()> {
        self.collection.drop().await?;
        Ok(())
    }
}
