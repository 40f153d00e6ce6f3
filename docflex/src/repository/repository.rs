use crate::client::{id_filter, set_update, Client, Collection, Database, FindOptions};
use crate::connection::ConnectionRegistry;
use crate::errors::{DocFlexError, DocFlexResult, ErrorKind};
use crate::model::{Model, ModelDescriptor, ID_FIELD};
use crate::repository::cursor::RecordCursor;
use crate::repository::record::{from_document, to_document, Record};
use bson::Document;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed access to the collection of a model.
///
/// A repository holds no connection. Every call resolves the collection
/// through the connection registry, so the repository can be created before
/// the model's client label is connected and keeps working across reconnects.
///
/// # Examples
///
/// ```rust,ignore
/// let users = docflex.repository::<UserProfile>()?;
///
/// let mut ada = Record::new(UserProfile { name: "ada".into(), bio: None });
/// users.insert(&ada).await?;
/// users.update(&mut ada, doc! { "bio": "analyst" }).await?;
///
/// let found = users.find_one(doc! { "name": "ada" }).await?;
/// ```
pub struct Repository<T> {
    descriptor: Arc<ModelDescriptor>,
    connections: ConnectionRegistry,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Repository {
            descriptor: self.descriptor.clone(),
            connections: self.connections.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T: Model> Repository<T> {
    pub(crate) fn new(descriptor: Arc<ModelDescriptor>, connections: ConnectionRegistry) -> Self {
        Repository {
            descriptor,
            connections,
            _phantom: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn client(&self) -> DocFlexResult<Client> {
        self.descriptor.resolve_client(&self.connections)
    }

    pub fn database(&self) -> DocFlexResult<Database> {
        self.descriptor.resolve_database(&self.connections)
    }

    pub fn collection(&self) -> DocFlexResult<Collection> {
        self.descriptor.resolve_collection(&self.connections)
    }

    pub fn to_document(&self, record: &Record<T>) -> DocFlexResult<Document> {
        to_document(&self.descriptor, record)
    }

    pub fn from_document(&self, document: Document) -> DocFlexResult<Record<T>> {
        from_document(&self.descriptor, document)
    }

    /// Writes every declared field of the record, creating the document if
    /// no document with the record's identifier exists.
    pub async fn save(&self, record: &Record<T>) -> DocFlexResult<()> {
        let document = self.to_document(record)?;
        let collection = self.collection()?;
        collection
            .update_one(
                id_filter(ID_FIELD, record.id()),
                set_update(document),
                true,
            )
            .await?;
        Ok(())
    }

    /// Inserts the record as a new document.
    ///
    /// Fails with a client error if a document with the same identifier
    /// already exists.
    pub async fn insert(&self, record: &Record<T>) -> DocFlexResult<()> {
        let document = self.to_document(record)?;
        let collection = self.collection()?;
        collection.insert_one(document).await?;
        Ok(())
    }

    /// Writes `changes` to the stored document and applies them to `record`.
    ///
    /// Only the given fields are written. An empty `changes` document is a
    /// no-op. On any error the record is left untouched.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::UnknownField`] if a key is not a declared field,
    /// [`ErrorKind::InvalidOperation`] if `_id` is among the changes, and
    /// [`ErrorKind::ObjectMappingError`] if a value does not fit its field.
    pub async fn update(&self, record: &mut Record<T>, changes: Document) -> DocFlexResult<()> {
        for key in changes.keys() {
            if key == ID_FIELD {
                log::error!("Attempt to update the identifier of {}", self.descriptor.type_name());
                return Err(DocFlexError::new(
                    "The identifier of a record cannot be updated",
                    ErrorKind::InvalidOperation,
                ));
            }
            if !self.descriptor.has_field(key) {
                log::error!(
                    "Update names field {} which {} does not declare",
                    key,
                    self.descriptor.type_name()
                );
                return Err(DocFlexError::new(
                    &format!("Key {} not allowed", key),
                    ErrorKind::UnknownField,
                ));
            }
        }
        if changes.is_empty() {
            return Ok(());
        }

        let mut merged = self.to_document(record)?;
        for (key, value) in changes.iter() {
            merged.insert(key.clone(), value.clone());
        }
        let updated = from_document::<T>(&self.descriptor, merged)?;

        let collection = self.collection()?;
        collection
            .update_one(id_filter(ID_FIELD, record.id()), set_update(changes), false)
            .await?;
        record.replace_data(updated.into_inner());
        Ok(())
    }

    pub async fn find_one(&self, filter: Document) -> DocFlexResult<Option<Record<T>>> {
        self.find_one_with_options(filter, FindOptions::new()).await
    }

    /// Returns the first matching record, if any.
    pub async fn find_one_with_options(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> DocFlexResult<Option<Record<T>>> {
        let collection = self.collection()?;
        match collection.find_one(filter, options).await? {
            Some(document) => Ok(Some(self.from_document(document)?)),
            None => Ok(None),
        }
    }

    pub async fn find(&self, filter: Document) -> DocFlexResult<RecordCursor<T>> {
        self.find_with_options(filter, FindOptions::new()).await
    }

    /// Returns a cursor over the matching records.
    pub async fn find_with_options(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> DocFlexResult<RecordCursor<T>> {
        let collection = self.collection()?;
        let stream = collection.find(filter, options).await?;
        Ok(RecordCursor::new(stream, self.descriptor.clone()))
    }

    /// Creates the indexes the model declares.
    pub async fn create_indexes(&self) -> DocFlexResult<()> {
        if self.descriptor.indexes().is_empty() {
            return Ok(());
        }
        let collection = self.collection()?;
        collection
            .create_indexes(self.descriptor.indexes().to_vec())
            .await?;
        log::debug!(
            "Created {} index(es) on {}",
            self.descriptor.indexes().len(),
            self.descriptor.collection_name()
        );
        Ok(())
    }

    pub async fn drop_collection(&self) -> DocFlexResult<()> {
        let collection = self.collection()?;
        collection.drop_collection().await?;
        log::debug!("Dropped collection {}", self.descriptor.collection_name());
        Ok(())
    }
}
