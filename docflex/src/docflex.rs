use crate::client::{Client, ConnectOptions, Database};
use crate::connection::ConnectionRegistry;
use crate::docflex_builder::DocFlexBuilder;
use crate::errors::DocFlexResult;
use crate::model::{Model, ModelDescriptor, ModelRegistry};
use crate::repository::Repository;
use std::sync::Arc;

/// The entry point of docflex.
///
/// A `DocFlex` context owns a [`ConnectionRegistry`] and a [`ModelRegistry`].
/// Clones share both, so a context can be handed to every task of an
/// application. Separate contexts are fully independent.
///
/// # Examples
///
/// ```rust,ignore
/// use docflex::docflex::DocFlex;
///
/// let docflex = DocFlex::builder()
///     .connect("mongodb://localhost:27017/app")
///     .register::<UserProfile>()
///     .open()
///     .await?;
///
/// let users = docflex.repository::<UserProfile>()?;
/// users.save(&Record::new(UserProfile::default())).await?;
/// ```
#[derive(Clone, Default)]
pub struct DocFlex {
    inner: Arc<DocFlexInner>,
}

#[derive(Default)]
struct DocFlexInner {
    connections: ConnectionRegistry,
    models: ModelRegistry,
}

impl DocFlex {
    /// Creates an empty context with no connections and no models.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DocFlexBuilder {
        DocFlexBuilder::new()
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.inner.connections
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.inner.models
    }

    /// Connects `address` under `label`, replacing any earlier client there.
    pub async fn connect(
        &self,
        address: &str,
        label: &str,
        options: ConnectOptions,
    ) -> DocFlexResult<Client> {
        self.inner.connections.connect(address, label, options).await
    }

    pub fn get_client(&self, label: &str) -> DocFlexResult<Client> {
        self.inner.connections.get_client(label)
    }

    pub fn get_database(&self, db_name: &str, label: &str) -> DocFlexResult<Database> {
        self.inner.connections.get_database(db_name, label)
    }

    /// Binds `T` if it is not bound yet and returns its descriptor.
    pub fn register<T: Model>(&self) -> DocFlexResult<Arc<ModelDescriptor>> {
        self.inner.models.register::<T>()
    }

    /// Returns a repository for `T`, binding the model on first use.
    ///
    /// The model's client label does not need to be connected yet.
    pub fn repository<T: Model>(&self) -> DocFlexResult<Repository<T>> {
        let descriptor = self.register::<T>()?;
        Ok(Repository::new(
            descriptor,
            self.inner.connections.clone(),
        ))
    }

    /// Creates the declared indexes of every registered model.
    pub async fn create_all_indexes(&self) -> DocFlexResult<()> {
        for descriptor in self.inner.models.descriptors() {
            if descriptor.indexes().is_empty() {
                continue;
            }
            let collection = descriptor.resolve_collection(&self.inner.connections)?;
            collection.create_indexes(descriptor.indexes().to_vec()).await?;
        }
        Ok(())
    }

    /// Drops the collection of every registered model, in registration order.
    ///
    /// A model that cannot be dropped does not stop the others; the first
    /// error is returned once every model has been visited.
    pub async fn drop_all_collections(&self) -> DocFlexResult<()> {
        let mut first_error = None;
        for descriptor in self.inner.models.descriptors() {
            let dropped = match descriptor.resolve_collection(&self.inner.connections) {
                Ok(collection) => collection.drop_collection().await,
                Err(e) => Err(e),
            };
            match dropped {
                Ok(()) => log::debug!("Dropped collection {}", descriptor.collection_name()),
                Err(e) => {
                    log::warn!(
                        "Could not drop collection {}: {}",
                        descriptor.collection_name(),
                        e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
