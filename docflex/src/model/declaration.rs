use crate::client::IndexSpec;
use indexmap::IndexMap;

/// Config key naming the connection label a model reads from.
pub const CLIENT_NAME: &str = "client_name";
/// Config key naming the database a model lives in.
pub const DATABASE_NAME: &str = "database_name";
/// Config key overriding the collection name of a model.
pub const COLLECTION_NAME: &str = "collection_name";

/// A declared field of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    name: String,
    required: bool,
}

impl FieldSpec {
    /// A field that must be present in every stored document.
    pub fn required(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            required: true,
        }
    }

    /// A field that may be absent or null in a stored document.
    pub fn optional(name: &str) -> Self {
        FieldSpec {
            name: name.to_string(),
            required: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// A model's optional configuration block.
///
/// The three well-known keys ([`CLIENT_NAME`], [`DATABASE_NAME`] and
/// [`COLLECTION_NAME`]) steer binding; any other key is carried along and
/// can be read back from the bound descriptor.
///
/// # Examples
///
/// ```rust
/// use docflex::model::ModelConfig;
///
/// let config = ModelConfig::new()
///     .client_name("reports")
///     .database_name("analytics")
///     .set("read_preference", "secondary");
/// assert_eq!(config.get("database_name"), Some("analytics"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelConfig {
    options: IndexMap<String, String>,
}

impl ModelConfig {
    pub fn new() -> Self {
        ModelConfig {
            options: IndexMap::new(),
        }
    }

    pub fn client_name(self, label: &str) -> Self {
        self.set(CLIENT_NAME, label)
    }

    pub fn database_name(self, name: &str) -> Self {
        self.set(DATABASE_NAME, name)
    }

    pub fn collection_name(self, name: &str) -> Self {
        self.set(COLLECTION_NAME, name)
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Layers `self` over `base`; keys set here win.
    pub fn merged_over(&self, base: &ModelConfig) -> ModelConfig {
        let mut options = base.options.clone();
        for (key, value) in &self.options {
            options.insert(key.clone(), value.clone());
        }
        ModelConfig { options }
    }
}

/// Everything a model type says about itself before binding.
///
/// Usually produced by `#[derive(Model)]`, but can be built by hand:
///
/// ```rust
/// use docflex::model::{FieldSpec, ModelConfig, ModelDeclaration};
///
/// let declaration = ModelDeclaration::new("UserProfile")
///     .field(FieldSpec::required("name"))
///     .field(FieldSpec::optional("bio"))
///     .config(ModelConfig::new().client_name("accounts"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelDeclaration {
    type_name: String,
    fields: Vec<FieldSpec>,
    database: Option<String>,
    collection: Option<String>,
    config: ModelConfig,
    inherited: ModelConfig,
    indexes: Vec<IndexSpec>,
}

impl ModelDeclaration {
    pub fn new(type_name: &str) -> Self {
        ModelDeclaration {
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Explicit database name; wins over any configuration block.
    pub fn database(mut self, name: &str) -> Self {
        self.database = Some(name.to_string());
        self
    }

    /// Explicit collection name; wins over any configuration block.
    pub fn collection(mut self, name: &str) -> Self {
        self.collection = Some(name.to_string());
        self
    }

    /// The model's own configuration block.
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    /// A configuration block inherited from a base model.
    ///
    /// Keys in the model's own block take precedence. May be called more
    /// than once; later blocks take precedence over earlier ones.
    pub fn inherit(mut self, base: ModelConfig) -> Self {
        self.inherited = base.merged_over(&self.inherited);
        self
    }

    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn explicit_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn explicit_collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// The model's own block layered over everything it inherits.
    pub fn effective_config(&self) -> ModelConfig {
        self.config.merged_over(&self.inherited)
    }
}
