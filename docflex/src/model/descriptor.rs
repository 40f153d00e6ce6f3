use crate::client::{Client, Collection, Database, IndexSpec};
use crate::connection::{ConnectionRegistry, DEFAULT_CLIENT_LABEL};
use crate::errors::{DocFlexError, DocFlexResult, ErrorKind};
use crate::model::declaration::{
    FieldSpec, ModelConfig, ModelDeclaration, CLIENT_NAME, COLLECTION_NAME, DATABASE_NAME,
};
use crate::naming;
use std::collections::HashSet;

/// Name of the identifier field every model carries.
pub const ID_FIELD: &str = "_id";

/// A model bound to its storage location.
///
/// Produced once per type by [`ModelDescriptor::bind`]. The descriptor does
/// not hold a connection: the client, database and collection are looked up
/// in a [`ConnectionRegistry`] on every call, so a label that is connected
/// (or reconnected) after binding is picked up.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    type_name: String,
    collection_name: String,
    database_name: Option<String>,
    client_label: String,
    fields: Vec<FieldSpec>,
    id_declared: bool,
    indexes: Vec<IndexSpec>,
    config: ModelConfig,
}

impl ModelDescriptor {
    /// Validates a declaration and resolves its names.
    ///
    /// The collection name is the explicit one, else the `collection_name`
    /// config entry, else derived from the type name. The database name is
    /// the explicit one, else the `database_name` config entry, else unset.
    /// The client label is the `client_name` config entry, else `"default"`.
    ///
    /// An `_id` field is added in front of the declared fields when the
    /// declaration does not list one.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidDeclaration`] for an empty type name, an
    /// empty, duplicated or malformed field name, an empty collection name, or
    /// an index over an undeclared field.
    pub fn bind(declaration: ModelDeclaration) -> DocFlexResult<Self> {
        let type_name = declaration.type_name();
        if type_name.is_empty() {
            log::error!("Model declaration has an empty type name");
            return Err(DocFlexError::new(
                "Model type name cannot be empty",
                ErrorKind::InvalidDeclaration,
            ));
        }

        let mut seen = HashSet::new();
        for field in declaration.fields() {
            validate_field_name(type_name, field.name())?;
            if !seen.insert(field.name()) {
                log::error!("Field {} declared twice on model {}", field.name(), type_name);
                return Err(DocFlexError::new(
                    &format!("Field '{}' is declared twice on model {}", field.name(), type_name),
                    ErrorKind::InvalidDeclaration,
                ));
            }
        }

        let config = declaration.effective_config();
        let collection_name = match declaration.explicit_collection() {
            Some(name) => name.to_string(),
            None => match config.get(COLLECTION_NAME) {
                Some(name) => name.to_string(),
                None => naming::collection_name(type_name),
            },
        };
        if collection_name.is_empty() {
            log::error!("Model {} resolves to an empty collection name", type_name);
            return Err(DocFlexError::new(
                &format!("Model {} has an empty collection name", type_name),
                ErrorKind::InvalidDeclaration,
            ));
        }

        let database_name = declaration
            .explicit_database()
            .or_else(|| config.get(DATABASE_NAME))
            .map(|name| name.to_string());
        let client_label = config
            .get(CLIENT_NAME)
            .unwrap_or(DEFAULT_CLIENT_LABEL)
            .to_string();

        let id_declared = seen.contains(ID_FIELD);
        let mut fields = Vec::with_capacity(declaration.fields().len() + 1);
        if !id_declared {
            fields.push(FieldSpec::required(ID_FIELD));
        }
        fields.extend(declaration.fields().iter().cloned());

        for index in declaration.indexes() {
            let index_fields = index.field_names();
            if index_fields.is_empty() {
                return Err(DocFlexError::new(
                    &format!("Index on model {} has no fields", type_name),
                    ErrorKind::InvalidDeclaration,
                ));
            }
            for path in index_fields {
                let root = path.split('.').next().unwrap_or(path);
                if !fields.iter().any(|field| field.name() == root) {
                    log::error!("Index on model {} names undeclared field {}", type_name, path);
                    return Err(DocFlexError::new(
                        &format!("Index on model {} names undeclared field '{}'", type_name, path),
                        ErrorKind::InvalidDeclaration,
                    ));
                }
            }
        }

        log::debug!(
            "Bound model {} to collection {} (database {:?}, client {})",
            type_name,
            collection_name,
            database_name,
            client_label
        );

        Ok(ModelDescriptor {
            type_name: type_name.to_string(),
            collection_name,
            database_name,
            client_label,
            fields,
            id_declared,
            indexes: declaration.indexes().to_vec(),
            config,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// The database name, or `None` to use the client's default database.
    pub fn database_name(&self) -> Option<&str> {
        self.database_name.as_deref()
    }

    pub fn client_label(&self) -> &str {
        &self.client_label
    }

    pub fn id_field(&self) -> &str {
        ID_FIELD
    }

    /// All fields, `_id` included, in document order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name()).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name() == name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Whether the model's own data type carries the `_id` field.
    pub fn is_id_declared(&self) -> bool {
        self.id_declared
    }

    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// The merged configuration block.
    pub fn config_block(&self) -> &ModelConfig {
        &self.config
    }

    /// Reads a configuration entry.
    pub fn config(&self, name: &str) -> Option<&str> {
        self.config.get(name)
    }

    /// Reads a configuration entry, falling back to `default`.
    pub fn config_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.config.get(name).unwrap_or(default)
    }

    /// Looks up the client this model reads from.
    pub fn resolve_client(&self, connections: &ConnectionRegistry) -> DocFlexResult<Client> {
        connections.get_client(&self.client_label)
    }

    /// Looks up the database this model lives in.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotConnected`] when the client label is unknown, and
    /// [`ErrorKind::NoDatabase`] when the model names no database and the
    /// client's address has none either.
    pub fn resolve_database(&self, connections: &ConnectionRegistry) -> DocFlexResult<Database> {
        let client = self.resolve_client(connections)?;
        match &self.database_name {
            Some(name) => Ok(client.database(name)),
            None => client.default_database().map_err(|err| {
                log::error!("No database resolved for model {}", self.type_name);
                DocFlexError::new_with_cause(
                    &format!(
                        "No database configured for model {} and client '{}' has no default database",
                        self.type_name, self.client_label
                    ),
                    ErrorKind::NoDatabase,
                    err,
                )
            }),
        }
    }

    /// Looks up the collection this model is stored in.
    pub fn resolve_collection(&self, connections: &ConnectionRegistry) -> DocFlexResult<Collection> {
        let database = self.resolve_database(connections)?;
        log::debug!(
            "Resolved model {} to {}.{}",
            self.type_name,
            database.name(),
            self.collection_name
        );
        Ok(database.collection(&self.collection_name))
    }
}

fn validate_field_name(type_name: &str, name: &str) -> DocFlexResult<()> {
    let reason = if name.is_empty() {
        Some("is empty")
    } else if name.starts_with('$') {
        Some("starts with '$'")
    } else if name.contains('.') {
        Some("contains '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => {
            log::error!("Invalid field name {:?} on model {}", name, type_name);
            Err(DocFlexError::new(
                &format!("Field name '{}' on model {} {}", name, type_name, reason),
                ErrorKind::InvalidDeclaration,
            ))
        }
        None => Ok(()),
    }
}
