use bson::{doc, Bson, Document};
use indexmap::IndexMap;

/// Free-form connection options forwarded verbatim to the backend.
///
/// For the MongoDB backend every entry becomes a connection string option
/// (`maxPoolSize`, `appName`, `retryWrites`, ...), so the driver validates
/// them. Insertion order is preserved.
///
/// # Examples
///
/// ```rust
/// use docflex::client::ConnectOptions;
///
/// let options = ConnectOptions::new()
///     .set("appName", "billing")
///     .set("maxPoolSize", 20);
/// assert_eq!(options.get("maxPoolSize"), Some("20"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    entries: IndexMap<String, String>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        ConnectOptions {
            entries: IndexMap::new(),
        }
    }

    /// Sets an option, replacing any previous value under the same key.
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for ConnectOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ConnectOptions {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Options for `find` and `find_one`, forwarded to the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Document>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
    pub projection: Option<Document>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// The result of an `update_one` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Bson>,
}

/// An index to create on a collection.
///
/// Keys map field names to a direction (`1` ascending, `-1` descending).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    keys: Document,
    unique: bool,
    name: Option<String>,
}

impl IndexSpec {
    /// Creates an ascending index over `fields`.
    pub fn new(fields: Vec<&str>, unique: bool) -> Self {
        let mut keys = Document::new();
        for field in fields {
            keys.insert(field, 1i32);
        }
        IndexSpec {
            keys,
            unique,
            name: None,
        }
    }

    /// Creates an index from an explicit key document.
    pub fn with_keys(keys: Document, unique: bool) -> Self {
        IndexSpec {
            keys,
            unique,
            name: None,
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn keys(&self) -> &Document {
        &self.keys
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.keys.keys().map(|k| k.as_str()).collect()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// The index name; defaults to the driver convention `field_dir_field_dir`.
    pub fn name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .keys
                .iter()
                .map(|(field, direction)| format!("{}_{}", field, direction))
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

/// Builds the `{ "_id": id }` filter used to address a single record.
pub(crate) fn id_filter(id_field: &str, id: impl Into<Bson>) -> Document {
    let mut filter = Document::new();
    filter.insert(id_field, id.into());
    filter
}

/// Wraps field changes in a `$set` update document.
pub(crate) fn set_update(changes: Document) -> Document {
    doc! { "$set": changes }
}
