use crate::errors::{DocFlexError, DocFlexResult, ErrorKind};
use crate::model::{ModelDescriptor, ID_FIELD};
use bson::oid::ObjectId;
use bson::{Bson, Document};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ops::{Deref, DerefMut};

/// A model value paired with its document identifier.
///
/// The identifier is assigned when the record is created and never changes.
/// The value is reachable through `Deref`, so fields read as `record.name`.
///
/// # Examples
///
/// ```rust,ignore
/// let mut record = Record::new(UserProfile { name: "ada".into(), bio: None });
/// repository.save(&record).await?;
/// record.bio = Some("analyst".into());
/// repository.save(&record).await?;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    id: ObjectId,
    data: T,
}

impl<T: Serialize> Record<T> {
    /// Wraps `data` with a fresh identifier.
    ///
    /// A model that declares its own `_id` field keeps the value it already
    /// holds when that value is an ObjectId.
    pub fn new(data: T) -> Self {
        let id = carried_id(&data).unwrap_or_else(ObjectId::new);
        Record { id, data }
    }
}

impl<T> Record<T> {
    /// Wraps `data` with a known identifier.
    pub fn with_id(id: ObjectId, data: T) -> Self {
        Record { id, data }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    pub fn into_inner(self) -> T {
        self.data
    }

    pub(crate) fn replace_data(&mut self, data: T) {
        self.data = data;
    }
}

impl<T> Deref for Record<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T> DerefMut for Record<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

fn carried_id<T: Serialize>(data: &T) -> Option<ObjectId> {
    let document = bson::to_document(data).ok()?;
    document.get_object_id(ID_FIELD).ok()
}

/// Builds the stored document of a record.
///
/// The document holds exactly the model's declared fields, in declaration
/// order with `_id` first unless the model places it elsewhere. Fields the
/// value leaves out are written as null.
///
/// # Errors
///
/// [`ErrorKind::InvalidDeclaration`] if the model carries its own `_id`
/// that is not an ObjectId, [`ErrorKind::ObjectMappingError`] if the value
/// does not serialize to a document.
pub fn to_document<T: Serialize>(
    descriptor: &ModelDescriptor,
    record: &Record<T>,
) -> DocFlexResult<Document> {
    let mut data = bson::to_document(record.data())?;
    match data.get(ID_FIELD) {
        None | Some(Bson::Null) | Some(Bson::ObjectId(_)) => {}
        Some(other) => {
            log::error!(
                "Model {} declares a non ObjectId identifier",
                descriptor.type_name()
            );
            return Err(DocFlexError::new(
                &format!(
                    "Identifier of {} must be an ObjectId, found {:?}",
                    descriptor.type_name(),
                    other.element_type()
                ),
                ErrorKind::InvalidDeclaration,
            ));
        }
    }
    let mut document = Document::new();
    for field in descriptor.fields() {
        if field.name() == ID_FIELD {
            document.insert(ID_FIELD, record.id());
        } else {
            let value = data.remove(field.name()).unwrap_or(Bson::Null);
            document.insert(field.name(), value);
        }
    }
    Ok(document)
}

/// Builds a record from a stored document.
///
/// Keys the model does not declare are ignored. A null optional field is
/// treated as absent so the model's own default applies. A document without
/// `_id` gets a fresh identifier.
///
/// # Errors
///
/// [`ErrorKind::MissingRequiredField`] if a required field is absent,
/// [`ErrorKind::ObjectMappingError`] if `_id` is not an ObjectId or the
/// remaining fields do not deserialize into `T`.
pub fn from_document<T: DeserializeOwned>(
    descriptor: &ModelDescriptor,
    document: Document,
) -> DocFlexResult<Record<T>> {
    let mut id = None;
    let mut data = Document::new();
    for (key, value) in document {
        if key == ID_FIELD {
            match value {
                Bson::ObjectId(oid) => id = Some(oid),
                other => {
                    log::error!(
                        "Document for model {} has a non ObjectId identifier",
                        descriptor.type_name()
                    );
                    return Err(DocFlexError::new(
                        &format!(
                            "Identifier of {} must be an ObjectId, found {:?}",
                            descriptor.type_name(),
                            other.element_type()
                        ),
                        ErrorKind::ObjectMappingError,
                    ));
                }
            }
        } else if let Some(field) = descriptor.field(&key) {
            if value == Bson::Null && !field.is_required() {
                continue;
            }
            data.insert(key, value);
        }
    }

    for field in descriptor.fields() {
        if field.is_required() && field.name() != ID_FIELD && !data.contains_key(field.name()) {
            log::error!(
                "Document for model {} is missing required field {}",
                descriptor.type_name(),
                field.name()
            );
            return Err(DocFlexError::new(
                &format!(
                    "Missing required field '{}' for model {}",
                    field.name(),
                    descriptor.type_name()
                ),
                ErrorKind::MissingRequiredField,
            ));
        }
    }

    let id = id.unwrap_or_else(ObjectId::new);
    if descriptor.is_id_declared() {
        data.insert(ID_FIELD, id);
    }
    let value: T = bson::from_document(data)?;
    Ok(Record::with_id(id, value))
}
