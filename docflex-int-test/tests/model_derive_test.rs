#![allow(dead_code)]

use docflex::connection::DEFAULT_CLIENT_LABEL;
use docflex::model::{Model, ModelConfig, ModelDescriptor, CLIENT_NAME};
use docflex_derive::Model;
use serde::{Deserialize, Serialize};

#[derive(Debug, Model, Serialize, Deserialize)]
struct Config {}

#[derive(Debug, Model, Serialize, Deserialize)]
#[model(database = "authentication")]
struct User {
    name: String,
}

#[derive(Debug, Model, Serialize, Deserialize)]
struct SomeComposedName {
    value: i64,
}

#[derive(Debug, Model, Serialize, Deserialize)]
#[model(name = "Ledger", collection = "ledger_entries", client = "finance")]
struct LedgerEntry {
    amount: i64,
}

#[derive(Debug, Model, Serialize, Deserialize)]
#[model(config(read_preference = "secondary", tier = "gold"))]
struct Metric {
    value: f64,
}

fn authentication() -> ModelConfig {
    ModelConfig::new().client_name("authentication")
}

#[derive(Debug, Model, Serialize, Deserialize)]
#[model(inherit = "authentication")]
struct Session {
    token: String,
}

#[derive(Debug, Model, Serialize, Deserialize)]
#[model(inherit = "authentication", client = "audit")]
struct AuditedSession {
    token: String,
}

#[derive(Debug, Model, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CamelCased {
    first_name: String,
    #[serde(rename = "surname")]
    last_name: String,
    #[serde(skip)]
    cached: Option<String>,
}

#[derive(Debug, Model, Serialize, Deserialize)]
struct Requirements {
    plain: String,
    maybe: Option<String>,
    #[serde(default)]
    defaulted: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sparse: Option<i32>,
    #[model(required)]
    must: Option<String>,
    #[model(optional)]
    loose: String,
}

#[derive(Debug, Model, Serialize, Deserialize)]
#[serde(default)]
struct AllDefaults {
    count: i32,
}

impl Default for AllDefaults {
    fn default() -> Self {
        AllDefaults { count: 1 }
    }
}

#[derive(Debug, Model, Serialize, Deserialize)]
#[model(index(type = "unique", fields = "email"), index(type = "non-unique", fields = "city, zip"))]
struct Subscriber {
    email: String,
    city: String,
    zip: String,
}

fn bind<T: Model>() -> ModelDescriptor {
    ModelDescriptor::bind(T::declaration()).expect("valid declaration")
}

#[test]
fn test_collection_name_from_type() {
    assert_eq!(bind::<Config>().collection_name(), "configs");
    assert_eq!(bind::<User>().collection_name(), "users");
    assert_eq!(bind::<SomeComposedName>().collection_name(), "some_composed_names");
}

#[test]
fn test_database_attribute() {
    let user = bind::<User>();
    assert_eq!(user.database_name(), Some("authentication"));
    assert_eq!(user.client_label(), DEFAULT_CLIENT_LABEL);
    assert_eq!(bind::<Config>().database_name(), None);
}

#[test]
fn test_name_collection_and_client_attributes() {
    let entry = bind::<LedgerEntry>();
    assert_eq!(entry.type_name(), "Ledger");
    assert_eq!(entry.collection_name(), "ledger_entries");
    assert_eq!(entry.client_label(), "finance");
}

#[test]
fn test_config_entries() {
    let metric = bind::<Metric>();
    assert_eq!(metric.config("read_preference"), Some("secondary"));
    assert_eq!(metric.config_or("tier", "bronze"), "gold");
    assert_eq!(metric.config_or("missing", "bronze"), "bronze");
    assert_eq!(metric.config(CLIENT_NAME), None);
}

#[test]
fn test_inherited_config() {
    let session = bind::<Session>();
    assert_eq!(session.config(CLIENT_NAME), Some("authentication"));
    assert_eq!(session.client_label(), "authentication");
    assert_eq!(session.collection_name(), "sessions");

    let audited = bind::<AuditedSession>();
    assert_eq!(audited.client_label(), "audit");
    assert_eq!(audited.collection_name(), "audited_sessions");
}

#[test]
fn test_serde_names() {
    let camel = bind::<CamelCased>();
    assert_eq!(camel.field_names(), vec!["_id", "firstName", "surname"]);
}

#[test]
fn test_required_inference() {
    let requirements = bind::<Requirements>();
    let required: Vec<(&str, bool)> = requirements
        .fields()
        .iter()
        .map(|field| (field.name(), field.is_required()))
        .collect();
    assert_eq!(
        required,
        vec![
            ("_id", true),
            ("plain", true),
            ("maybe", false),
            ("defaulted", false),
            ("sparse", false),
            ("must", true),
            ("loose", false),
        ]
    );
    assert!(!bind::<AllDefaults>().field("count").expect("count").is_required());
}

#[test]
fn test_index_attributes() {
    let subscriber = bind::<Subscriber>();
    let indexes = subscriber.indexes();
    assert_eq!(indexes.len(), 2);
    assert!(indexes[0].is_unique());
    assert_eq!(indexes[0].field_names(), vec!["email"]);
    assert!(!indexes[1].is_unique());
    assert_eq!(indexes[1].field_names(), vec!["city", "zip"]);
}
