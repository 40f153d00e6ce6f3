//! Model declarations and their binding to storage.
//!
//! A model is a serde type that also describes itself through
//! [`Model::declaration`]: its fields, an optional configuration block and
//! indexes. Binding turns the declaration into a [`ModelDescriptor`] that
//! knows the collection name, the database name and the client label the
//! model uses.
//!
//! # Declaring models
//!
//! ```rust,ignore
//! use docflex_derive::Model;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Model, Serialize, Deserialize)]
//! pub struct UserProfile {
//!     pub name: String,
//!     pub bio: Option<String>,
//! }
//!
//! // stored in the `user_profiles` collection of the default client
//! ```
//!
//! Configuration can be shared between models by inheriting a base block:
//!
//! ```rust,ignore
//! fn reporting() -> ModelConfig {
//!     ModelConfig::new().client_name("reports").database_name("analytics")
//! }
//!
//! #[derive(Model, Serialize, Deserialize)]
//! #[model(inherit = "reporting")]
//! pub struct DailyTotal {
//!     pub amount: i64,
//! }
//! ```

mod declaration;
mod descriptor;
mod registry;

pub use crate::client::IndexSpec;
pub use declaration::*;
pub use descriptor::*;
pub use registry::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A type that can be stored as a document.
///
/// Usually implemented with `#[derive(Model)]`. The serde representation of
/// the type must be a map whose keys are the declared field names.
pub trait Model: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Describes the model's fields, configuration and indexes.
    fn declaration() -> ModelDeclaration;
}
