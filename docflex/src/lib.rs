//! # docflex - Typed document models for MongoDB
//!
//! docflex maps plain Rust structs to MongoDB collections. A model type
//! declares its fields once and docflex takes care of naming its collection,
//! finding the client and database it lives in, and converting records to
//! and from documents.
//!
//! ## Key Features
//!
//! - **Derived models**: `#[derive(Model)]` from `docflex_derive` reads the
//!   struct and its serde attributes
//! - **Collection naming**: `UserProfile` is stored in `user_profiles` unless
//!   told otherwise
//! - **Named connections**: models pick a client by label, so several
//!   deployments can be used side by side
//! - **Partial updates**: `$set` only the fields that changed, checked
//!   against the model's declared fields
//! - **Pluggable clients**: the official async driver for `mongodb://`
//!   addresses and an in-process store for `memory://` addresses
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docflex::bson::doc;
//! use docflex::docflex::DocFlex;
//! use docflex::repository::Record;
//! use docflex_derive::Model;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Model, Serialize, Deserialize)]
//! pub struct UserProfile {
//!     pub name: String,
//!     pub bio: Option<String>,
//! }
//!
//! let docflex = DocFlex::builder()
//!     .connect("mongodb://localhost:27017/app")
//!     .open()
//!     .await?;
//!
//! let users = docflex.repository::<UserProfile>()?;
//! let mut ada = Record::new(UserProfile { name: "ada".into(), bio: None });
//! users.save(&ada).await?;
//! users.update(&mut ada, doc! { "bio": "analyst" }).await?;
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - Client, database and collection handles and their backends
//! - [`connection`] - Registry of named clients
//! - [`docflex`] - The context tying connections and models together
//! - [`docflex_builder`] - Builder for the context
//! - [`errors`] - Error types and result definitions
//! - [`model`] - Model declarations, binding and registration
//! - [`naming`] - Collection name derivation
//! - [`repository`] - Records, document mapping and typed persistence

pub mod client;
pub mod connection;
pub mod docflex;
pub mod docflex_builder;
pub mod errors;
pub mod model;
pub mod naming;
pub mod repository;

pub use bson;

#[cfg(test)]
#[ctor::ctor]
fn init_test_logger() {
    colog::init();
}
