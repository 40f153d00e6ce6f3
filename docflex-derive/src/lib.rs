#![recursion_limit = "128"]
//! # docflex Derive Macros
//!
//! This crate provides the `Model` derive for the docflex crate.
//!
//! ## `Model`
//!
//! Implements `docflex::model::Model` for a struct with named fields. The
//! declared fields are the struct's serde keys, so `#[serde(rename)]`,
//! `#[serde(rename_all)]` and `#[serde(skip)]` are honored. A field is
//! required unless it is an `Option` or has a serde default.
//!
//! Container attributes:
//!
//! - `#[model(name = "...")]` - type name used to derive the collection name
//! - `#[model(collection = "...")]`, `#[model(database = "...")]` - explicit names
//! - `#[model(client = "...")]` - connection label
//! - `#[model(config(key = "value", ...))]` - free-form configuration entries
//! - `#[model(inherit = "path::to::fn")]` - a `fn() -> ModelConfig` to inherit from
//! - `#[model(index(type = "unique", fields = "a, b"))]` - an index
//!
//! Field attributes:
//!
//! - `#[model(required)]` / `#[model(optional)]` - override the inferred requirement
//!
//! # Examples
//!
//! ```rust,ignore
//! use docflex_derive::Model;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Model, Serialize, Deserialize)]
//! #[model(client = "accounts", index(type = "unique", fields = "email"))]
//! pub struct UserProfile {
//!     pub email: String,
//!     #[serde(rename = "displayName")]
//!     pub display_name: String,
//!     pub bio: Option<String>,
//! }
//! ```

extern crate proc_macro;
mod model;
mod rename;

use crate::model::generate_model_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives `docflex::model::Model`.
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum, a union, a tuple struct or a unit struct
/// - A field is `#[serde(flatten)]`
/// - Two fields map to the same key
/// - An index names a field the struct does not have
/// - A field is renamed differently for serialization and deserialization
/// - The `_id` field is not a bson `ObjectId`
#[proc_macro_derive(Model, attributes(model))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_model_for_struct(&ast, data) {
            Ok(token_stream) => token_stream.into(),
            Err(e) => e.to_compile_error().into(),
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Model for enums. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Model for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
