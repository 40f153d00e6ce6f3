//! Typed persistence of model records.
//!
//! A [`Repository`] maps [`Record`]s of one model type to documents of the
//! model's collection and back.
//!
//! - **Records** pair a model value with its immutable ObjectId.
//! - **Mapping** writes exactly the declared fields and ignores stored keys
//!   the model does not declare.
//! - **Updates** are partial: only the changed fields are written, after they
//!   are checked against the model's declared fields.
//!
//! ```rust,ignore
//! let users = docflex.repository::<UserProfile>()?;
//! let mut cursor = users.find(doc! { "bio": null }).await?;
//! while let Some(user) = cursor.next_record().await {
//!     println!("{}", user?.name);
//! }
//! ```

mod cursor;
mod record;
#[allow(clippy::module_inception)]
mod repository;

pub use cursor::*;
pub use record::*;
pub use repository::*;
