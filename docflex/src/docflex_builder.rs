use crate::client::ConnectOptions;
use crate::connection::DEFAULT_CLIENT_LABEL;
use crate::docflex::DocFlex;
use crate::errors::{DocFlexError, DocFlexResult, ErrorKind};
use crate::model::{Model, ModelDescriptor, ModelRegistry};
use std::sync::Arc;

type Registration = fn(&ModelRegistry) -> DocFlexResult<Arc<ModelDescriptor>>;

struct PendingConnection {
    label: String,
    address: String,
    options: ConnectOptions,
}

/// Builder for a [`DocFlex`] context.
///
/// Collects connections and model registrations and applies them in order
/// when [`open`](DocFlexBuilder::open) is called. A configuration error is
/// captured and returned from `open`.
///
/// # Examples
///
/// ```rust,ignore
/// let docflex = DocFlex::builder()
///     .connect("mongodb://localhost:27017/app")
///     .connect_with("reports", "mongodb://reports:27017/analytics", ConnectOptions::new())
///     .register::<UserProfile>()
///     .register::<DailyTotal>()
///     .open()
///     .await?;
/// ```
#[derive(Default)]
pub struct DocFlexBuilder {
    error: Option<DocFlexError>,
    connections: Vec<PendingConnection>,
    registrations: Vec<Registration>,
}

impl DocFlexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects `address` under the default label.
    pub fn connect(self, address: &str) -> Self {
        self.connect_with(DEFAULT_CLIENT_LABEL, address, ConnectOptions::new())
    }

    /// Connects `address` under `label` with backend options.
    pub fn connect_with(mut self, label: &str, address: &str, options: ConnectOptions) -> Self {
        if self.error.is_none() {
            if label.is_empty() {
                self.error = Some(DocFlexError::new(
                    "Connection label cannot be empty",
                    ErrorKind::InvalidOperation,
                ));
            } else {
                self.connections.push(PendingConnection {
                    label: label.to_string(),
                    address: address.to_string(),
                    options,
                });
            }
        }
        self
    }

    /// Binds `T` when the context is opened.
    pub fn register<T: Model>(mut self) -> Self {
        self.registrations.push(ModelRegistry::register::<T>);
        self
    }

    /// Opens the context.
    ///
    /// # Errors
    ///
    /// Returns the first captured configuration error, or the first error of
    /// connecting or binding.
    pub async fn open(self) -> DocFlexResult<DocFlex> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let docflex = DocFlex::new();
        for connection in self.connections {
            docflex
                .connect(&connection.address, &connection.label, connection.options)
                .await?;
        }
        for registration in self.registrations {
            registration(docflex.models())?;
        }
        Ok(docflex)
    }
}
