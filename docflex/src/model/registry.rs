use crate::errors::DocFlexResult;
use crate::model::{Model, ModelDescriptor};
use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

/// The bound descriptors of every registered model type.
///
/// Each type is bound once; later registrations return the cached
/// descriptor. Registration order is kept for teardown.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    inner: Arc<RwLock<ModelRegistryInner>>,
}

#[derive(Default)]
struct ModelRegistryInner {
    ordered: Vec<Arc<ModelDescriptor>>,
    by_type: HashMap<TypeId, Arc<ModelDescriptor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `T` on first use and returns its descriptor.
    pub fn register<T: Model>(&self) -> DocFlexResult<Arc<ModelDescriptor>> {
        if let Some(descriptor) = self.descriptor::<T>() {
            return Ok(descriptor);
        }

        // bind outside the lock, declarations may be arbitrary user code
        let descriptor = Arc::new(ModelDescriptor::bind(T::declaration())?);

        let mut inner = self.inner.write();
        if let Some(existing) = inner.by_type.get(&TypeId::of::<T>()) {
            return Ok(existing.clone());
        }
        inner.by_type.insert(TypeId::of::<T>(), descriptor.clone());
        inner.ordered.push(descriptor.clone());
        log::debug!("Registered model {}", descriptor.type_name());
        Ok(descriptor)
    }

    pub fn descriptor<T: Model>(&self) -> Option<Arc<ModelDescriptor>> {
        self.inner.read().by_type.get(&TypeId::of::<T>()).cloned()
    }

    pub fn is_registered<T: Model>(&self) -> bool {
        self.inner.read().by_type.contains_key(&TypeId::of::<T>())
    }

    /// All descriptors in registration order.
    pub fn descriptors(&self) -> Vec<Arc<ModelDescriptor>> {
        self.inner.read().ordered.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().ordered.is_empty()
    }
}
