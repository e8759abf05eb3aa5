//! Resolve-once metadata cache.
//!
//! The registry is an explicit object handed to [`TableOperations`](crate::TableOperations)
//! rather than global state. Each entity type gets its own `OnceCell` slot; the first
//! caller resolves, concurrent callers for the same type wait on that slot and receive
//! the same `Arc`. A failed resolution leaves the slot empty.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;

use crate::error::FacadeError;

use super::descriptor::TableEntity;
use super::resolver::MetadataResolver;
use super::TableMetadata;

type Slot = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

/// Process- or application-wide metadata cache keyed by entity type.
#[derive(Default)]
pub struct MetadataRegistry {
    slots: RwLock<HashMap<TypeId, Slot>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata of `T`, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Returns the resolver's `FacadeError::Configuration` when `T` cannot be resolved.
    pub fn resolve<T: TableEntity>(&self) -> Result<Arc<TableMetadata<T>>, FacadeError> {
        let slot = self.slot::<T>();
        let resolved = slot.get_or_try_init(|| {
            #[cfg(feature = "tracing")]
            let _span = crate::tracing_helpers::resolve_span(std::any::type_name::<T>()).entered();

            log::trace!("Resolving table metadata for {}", std::any::type_name::<T>());
            MetadataResolver::resolve::<T>()
                .map(|metadata| Arc::new(metadata) as Arc<dyn Any + Send + Sync>)
        })?;
        Arc::clone(resolved)
            .downcast::<TableMetadata<T>>()
            .map_err(|_| {
                FacadeError::configuration(format!(
                    "Metadata slot for {} holds another type",
                    std::any::type_name::<T>()
                ))
            })
    }

    /// `true` once `T` has been resolved successfully.
    pub fn contains<T: TableEntity>(&self) -> bool {
        self.read_slots()
            .get(&TypeId::of::<T>())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Number of successfully resolved types.
    pub fn len(&self) -> usize {
        self.read_slots()
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot<T: 'static>(&self) -> Slot {
        let type_id = TypeId::of::<T>();
        if let Some(slot) = self.read_slots().get(&type_id) {
            return Arc::clone(slot);
        }
        let mut slots = self
            .slots
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(slots.entry(type_id).or_default())
    }

    // The map only ever gains entries, so a poisoned lock still holds a usable map.
    fn read_slots(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TypeId, Slot>> {
        self.slots
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("resolved", &self.len())
            .finish()
    }
}
