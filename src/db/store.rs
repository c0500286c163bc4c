use std::sync::Arc;

use tracing::{debug, info, warn};

use super::KeyValueStore;
use crate::error::StoreError;
use crate::models::{Binding, CreateBindingInput};

/// Key the binding set is stored under when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "component-bindings";

/// The result of a mutation plus whether it reached durable storage.
///
/// A failed write never rolls back the in-memory change: the in-memory set
/// stays authoritative for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted<T> {
    pub value: T,
    pub durable: bool,
}

/// Registry of every [`Binding`] for the lifetime of one session.
///
/// Loaded once from a [`KeyValueStore`] and written back in full after each
/// mutation. The set is ordered by creation and may hold value-equal
/// duplicates.
pub struct BindingStore {
    backend: Arc<dyn KeyValueStore>,
    key: String,
    bindings: Vec<Binding>,
}

impl BindingStore {
    /// Read the binding set stored under `key`.
    ///
    /// An absent record is an empty set. So is a record that no longer
    /// parses; it is logged and will be overwritten by the next save.
    pub async fn load(
        backend: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let key = key.into();
        let bindings = match backend.get(&key).await? {
            None => {
                debug!(key = %key, "No stored bindings");
                Vec::new()
            }
            Some(raw) => match serde_json::from_str::<Vec<Binding>>(&raw) {
                Ok(bindings) => bindings,
                Err(e) => {
                    warn!(key = %key, error = %e, "Stored bindings are unreadable, starting empty");
                    Vec::new()
                }
            },
        };

        info!(count = bindings.len(), "Loaded bindings");
        Ok(Self {
            backend,
            key,
            bindings,
        })
    }

    /// Write the whole set under the store's key.
    pub async fn save(&self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.bindings)?;
        self.backend.set(&self.key, &encoded).await?;
        debug!(count = self.bindings.len(), "Saved bindings");
        Ok(())
    }

    async fn persist(&self) -> bool {
        match self.save().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist bindings, keeping in-memory state");
                false
            }
        }
    }

    pub async fn add(&mut self, binding: Binding) -> Persisted<()> {
        self.bindings.push(binding);
        Persisted {
            value: (),
            durable: self.persist().await,
        }
    }

    /// Create a binding stamped with the current time and append it.
    pub async fn create(&mut self, input: CreateBindingInput) -> Persisted<Binding> {
        let binding = input.into_binding();
        info!(
            component = %binding.component_key,
            text = %binding.text_property,
            property = %binding.instance_property,
            "Creating binding"
        );
        let Persisted { durable, .. } = self.add(binding.clone()).await;
        Persisted {
            value: binding,
            durable,
        }
    }

    /// Remove every binding matching both fields. Returns how many went.
    pub async fn remove(&mut self, component_key: &str, text_property: &str) -> Persisted<usize> {
        let before = self.bindings.len();
        self.bindings
            .retain(|b| !b.matches(component_key, text_property));
        let removed = before - self.bindings.len();
        info!(component = component_key, text = text_property, removed, "Removed bindings");

        Persisted {
            value: removed,
            durable: self.persist().await,
        }
    }

    pub fn all(&self) -> &[Binding] {
        &self.bindings
    }

    /// Point-in-time copy of the bindings for one component, in list order.
    pub fn for_component(&self, component_key: &str) -> Vec<Binding> {
        self.bindings
            .iter()
            .filter(|b| b.component_key == component_key)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
