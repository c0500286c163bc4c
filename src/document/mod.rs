//! The host document graph, seen through the narrow interface the binding
//! engine consumes.
//!
//! The real host (a design tool's plugin API) is an external collaborator.
//! [`DocumentGraph`] names exactly the queries and mutations the engine
//! needs, so the engine can be driven by [`MemoryDocument`] in tests and by
//! the CLI against a document snapshot.
//!
//! Traversal is explicit: [`DocumentGraph::pages`] enumerates page handles,
//! and [`DocumentGraph::load_page`] materializes a page before its nodes can
//! be queried.

mod memory;
mod property;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;

pub use memory::*;
pub use property::*;

/// Host-assigned node identifier, e.g. `"12:34"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The node kinds the engine distinguishes. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Page,
    Frame,
    Component,
    Instance,
    Text,
    #[serde(other)]
    Other,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "PAGE",
            Self::Frame => "FRAME",
            Self::Component => "COMPONENT",
            Self::Instance => "INSTANCE",
            Self::Text => "TEXT",
            Self::Other => "OTHER",
        }
    }
}

/// Identity and name of any node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

impl NodeSummary {
    /// The display name, falling back to the node id when unnamed.
    pub fn label(&self) -> String {
        if self.name.trim().is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// A resolved component.
///
/// Two components are the same for binding purposes iff their keys are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    pub id: NodeId,
    pub key: String,
    pub name: String,
}

/// One layer of a component definition's subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub children: Vec<Layer>,
}

/// A component definition as needed to discover its bindable surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinition {
    pub component: ComponentRef,
    /// The host's raw property-definition map. May be missing or malformed.
    pub property_definitions: Option<serde_json::Value>,
    pub layers: Vec<Layer>,
}

/// Queries and mutations the engine performs against the host document.
#[async_trait]
pub trait DocumentGraph: Send + Sync {
    /// Enumerate every page in document order, loaded or not.
    async fn pages(&self) -> Result<Vec<NodeSummary>, HostError>;

    /// Materialize a page so its nodes can be queried.
    async fn load_page(&self, page: &NodeId) -> Result<(), HostError>;

    /// Every instance node anywhere under a loaded page, in tree order.
    async fn instances_in(&self, page: &NodeId) -> Result<Vec<NodeSummary>, HostError>;

    /// Resolve the component an instance was placed from. `Ok(None)` means
    /// the instance is detached.
    async fn main_component(&self, instance: &NodeId) -> Result<Option<ComponentRef>, HostError>;

    /// The instance's raw property-value map.
    async fn component_properties(
        &self,
        instance: &NodeId,
    ) -> Result<Option<serde_json::Value>, HostError>;

    async fn node(&self, id: &NodeId) -> Result<Option<NodeSummary>, HostError>;

    /// First text layer named `name` in the subtree below `root`.
    async fn find_text_layer(&self, root: &NodeId, name: &str)
        -> Result<Option<NodeId>, HostError>;

    /// Make the fonts used by a text layer available for editing.
    async fn load_fonts(&self, text: &NodeId) -> Result<(), HostError>;

    async fn set_characters(&self, text: &NodeId, characters: &str) -> Result<(), HostError>;

    async fn component_definition(
        &self,
        component: &NodeId,
    ) -> Result<Option<ComponentDefinition>, HostError>;

    async fn component_by_key(&self, key: &str) -> Result<Option<ComponentRef>, HostError>;

    async fn selection(&self) -> Result<Vec<NodeSummary>, HostError>;
}

/// Surface for short user-visible notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// A [`Notifier`] that keeps every notice in order.
#[derive(Debug, Default)]
pub struct NoticeLog {
    messages: std::sync::Mutex<Vec<String>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("notice lock poisoned").clone()
    }

    /// Remove and return all notices recorded so far.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().expect("notice lock poisoned"))
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, message: &str) {
        tracing::info!(notice = message);
        self.messages
            .lock()
            .expect("notice lock poisoned")
            .push(message.to_string());
    }
}
