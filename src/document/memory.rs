//! A [`DocumentGraph`] backed by a JSON document snapshot.
//!
//! # Snapshot Format
//!
//! ```json
//! {
//!   "pages": [
//!     {
//!       "id": "0:1", "name": "Page 1", "loaded": true,
//!       "children": [
//!         { "id": "1:1", "name": "Button", "type": "COMPONENT", "key": "btn",
//!           "componentPropertyDefinitions": { "Icon": { "type": "INSTANCE_SWAP" } },
//!           "children": [ { "id": "1:2", "name": "Label", "type": "TEXT", "characters": "" } ] },
//!         { "id": "2:1", "name": "Button", "type": "INSTANCE", "mainComponent": "1:1",
//!           "componentProperties": { "Icon": { "type": "INSTANCE_SWAP", "value": "3:1" } },
//!           "children": [ { "id": "2:2", "name": "Label", "type": "TEXT", "characters": "" } ] }
//!       ]
//!     }
//!   ],
//!   "selection": ["1:1"]
//! }
//! ```
//!
//! Pages with `"loaded": false` must be loaded through
//! [`DocumentGraph::load_page`] before their nodes can be listed. Pages may
//! carry `"loadFails": true` or `"listFails": true`, and text layers
//! `"locked": true` or `"fontMissing": true`, to make the host fail.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{
    ComponentDefinition, ComponentRef, DocumentGraph, Layer, NodeId, NodeKind, NodeSummary,
};
use crate::error::HostError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub pages: Vec<PageSnapshot>,
    #[serde(default)]
    pub selection: Vec<NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_loaded")]
    pub loaded: bool,
    /// Loading this page fails.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub load_fails: bool,
    /// Listing this page's instances fails.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub list_fails: bool,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

fn default_loaded() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub id: NodeId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Component key. Defaults to the node id when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub font_missing: bool,
    /// Id of the component an instance was placed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_component: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_properties: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_property_definitions: Option<serde_json::Value>,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
        }
    }

    fn component_ref(&self) -> ComponentRef {
        ComponentRef {
            id: self.id.clone(),
            key: self.key.clone().unwrap_or_else(|| self.id.to_string()),
            name: self.name.clone(),
        }
    }

    fn layer(&self) -> Layer {
        Layer {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            children: self.children.iter().map(NodeSnapshot::layer).collect(),
        }
    }

    fn find(&self, id: &NodeId) -> Option<&NodeSnapshot> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: &NodeId) -> Option<&mut NodeSnapshot> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a NodeSnapshot)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[derive(Debug)]
struct State {
    snapshot: DocumentSnapshot,
    loaded: HashSet<NodeId>,
}

impl State {
    fn nodes(&self) -> impl Iterator<Item = &NodeSnapshot> {
        self.snapshot.pages.iter().flat_map(|p| p.children.iter())
    }

    fn find(&self, id: &NodeId) -> Option<&NodeSnapshot> {
        self.nodes().find_map(|n| n.find(id))
    }

    fn find_mut(&mut self, id: &NodeId) -> Option<&mut NodeSnapshot> {
        self.snapshot
            .pages
            .iter_mut()
            .flat_map(|p| p.children.iter_mut())
            .find_map(|n| n.find_mut(id))
    }

    fn page(&self, id: &NodeId) -> Result<&PageSnapshot, HostError> {
        self.snapshot
            .pages
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| HostError::NodeNotFound(id.clone()))
    }
}

/// In-memory document. Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    state: Arc<Mutex<State>>,
}

impl MemoryDocument {
    pub fn new(snapshot: DocumentSnapshot) -> Self {
        let loaded = snapshot
            .pages
            .iter()
            .filter(|p| p.loaded)
            .map(|p| p.id.clone())
            .collect();
        Self {
            state: Arc::new(Mutex::new(State { snapshot, loaded })),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, HostError> {
        let snapshot =
            serde_json::from_str(json).map_err(|e| HostError::Snapshot(e.to_string()))?;
        Ok(Self::new(snapshot))
    }

    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse document {}", path.display()))
    }

    /// Write the current state back out, including text edits.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.snapshot())
            .context("Failed to serialize document")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write document {}", path.display()))?;
        Ok(())
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        let state = self.state.lock().expect("document lock poisoned");
        let mut snapshot = state.snapshot.clone();
        for page in &mut snapshot.pages {
            page.loaded = state.loaded.contains(&page.id);
        }
        snapshot
    }

    /// Current characters of a text layer.
    pub fn characters(&self, id: &NodeId) -> Option<String> {
        let state = self.state.lock().expect("document lock poisoned");
        state.find(id).and_then(|n| n.characters.clone())
    }

    pub fn is_loaded(&self, page: &NodeId) -> bool {
        let state = self.state.lock().expect("document lock poisoned");
        state.loaded.contains(page)
    }

    pub fn set_selection(&self, selection: Vec<NodeId>) {
        let mut state = self.state.lock().expect("document lock poisoned");
        state.snapshot.selection = selection;
    }

    /// Delete a node and its subtree. Instances of a removed component keep
    /// their dangling `mainComponent` reference.
    pub fn remove_node(&self, id: &NodeId) -> bool {
        fn prune(nodes: &mut Vec<NodeSnapshot>, id: &NodeId) -> bool {
            let before = nodes.len();
            nodes.retain(|n| &n.id != id);
            if nodes.len() != before {
                return true;
            }
            nodes.iter_mut().any(|n| prune(&mut n.children, id))
        }

        let mut state = self.state.lock().expect("document lock poisoned");
        state
            .snapshot
            .pages
            .iter_mut()
            .any(|p| prune(&mut p.children, id))
    }
}

#[async_trait]
impl DocumentGraph for MemoryDocument {
    async fn pages(&self) -> Result<Vec<NodeSummary>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        Ok(state
            .snapshot
            .pages
            .iter()
            .map(|p| NodeSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                kind: NodeKind::Page,
            })
            .collect())
    }

    async fn load_page(&self, page: &NodeId) -> Result<(), HostError> {
        let mut state = self.state.lock().expect("document lock poisoned");
        if state.page(page)?.load_fails {
            return Err(HostError::PageLoad {
                page: page.clone(),
                reason: "page could not be materialized".to_string(),
            });
        }
        state.loaded.insert(page.clone());
        Ok(())
    }

    async fn instances_in(&self, page: &NodeId) -> Result<Vec<NodeSummary>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        if !state.loaded.contains(page) {
            return Err(HostError::PageLoad {
                page: page.clone(),
                reason: "page is not loaded".to_string(),
            });
        }

        let page_snapshot = state.page(page)?;
        if page_snapshot.list_fails {
            return Err(HostError::PageLoad {
                page: page.clone(),
                reason: "page contents are unavailable".to_string(),
            });
        }

        let mut instances = Vec::new();
        for node in &page_snapshot.children {
            node.walk(&mut |n| {
                if n.kind == NodeKind::Instance {
                    instances.push(n.summary());
                }
            });
        }
        Ok(instances)
    }

    async fn main_component(&self, instance: &NodeId) -> Result<Option<ComponentRef>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        let node = state
            .find(instance)
            .ok_or_else(|| HostError::NodeNotFound(instance.clone()))?;

        let Some(main_id) = &node.main_component else {
            return Ok(None);
        };

        match state.find(main_id) {
            Some(main) if main.kind == NodeKind::Component => Ok(Some(main.component_ref())),
            Some(_) => Err(HostError::ComponentUnresolvable {
                instance: instance.clone(),
                reason: format!("{} is not a component", main_id),
            }),
            None => Err(HostError::ComponentUnresolvable {
                instance: instance.clone(),
                reason: format!("component {} was deleted", main_id),
            }),
        }
    }

    async fn component_properties(
        &self,
        instance: &NodeId,
    ) -> Result<Option<serde_json::Value>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        let node = state
            .find(instance)
            .ok_or_else(|| HostError::NodeNotFound(instance.clone()))?;
        Ok(node.component_properties.clone())
    }

    async fn node(&self, id: &NodeId) -> Result<Option<NodeSummary>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        Ok(state.find(id).map(NodeSnapshot::summary))
    }

    async fn find_text_layer(
        &self,
        root: &NodeId,
        name: &str,
    ) -> Result<Option<NodeId>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        let root = state
            .find(root)
            .ok_or_else(|| HostError::NodeNotFound(root.clone()))?;

        let mut found = None;
        for child in &root.children {
            child.walk(&mut |n| {
                if found.is_none() && n.kind == NodeKind::Text && n.name == name {
                    found = Some(n.id.clone());
                }
            });
        }
        Ok(found)
    }

    async fn load_fonts(&self, text: &NodeId) -> Result<(), HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        let node = state
            .find(text)
            .ok_or_else(|| HostError::NodeNotFound(text.clone()))?;
        if node.font_missing {
            return Err(HostError::FontLoad {
                node: text.clone(),
                reason: "font is not available".to_string(),
            });
        }
        Ok(())
    }

    async fn set_characters(&self, text: &NodeId, characters: &str) -> Result<(), HostError> {
        let mut state = self.state.lock().expect("document lock poisoned");
        let node = state
            .find_mut(text)
            .ok_or_else(|| HostError::NodeNotFound(text.clone()))?;

        if node.kind != NodeKind::Text {
            return Err(HostError::TextWrite {
                node: text.clone(),
                reason: format!("{} node has no characters", node.kind.as_str()),
            });
        }
        if node.locked {
            return Err(HostError::TextWrite {
                node: text.clone(),
                reason: "node is locked".to_string(),
            });
        }

        node.characters = Some(characters.to_string());
        Ok(())
    }

    async fn component_definition(
        &self,
        component: &NodeId,
    ) -> Result<Option<ComponentDefinition>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        Ok(state
            .find(component)
            .filter(|n| n.kind == NodeKind::Component)
            .map(|n| ComponentDefinition {
                component: n.component_ref(),
                property_definitions: n.component_property_definitions.clone(),
                layers: n.children.iter().map(NodeSnapshot::layer).collect(),
            }))
    }

    async fn component_by_key(&self, key: &str) -> Result<Option<ComponentRef>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        let mut found = None;
        for node in state.nodes() {
            node.walk(&mut |n| {
                if found.is_none() && n.kind == NodeKind::Component {
                    let component = n.component_ref();
                    if component.key == key {
                        found = Some(component);
                    }
                }
            });
        }
        Ok(found)
    }

    async fn selection(&self) -> Result<Vec<NodeSummary>, HostError> {
        let state = self.state.lock().expect("document lock poisoned");
        Ok(state
            .snapshot
            .selection
            .iter()
            .filter_map(|id| state.find(id).map(NodeSnapshot::summary))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> MemoryDocument {
        let snapshot = json!({
            "pages": [
                {
                    "id": "0:1", "name": "Cover",
                    "children": [
                        { "id": "1:1", "name": "Tag", "type": "COMPONENT", "key": "tag",
                          "children": [ { "id": "1:2", "name": "Label", "type": "TEXT" } ] }
                    ]
                },
                {
                    "id": "0:2", "name": "Screens", "loaded": false,
                    "children": [
                        { "id": "2:1", "name": "Frame", "type": "FRAME", "children": [
                            { "id": "2:2", "name": "Tag", "type": "INSTANCE", "mainComponent": "1:1",
                              "children": [
                                { "id": "2:3", "name": "Label", "type": "TEXT", "characters": "old" },
                                { "id": "2:4", "name": "Label", "type": "TEXT", "characters": "second" }
                              ] }
                        ] }
                    ]
                }
            ],
            "selection": ["1:1", "9:9"]
        });
        MemoryDocument::from_json(&snapshot.to_string()).unwrap()
    }

    #[tokio::test]
    async fn unloaded_pages_must_be_loaded_first() {
        let doc = document();
        let page = NodeId::from("0:2");

        assert!(!doc.is_loaded(&page));
        assert!(doc.instances_in(&page).await.is_err());

        doc.load_page(&page).await.unwrap();
        let instances = doc.instances_in(&page).await.unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, NodeId::from("2:2"));
    }

    #[tokio::test]
    async fn component_key_defaults_and_lookup() {
        let doc = document();
        let main = doc.main_component(&NodeId::from("2:2")).await.unwrap().unwrap();
        assert_eq!(main.key, "tag");
        assert_eq!(doc.component_by_key("tag").await.unwrap(), Some(main));
        assert_eq!(doc.component_by_key("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleted_component_is_unresolvable() {
        let doc = document();
        assert!(doc.remove_node(&NodeId::from("1:1")));

        let result = doc.main_component(&NodeId::from("2:2")).await;
        assert!(matches!(result, Err(HostError::ComponentUnresolvable { .. })));
    }

    #[tokio::test]
    async fn text_lookup_returns_first_match_and_writes() {
        let doc = document();
        let text = doc
            .find_text_layer(&NodeId::from("2:2"), "Label")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(text, NodeId::from("2:3"));

        doc.set_characters(&text, "new").await.unwrap();
        assert_eq!(doc.characters(&text).as_deref(), Some("new"));
        assert_eq!(doc.characters(&NodeId::from("2:4")).as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn selection_skips_missing_nodes() {
        let doc = document();
        let selection = doc.selection().await.unwrap();
        assert_eq!(selection.len(), 1);
        assert_eq!(selection[0].kind, NodeKind::Component);
    }

    #[test]
    fn snapshot_round_trips_through_a_file() {
        let doc = document();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        doc.save(&path).unwrap();
        let reopened = MemoryDocument::open(&path).unwrap();
        assert_eq!(
            reopened.characters(&NodeId::from("2:3")).as_deref(),
            Some("old")
        );
        assert!(!reopened.is_loaded(&NodeId::from("0:2")));
    }
}
