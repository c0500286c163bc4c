use tracing::debug;

use crate::document::{resolve_property, DocumentGraph, NodeKind, PropertyResolution};
use crate::error::{ApplyError, HostError};
use crate::models::Binding;

use super::Instance;

/// Applies bindings to a single instance.
///
/// A binding whose data is missing on the instance is skipped: no swap
/// value, a value that is not a component reference, a reference to
/// nothing, or no text layer with the bound name. Once a binding does
/// apply, any host failure aborts the instance with an [`ApplyError`].
pub struct BindingApplier<'a> {
    document: &'a dyn DocumentGraph,
}

impl<'a> BindingApplier<'a> {
    pub fn new(document: &'a dyn DocumentGraph) -> Self {
        Self { document }
    }

    /// Apply `bindings` in list order. Returns how many bindings wrote text.
    pub async fn apply(&self, instance: &Instance, bindings: &[Binding]) -> Result<usize, ApplyError> {
        let mut written = 0;
        for binding in bindings {
            if self.apply_one(instance, binding).await? {
                written += 1;
            }
        }
        Ok(written)
    }

    async fn apply_one(&self, instance: &Instance, binding: &Binding) -> Result<bool, ApplyError> {
        let fail = |e: HostError| ApplyError::new(&binding.text_property, e);

        let properties = self
            .document
            .component_properties(instance.id())
            .await
            .map_err(fail)?;

        let target_id = match resolve_property(properties.as_ref(), &binding.instance_property) {
            PropertyResolution::ResolvedReference(id) => id,
            PropertyResolution::NoValue | PropertyResolution::WrongShape => {
                debug!(
                    instance = %instance.id(),
                    property = %binding.instance_property,
                    "No swap value, skipping binding"
                );
                return Ok(false);
            }
        };

        let target = match self.document.node(&target_id).await.map_err(fail)? {
            Some(node) if node.kind == NodeKind::Component => node,
            _ => {
                debug!(instance = %instance.id(), target = %target_id, "Swap target does not resolve to a component");
                return Ok(false);
            }
        };

        let Some(text) = self
            .document
            .find_text_layer(instance.id(), &binding.text_property)
            .await
            .map_err(fail)?
        else {
            debug!(instance = %instance.id(), text = %binding.text_property, "No matching text layer");
            return Ok(false);
        };

        self.document.load_fonts(&text).await.map_err(fail)?;
        self.document
            .set_characters(&text, &target.name)
            .await
            .map_err(fail)?;

        debug!(instance = %instance.id(), text = %text, value = %target.name, "Applied binding");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, NodeId};
    use crate::engine::InstanceLocator;
    use serde_json::json;

    fn binding(text: &str, property: &str) -> Binding {
        Binding {
            component_key: "card".to_string(),
            text_property: text.to_string(),
            instance_property: property.to_string(),
            timestamp: 0,
        }
    }

    fn document(instance_props: serde_json::Value, label_extra: serde_json::Value) -> MemoryDocument {
        let mut label = json!({ "id": "2:2", "name": "Label", "type": "TEXT", "characters": "old" });
        if let (Some(label), Some(extra)) = (label.as_object_mut(), label_extra.as_object()) {
            for (k, v) in extra {
                label.insert(k.clone(), v.clone());
            }
        }

        let snapshot = json!({
            "pages": [{ "id": "0:1", "children": [
                { "id": "1:1", "name": "Card", "type": "COMPONENT", "key": "card" },
                { "id": "5:1", "name": "Star", "type": "COMPONENT" },
                { "id": "5:2", "name": "Heart", "type": "COMPONENT" },
                { "id": "6:1", "name": "Not a component", "type": "FRAME" },
                { "id": "2:1", "name": "Card", "type": "INSTANCE", "mainComponent": "1:1",
                  "componentProperties": instance_props,
                  "children": [ label, { "id": "2:3", "name": "Title", "type": "TEXT", "characters": "t" } ] }
            ] }]
        });
        MemoryDocument::from_json(&snapshot.to_string()).unwrap()
    }

    async fn instance(doc: &MemoryDocument) -> Instance {
        InstanceLocator::new(doc)
            .find_all_instances("card")
            .await
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn writes_swap_target_name_into_text_layer() {
        let doc = document(
            json!({ "Icon": { "type": "INSTANCE_SWAP", "value": "5:1" } }),
            json!({}),
        );
        let inst = instance(&doc).await;

        let written = BindingApplier::new(&doc)
            .apply(&inst, &[binding("Label", "Icon")])
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(doc.characters(&NodeId::from("2:2")).as_deref(), Some("Star"));
    }

    #[tokio::test]
    async fn inapplicable_bindings_are_skipped_without_mutation() {
        let doc = document(
            json!({
                "Icon": { "type": "INSTANCE_SWAP", "value": "6:1" },
                "Flag": { "type": "BOOLEAN", "value": true },
                "Dangling": { "type": "INSTANCE_SWAP", "value": "9:9" }
            }),
            json!({}),
        );
        let inst = instance(&doc).await;

        let written = BindingApplier::new(&doc)
            .apply(
                &inst,
                &[
                    binding("Label", "Missing"),
                    binding("Label", "Flag"),
                    binding("Label", "Icon"),
                    binding("Label", "Dangling"),
                    binding("Nope", "Icon"),
                ],
            )
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(doc.characters(&NodeId::from("2:2")).as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn later_duplicate_binding_wins() {
        let doc = document(
            json!({
                "Icon": { "type": "INSTANCE_SWAP", "value": "5:1" },
                "Alt": { "type": "INSTANCE_SWAP", "value": "5:2" }
            }),
            json!({}),
        );
        let inst = instance(&doc).await;

        BindingApplier::new(&doc)
            .apply(&inst, &[binding("Label", "Icon"), binding("Label", "Alt")])
            .await
            .unwrap();

        assert_eq!(doc.characters(&NodeId::from("2:2")).as_deref(), Some("Heart"));
    }

    #[tokio::test]
    async fn write_failure_aborts_remaining_bindings() {
        let doc = document(
            json!({ "Icon": { "type": "INSTANCE_SWAP", "value": "5:1" } }),
            json!({ "locked": true }),
        );
        let inst = instance(&doc).await;

        let err = BindingApplier::new(&doc)
            .apply(&inst, &[binding("Label", "Icon"), binding("Title", "Icon")])
            .await
            .unwrap_err();

        assert_eq!(err.text_property, "Label");
        assert!(err.message.contains("locked"));
        assert_eq!(doc.characters(&NodeId::from("2:3")).as_deref(), Some("t"));
    }

    #[tokio::test]
    async fn font_failure_is_an_apply_error() {
        let doc = document(
            json!({ "Icon": { "type": "INSTANCE_SWAP", "value": "5:1" } }),
            json!({ "fontMissing": true }),
        );
        let inst = instance(&doc).await;

        let err = BindingApplier::new(&doc)
            .apply(&inst, &[binding("Label", "Icon")])
            .await
            .unwrap_err();

        assert!(err.message.contains("font"));
        assert_eq!(doc.characters(&NodeId::from("2:2")).as_deref(), Some("old"));
    }
}
