use serde::{Deserialize, Serialize};

use crate::document::{swap_property_names, ComponentDefinition, Layer, NodeKind};

/// What a component offers for binding.
///
/// Both lists are in discovery order and may contain duplicates when the
/// component repeats a layer name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindableSurface {
    pub text_properties: Vec<String>,
    pub instance_properties: Vec<String>,
}

pub fn analyze_component(definition: &ComponentDefinition) -> BindableSurface {
    let mut text_properties = Vec::new();
    for layer in &definition.layers {
        collect_text_names(layer, &mut text_properties);
    }

    BindableSurface {
        text_properties,
        instance_properties: swap_property_names(definition.property_definitions.as_ref()),
    }
}

fn collect_text_names(layer: &Layer, names: &mut Vec<String>) {
    if layer.kind == NodeKind::Text && !layer.name.is_empty() {
        names.push(layer.name.clone());
    }
    for child in &layer.children {
        collect_text_names(child, names);
    }
}
