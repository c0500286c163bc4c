//! Typed views over the host's loosely shaped property maps.
//!
//! Hosts hand back property values and definitions as untyped JSON. Shape
//! checks happen here, once, so the engine can match on
//! [`PropertyResolution`] instead of inspecting raw values.

use serde_json::Value;

use super::NodeId;

/// The host's tag for a property that swaps in another component.
pub const INSTANCE_SWAP: &str = "INSTANCE_SWAP";

/// What an instance currently holds for a named property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyResolution {
    /// No value is set for the property on this instance.
    NoValue,
    /// A value exists but is not a swap reference to a node.
    WrongShape,
    /// The property points at the node with this id.
    ResolvedReference(NodeId),
}

/// Resolve `name` in an instance's raw property map.
///
/// Host maps look like `{"Icon": {"type": "INSTANCE_SWAP", "value": "12:4"}}`.
pub fn resolve_property(properties: Option<&Value>, name: &str) -> PropertyResolution {
    let Some(entry) = properties.and_then(|p| p.get(name)) else {
        return PropertyResolution::NoValue;
    };

    let Some(entry) = entry.as_object() else {
        return PropertyResolution::WrongShape;
    };

    match entry.get("value") {
        None | Some(Value::Null) => return PropertyResolution::NoValue,
        Some(_) => {}
    }

    if entry.get("type").and_then(Value::as_str) != Some(INSTANCE_SWAP) {
        return PropertyResolution::WrongShape;
    }

    match entry.get("value").and_then(Value::as_str) {
        Some(id) if !id.trim().is_empty() => PropertyResolution::ResolvedReference(NodeId::new(id)),
        _ => PropertyResolution::WrongShape,
    }
}

/// Names of every declared instance-swap property, in map order.
///
/// A missing or malformed definition map yields no names.
pub fn swap_property_names(definitions: Option<&Value>) -> Vec<String> {
    let Some(map) = definitions.and_then(Value::as_object) else {
        return Vec::new();
    };

    map.iter()
        .filter(|(_, def)| def.get("type").and_then(Value::as_str) == Some(INSTANCE_SWAP))
        .map(|(name, _)| name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_swap_reference() {
        let props = json!({ "Icon": { "type": "INSTANCE_SWAP", "value": "5:1" } });
        assert_eq!(
            resolve_property(Some(&props), "Icon"),
            PropertyResolution::ResolvedReference(NodeId::from("5:1"))
        );
    }

    #[test]
    fn missing_map_or_entry_is_no_value() {
        let props = json!({ "Other": { "type": "INSTANCE_SWAP", "value": "5:1" } });
        assert_eq!(resolve_property(None, "Icon"), PropertyResolution::NoValue);
        assert_eq!(resolve_property(Some(&props), "Icon"), PropertyResolution::NoValue);

        let unset = json!({ "Icon": { "type": "INSTANCE_SWAP", "value": null } });
        assert_eq!(resolve_property(Some(&unset), "Icon"), PropertyResolution::NoValue);
    }

    #[test]
    fn non_reference_values_are_wrong_shape() {
        let props = json!({
            "Visible": { "type": "BOOLEAN", "value": true },
            "Title": { "type": "TEXT", "value": "Hello" },
            "Numeric": { "type": "INSTANCE_SWAP", "value": 42 },
            "Bare": "5:1",
        });

        for name in ["Visible", "Title", "Numeric", "Bare"] {
            assert_eq!(
                resolve_property(Some(&props), name),
                PropertyResolution::WrongShape,
                "{name}"
            );
        }
    }

    #[test]
    fn swap_names_keep_declaration_order() {
        let defs: Value = serde_json::from_str(
            r#"{
                "Zeta": { "type": "INSTANCE_SWAP" },
                "Middle": { "type": "TEXT" },
                "Alpha": { "type": "INSTANCE_SWAP" }
            }"#,
        )
        .unwrap();
        assert_eq!(swap_property_names(Some(&defs)), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn swap_names_tolerate_malformed_definitions() {
        assert!(swap_property_names(None).is_empty());
        assert!(swap_property_names(Some(&json!("nonsense"))).is_empty());
        assert!(swap_property_names(Some(&json!([1, 2]))).is_empty());

        let defs = json!({
            "Icon": { "type": "INSTANCE_SWAP", "defaultValue": "5:1" },
            "Label": { "type": "TEXT", "defaultValue": "Hi" },
            "Badge": { "type": "INSTANCE_SWAP" },
            "Broken": 7,
        });
        assert_eq!(swap_property_names(Some(&defs)), vec!["Icon", "Badge"]);
    }
}
