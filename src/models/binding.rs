use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A persisted rule: whenever an instance of `component_key` carries a value
/// for `instance_property`, the text layer named `text_property` shows the
/// display name of the component that value points at.
///
/// The pair `(component_key, text_property)` identifies a binding in
/// practice, but duplicates are allowed to coexist. When they do, both
/// apply and the later one in list order wins on the shared text layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub component_key: String,
    /// Name of the text layer to overwrite.
    pub text_property: String,
    /// Name of the instance-swap property to read.
    pub instance_property: String,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl Binding {
    pub fn matches(&self, component_key: &str, text_property: &str) -> bool {
        self.component_key == component_key && self.text_property == text_property
    }
}

/// Input for creating a new binding. The timestamp is assigned on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBindingInput {
    pub component_key: String,
    pub text_property: String,
    pub instance_property: String,
}

impl CreateBindingInput {
    pub fn into_binding(self) -> Binding {
        Binding {
            component_key: self.component_key,
            text_property: self.text_property,
            instance_property: self.instance_property,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}
