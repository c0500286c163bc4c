//! Messages exchanged with the presentation layer.
//!
//! Both directions are JSON objects tagged by a kebab-case `type` field,
//! e.g. `{"type": "refresh-all", "componentKey": "abc"}`.

use serde::{Deserialize, Serialize};

use crate::models::{Binding, RefreshOutcome};

// ============================================================
// Requests
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    #[serde(rename_all = "camelCase")]
    CreateBinding {
        component_key: String,
        text_property: String,
        instance_property: String,
    },
    #[serde(rename_all = "camelCase")]
    RefreshAll { component_key: String },
    #[serde(rename_all = "camelCase")]
    DeleteBinding {
        component_key: String,
        text_property: String,
    },
    #[serde(rename_all = "camelCase")]
    ListBindings { component_key: String },
    Cancel,
}

// ============================================================
// Events
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    ShowComponentDashboard {
        component_key: String,
        component_name: String,
        instance_count: usize,
        text_properties: Vec<String>,
        instance_properties: Vec<String>,
        existing_bindings: Vec<Binding>,
    },
    ShowError {
        message: String,
    },
    BindingCreated {
        binding: Binding,
    },
    #[serde(rename_all = "camelCase")]
    BindingDeleted {
        text_property: String,
    },
    RefreshCompleted {
        /// Number of instances refreshed successfully.
        success: usize,
        total: usize,
        results: Vec<RefreshOutcome>,
    },
    #[serde(rename_all = "camelCase")]
    Bindings {
        component_key: String,
        bindings: Vec<Binding>,
    },
    Notify {
        message: String,
    },
    Closed,
}
