use serde::{Deserialize, Serialize};

/// The result of applying a component's bindings to one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    /// The instance's display name, or its node id when unnamed.
    pub instance_label: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl RefreshOutcome {
    pub fn succeeded(instance_label: impl Into<String>) -> Self {
        Self {
            instance_label: instance_label.into(),
            success: true,
            error_detail: None,
        }
    }

    pub fn failed(instance_label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            instance_label: instance_label.into(),
            success: false,
            error_detail: Some(detail.into()),
        }
    }
}

/// Aggregate result of one batch refresh.
///
/// `succeeded` always equals the number of successful entries in
/// `outcomes`; `total` is the number of instances located, which can exceed
/// `outcomes.len()` when the refresh short-circuits for lack of bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub succeeded: usize,
    pub total: usize,
    pub outcomes: Vec<RefreshOutcome>,
}

impl RefreshReport {
    pub fn empty(total: usize) -> Self {
        Self {
            succeeded: 0,
            total,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: RefreshOutcome) {
        if outcome.success {
            self.succeeded += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn failures(&self) -> impl Iterator<Item = &RefreshOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// One-line summary suitable for a user notice.
    pub fn summary(&self) -> String {
        let failed = self.failures().count();
        if failed == 0 {
            format!("Updated {} of {} instances", self.succeeded, self.total)
        } else {
            format!(
                "Updated {} of {} instances ({} failed)",
                self.succeeded, self.total, failed
            )
        }
    }
}
