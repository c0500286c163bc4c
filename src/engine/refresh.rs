use tracing::{info, warn};

use crate::db::BindingStore;
use crate::document::{ComponentRef, DocumentGraph, Notifier};
use crate::error::HostError;
use crate::models::{RefreshOutcome, RefreshReport};

use super::{BindingApplier, InstanceLocator};

pub const NO_BINDINGS_NOTICE: &str = "No bindings configured for this component";
pub const NO_INSTANCES_NOTICE: &str = "No instances found";

/// Re-applies a component's bindings to every one of its instances.
pub struct RefreshOrchestrator<'a> {
    document: &'a dyn DocumentGraph,
    notifier: &'a dyn Notifier,
}

impl<'a> RefreshOrchestrator<'a> {
    pub fn new(document: &'a dyn DocumentGraph, notifier: &'a dyn Notifier) -> Self {
        Self { document, notifier }
    }

    /// Run one batch refresh.
    ///
    /// Bindings are read once at the start. Each instance is processed to
    /// completion before the next; a failing instance is recorded in the
    /// report and the batch continues. Only a failure to enumerate the
    /// document's pages is returned as an error.
    pub async fn refresh(
        &self,
        component: &ComponentRef,
        store: &BindingStore,
    ) -> Result<RefreshReport, HostError> {
        let instances = InstanceLocator::new(self.document)
            .find_all_instances(&component.key)
            .await?;
        let bindings = store.for_component(&component.key);

        if bindings.is_empty() {
            self.notifier.notify(NO_BINDINGS_NOTICE);
            return Ok(RefreshReport::empty(instances.len()));
        }
        if instances.is_empty() {
            self.notifier.notify(NO_INSTANCES_NOTICE);
            return Ok(RefreshReport::empty(0));
        }

        let applier = BindingApplier::new(self.document);
        let mut report = RefreshReport::empty(instances.len());

        for instance in &instances {
            let outcome = match applier.apply(instance, &bindings).await {
                Ok(_) => RefreshOutcome::succeeded(instance.label()),
                Err(e) => {
                    warn!(instance = %instance.id(), error = %e, "Failed to refresh instance");
                    RefreshOutcome::failed(instance.label(), e.to_string())
                }
            };
            report.push(outcome);
        }

        info!(
            component = %component.key,
            succeeded = report.succeeded,
            total = report.total,
            "Refresh complete"
        );
        self.notifier.notify(&report.summary());
        Ok(report)
    }
}
