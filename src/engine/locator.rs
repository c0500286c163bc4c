use tracing::{debug, warn};

use crate::document::{ComponentRef, DocumentGraph, NodeId, NodeSummary};
use crate::error::HostError;

/// A live instance whose main component has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub node: NodeSummary,
    pub component: ComponentRef,
}

impl Instance {
    pub fn id(&self) -> &NodeId {
        &self.node.id
    }

    pub fn label(&self) -> String {
        self.node.label()
    }
}

/// Full-document scan for instances of one component.
///
/// There is no index: every page is loaded and every instance's main
/// component resolved. Instances that cannot be resolved are logged and
/// left out; they never fail the scan.
pub struct InstanceLocator<'a> {
    document: &'a dyn DocumentGraph,
}

impl<'a> InstanceLocator<'a> {
    pub fn new(document: &'a dyn DocumentGraph) -> Self {
        Self { document }
    }

    /// Every instance of the component keyed `component_key`, in page order
    /// and then tree order within a page.
    ///
    /// Only a failure to enumerate pages is returned as an error.
    pub async fn find_all_instances(&self, component_key: &str) -> Result<Vec<Instance>, HostError> {
        let mut found = Vec::new();

        for page in self.document.pages().await? {
            if let Err(e) = self.document.load_page(&page.id).await {
                warn!(page = %page.id, error = %e, "Skipping page that failed to load");
                continue;
            }

            let candidates = match self.document.instances_in(&page.id).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(page = %page.id, error = %e, "Skipping page whose instances could not be listed");
                    continue;
                }
            };

            for node in candidates {
                match self.document.main_component(&node.id).await {
                    Ok(Some(component)) if component.key == component_key => {
                        found.push(Instance { node, component });
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        debug!(instance = %node.id, "Skipping detached instance");
                    }
                    Err(e) => {
                        warn!(instance = %node.id, error = %e, "Excluding instance with unresolvable component");
                    }
                }
            }
        }

        debug!(component = component_key, count = found.len(), "Located instances");
        Ok(found)
    }
}
