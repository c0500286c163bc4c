//! Request/response session with the presentation layer.

mod stdio;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

pub use stdio::*;
pub use types::*;

use crate::db::BindingStore;
use crate::document::{DocumentGraph, NodeKind, NoticeLog, Notifier};
use crate::engine::{analyze_component, InstanceLocator, RefreshOrchestrator};
use crate::models::CreateBindingInput;

pub const SELECT_COMPONENT_MESSAGE: &str = "Please select a component";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Something went wrong, see the log for details";

/// Drives one plugin session: inspects the selection at startup, then
/// answers requests until cancelled.
pub struct SessionController {
    document: Arc<dyn DocumentGraph>,
    store: BindingStore,
    notices: NoticeLog,
    closed: bool,
}

impl SessionController {
    pub fn new(document: Arc<dyn DocumentGraph>, store: BindingStore) -> Self {
        Self {
            document,
            store,
            notices: NoticeLog::new(),
            closed: false,
        }
    }

    pub fn store(&self) -> &BindingStore {
        &self.store
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The first event of a session: the component dashboard when exactly
    /// one component is selected, an error otherwise.
    pub async fn startup(&self) -> Vec<Event> {
        match self.try_startup().await {
            Ok(event) => vec![event],
            Err(e) => {
                error!("Startup failed: {:#}", e);
                vec![Event::ShowError {
                    message: UNEXPECTED_ERROR_MESSAGE.to_string(),
                }]
            }
        }
    }

    async fn try_startup(&self) -> Result<Event> {
        let selection = self
            .document
            .selection()
            .await
            .context("Failed to read selection")?;

        let [selected] = selection.as_slice() else {
            return Ok(select_component_error());
        };
        if selected.kind != NodeKind::Component {
            return Ok(select_component_error());
        }

        let Some(definition) = self
            .document
            .component_definition(&selected.id)
            .await
            .context("Failed to read component definition")?
        else {
            return Ok(select_component_error());
        };

        let surface = analyze_component(&definition);
        let instances = InstanceLocator::new(self.document.as_ref())
            .find_all_instances(&definition.component.key)
            .await
            .context("Failed to scan document for instances")?;

        info!(
            component = %definition.component.key,
            instances = instances.len(),
            "Showing component dashboard"
        );

        Ok(Event::ShowComponentDashboard {
            existing_bindings: self.store.for_component(&definition.component.key),
            component_key: definition.component.key,
            component_name: definition.component.name,
            instance_count: instances.len(),
            text_properties: surface.text_properties,
            instance_properties: surface.instance_properties,
        })
    }

    /// Parse and handle one raw request.
    pub async fn handle_line(&mut self, line: &str) -> Vec<Event> {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                warn!(error = %e, "Rejected malformed request");
                vec![Event::ShowError {
                    message: format!("Invalid request: {}", e),
                }]
            }
        }
    }

    /// Handle one request. Notices raised while handling follow the
    /// request's own events.
    pub async fn handle(&mut self, request: Request) -> Vec<Event> {
        let mut events = match self.try_handle(request).await {
            Ok(events) => events,
            Err(e) => {
                error!("Request failed: {:#}", e);
                self.notices.notify(UNEXPECTED_ERROR_MESSAGE);
                Vec::new()
            }
        };

        events.extend(
            self.notices
                .drain()
                .into_iter()
                .map(|message| Event::Notify { message }),
        );
        events
    }

    async fn try_handle(&mut self, request: Request) -> Result<Vec<Event>> {
        match request {
            Request::CreateBinding {
                component_key,
                text_property,
                instance_property,
            } => {
                let created = self
                    .store
                    .create(CreateBindingInput {
                        component_key,
                        text_property,
                        instance_property,
                    })
                    .await;
                if !created.durable {
                    self.notices
                        .notify("Binding could not be saved and will be lost when the session ends");
                }
                Ok(vec![Event::BindingCreated {
                    binding: created.value,
                }])
            }
            Request::RefreshAll { component_key } => {
                let Some(component) = self
                    .document
                    .component_by_key(&component_key)
                    .await
                    .context("Failed to resolve component")?
                else {
                    warn!(component = %component_key, "Refresh requested for a component that no longer exists");
                    return Ok(Vec::new());
                };

                let report = RefreshOrchestrator::new(self.document.as_ref(), &self.notices)
                    .refresh(&component, &self.store)
                    .await
                    .context("Refresh failed")?;

                Ok(vec![Event::RefreshCompleted {
                    success: report.succeeded,
                    total: report.total,
                    results: report.outcomes,
                }])
            }
            Request::DeleteBinding {
                component_key,
                text_property,
            } => {
                let removed = self.store.remove(&component_key, &text_property).await;
                if !removed.durable {
                    self.notices
                        .notify("Deletion could not be saved and will be undone when the session ends");
                }
                Ok(vec![Event::BindingDeleted { text_property }])
            }
            Request::ListBindings { component_key } => Ok(vec![Event::Bindings {
                bindings: self.store.for_component(&component_key),
                component_key,
            }]),
            Request::Cancel => {
                info!("Session cancelled");
                self.closed = true;
                Ok(vec![Event::Closed])
            }
        }
    }
}

fn select_component_error() -> Event {
    Event::ShowError {
        message: SELECT_COMPONENT_MESSAGE.to_string(),
    }
}
