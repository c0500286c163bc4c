//! The binding engine.
//!
//! - [`analyze_component`] discovers what can be bound on a component.
//! - [`InstanceLocator`] finds every live instance of a component.
//! - [`BindingApplier`] applies a component's bindings to one instance.
//! - [`RefreshOrchestrator`] drives the applier over every instance and
//!   aggregates a [`RefreshReport`](crate::models::RefreshReport).
//!
//! Everything runs sequentially on one task: one instance, including all of
//! its bindings and font loads, completes before the next begins.

mod analyzer;
mod applier;
mod locator;
mod refresh;

pub use analyzer::*;
pub use applier::*;
pub use locator::*;
pub use refresh::*;
