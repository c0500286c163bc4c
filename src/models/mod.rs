//! Domain models for swapbind.
//!
//! # Core Concepts
//!
//! ## Persistent Entities
//!
//! - [`Binding`]: A rule linking one text layer name to one instance-swap
//!   property name, scoped to a component. Bindings are created and deleted,
//!   never edited in place.
//!
//! ## Ephemeral Entities
//!
//! These are produced fresh by each refresh and never stored:
//!
//! - [`RefreshOutcome`]: The result of applying bindings to one instance.
//! - [`RefreshReport`]: The aggregate of one batch refresh.

mod binding;
mod report;

pub use binding::*;
pub use report::*;
