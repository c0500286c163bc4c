//! Keep component text layers in sync with instance-swap properties.
//!
//! A [`Binding`](models::Binding) says "the text layer named X shows the
//! name of whatever component property Y swaps in". Bindings are stored per
//! component and re-applied to every instance of that component by a batch
//! refresh.

pub mod config;
pub mod db;
pub mod document;
pub mod engine;
pub mod error;
pub mod models;
pub mod session;
