//! Standalone gateways declared through the `APIcast` custom resource.
pub mod controller;
pub mod crd;
pub mod desired;
pub mod reconciler;

pub use crd::{APIcast, APIcastSpec};
pub use reconciler::{ReconcileAction, reconcile_apicast};
