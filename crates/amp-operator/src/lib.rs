//! Templates and an operator for deploying the 3scale API management platform.
//!
//! The [`template`] module assembles the component catalog in [`component`] into OpenShift
//! templates, [`transform`] derives the evaluation, productized, HA and S3 variants from it and
//! [`apicast`] runs standalone gateways from a custom resource.

pub mod apicast;
pub mod builder;
pub mod cli;
pub mod client;
pub mod component;
pub mod labels;
pub mod logging;
pub mod object;
pub mod openshift;
pub mod options;
pub mod reconcile;
pub mod template;
pub mod transform;

// External re-exports
pub use k8s_openapi;
pub use kube;
// Internal re-exports
pub use amp_shared as shared;
pub use amp_shared::crd::CustomResourceExt;
