//! OpenShift resource kinds that `k8s-openapi` does not ship.
//!
//! Only the fields the generated templates and the transformers touch are modelled.

pub mod deployment_config;
pub mod image_stream;
pub mod route;

pub use deployment_config::{DeploymentConfig, DeploymentConfigSpec};
pub use image_stream::{ImageStream, ImageStreamSpec};
pub use route::{Route, RouteSpec};
