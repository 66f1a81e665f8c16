//! This crate contains helpers shared between the operator library and its command line
//! frontends, mostly around emitting Kubernetes objects as YAML.

pub mod crd;
pub mod yaml;
