//! Builders for the Kubernetes object fragments every component assembles.

pub mod meta;
pub mod pod;
