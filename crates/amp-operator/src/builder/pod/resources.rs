use std::collections::BTreeMap;

use k8s_openapi::{
    api::core::v1::ResourceRequirements, apimachinery::pkg::api::resource::Quantity,
};

pub const CPU: &str = "cpu";
pub const MEMORY: &str = "memory";

/// A builder to build [`ResourceRequirements`] objects from literal quantities.
#[derive(Clone, Debug, Default)]
pub struct ResourceRequirementsBuilder {
    requests: BTreeMap<String, Quantity>,
    limits: BTreeMap<String, Quantity>,
}

impl ResourceRequirementsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cpu_request(mut self, request: impl Into<String>) -> Self {
        self.requests.insert(CPU.to_owned(), Quantity(request.into()));
        self
    }

    pub fn with_cpu_limit(mut self, limit: impl Into<String>) -> Self {
        self.limits.insert(CPU.to_owned(), Quantity(limit.into()));
        self
    }

    pub fn with_memory_request(mut self, request: impl Into<String>) -> Self {
        self.requests
            .insert(MEMORY.to_owned(), Quantity(request.into()));
        self
    }

    pub fn with_memory_limit(mut self, limit: impl Into<String>) -> Self {
        self.limits.insert(MEMORY.to_owned(), Quantity(limit.into()));
        self
    }

    pub fn build(self) -> ResourceRequirements {
        ResourceRequirements {
            requests: (!self.requests.is_empty()).then_some(self.requests),
            limits: (!self.limits.is_empty()).then_some(self.limits),
            ..ResourceRequirements::default()
        }
    }
}
