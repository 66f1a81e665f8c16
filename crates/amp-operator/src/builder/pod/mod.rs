use k8s_openapi::{
    api::core::v1::{Container, PodSpec, PodTemplateSpec, Volume},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};

use crate::labels::Labels;

pub mod container;
pub mod env;
pub mod probe;
pub mod resources;
pub mod volume;

/// A builder to build [`PodTemplateSpec`] objects, the pod half of every workload.
#[derive(Clone, Debug, Default)]
pub struct PodTemplateBuilder {
    labels: Labels,
    containers: Vec<Container>,
    volumes: Vec<Volume>,
    service_account_name: Option<String>,
    termination_grace_period_seconds: Option<i64>,
}

impl PodTemplateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&mut self, labels: Labels) -> &mut Self {
        self.labels = labels;
        self
    }

    pub fn add_container(&mut self, container: Container) -> &mut Self {
        self.containers.push(container);
        self
    }

    pub fn add_volume(&mut self, volume: Volume) -> &mut Self {
        self.volumes.push(volume);
        self
    }

    pub fn service_account_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.service_account_name = Some(name.into());
        self
    }

    pub fn termination_grace_period_seconds(&mut self, seconds: i64) -> &mut Self {
        self.termination_grace_period_seconds = Some(seconds);
        self
    }

    pub fn build(&self) -> PodTemplateSpec {
        PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(self.labels.clone()),
                ..ObjectMeta::default()
            }),
            spec: Some(PodSpec {
                containers: self.containers.clone(),
                volumes: (!self.volumes.is_empty()).then(|| self.volumes.clone()),
                service_account_name: self.service_account_name.clone(),
                termination_grace_period_seconds: self.termination_grace_period_seconds,
                ..PodSpec::default()
            }),
        }
    }
}
