//! The component catalog.
//!
//! A component turns its validated options into the resource objects of one platform
//! subsystem. Components are pure: the same options always yield the same objects. Whether a
//! value is a concrete string or a `${PARAMETER}` placeholder is up to the caller.
//!
//! Besides objects, every component module declares its [`Capabilities`]: the names it owns
//! that variant transformers are allowed to replace, scale, or strip.
use std::collections::{BTreeMap, BTreeSet};

use k8s_openapi::{
    api::core::v1::{
        ConfigMap, PersistentVolumeClaim, PersistentVolumeClaimSpec, PodTemplateSpec, Secret,
        Service, ServicePort, ServiceSpec, VolumeResourceRequirements,
    },
    apimachinery::pkg::{api::resource::Quantity, apis::meta::v1::ObjectMeta, util::intstr::IntOrString},
};
use strum::{Display, EnumIter};

use crate::{
    builder::meta::ObjectMetaBuilder,
    labels::{self, Labels},
    object::{ObjectKey, ObjectKind, ResourceObject},
    openshift::{
        DeploymentConfig, DeploymentConfigSpec, Route, RouteSpec,
        deployment_config::{DeploymentStrategy, DeploymentTriggerPolicy},
    },
};

pub mod apicast;
pub mod backend;
pub mod high_availability;
pub mod images;
pub mod memcached;
pub mod mysql;
pub mod redis;
pub mod s3;
pub mod system;
pub mod wildcard_router;
pub mod zync;

pub trait Component {
    fn objects(&self) -> Vec<ResourceObject>;
}

/// Connection endpoints a highly available deployment points at external services.
#[derive(Clone, Copy, Debug, Display, EnumIter, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExternalEndpoint {
    SystemDatabase,
    SystemRedis,
    BackendRedisStorage,
    BackendRedisQueues,
}

/// A secret field that carries the URL of an [`ExternalEndpoint`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointField {
    pub secret: String,
    pub field: String,
}

/// Product images a productized build pulls from the curated registry.
#[derive(Clone, Copy, Debug, Display, EnumIter, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProductImage {
    Apicast,
    Backend,
    System,
    WildcardRouter,
    Zync,
}

/// A volume that several workloads share and that can be swapped for object storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SharedStorage {
    pub volume: String,
    pub claim: String,

    /// Template parameter that only configures the claim.
    pub parameter: Option<String>,

    pub workloads: BTreeSet<String>,

    /// ConfigMap holding the environment of `workloads`.
    pub environment_config_map: String,
}

/// Names a component owns and declares open to variant transformers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Objects hosting an internal database or cache, dropped when an external one is used.
    pub external_database_objects: BTreeSet<ObjectKey>,

    /// Parameters that only configure [`Self::external_database_objects`].
    pub external_database_parameters: BTreeSet<String>,

    /// Secrets an external database replaces wholesale.
    pub connection_secrets: BTreeSet<String>,

    pub external_endpoints: BTreeMap<ExternalEndpoint, Vec<EndpointField>>,

    /// Workloads that must run exactly one replica.
    pub singleton_workloads: BTreeSet<String>,

    pub shared_storage: Vec<SharedStorage>,

    pub product_image_streams: BTreeMap<String, ProductImage>,
    pub product_image_parameters: BTreeMap<String, ProductImage>,
}

impl Capabilities {
    pub fn merge(&mut self, other: Self) {
        self.external_database_objects
            .extend(other.external_database_objects);
        self.external_database_parameters
            .extend(other.external_database_parameters);
        self.connection_secrets.extend(other.connection_secrets);
        for (endpoint, fields) in other.external_endpoints {
            self.external_endpoints
                .entry(endpoint)
                .or_default()
                .extend(fields);
        }
        self.singleton_workloads.extend(other.singleton_workloads);
        self.shared_storage.extend(other.shared_storage);
        self.product_image_streams
            .extend(other.product_image_streams);
        self.product_image_parameters
            .extend(other.product_image_parameters);
    }

    pub(crate) fn with_external_database_objects<'a>(
        mut self,
        kind: ObjectKind,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.external_database_objects.extend(
            names
                .into_iter()
                .map(|name| ObjectKey::template(kind, name)),
        );
        self
    }

    pub(crate) fn with_endpoint(
        mut self,
        endpoint: ExternalEndpoint,
        secret: &str,
        field: &str,
    ) -> Self {
        self.external_endpoints
            .entry(endpoint)
            .or_default()
            .push(EndpointField {
                secret: secret.to_owned(),
                field: field.to_owned(),
            });
        self
    }
}

pub(crate) fn metadata(name: &str, labels: Labels) -> ObjectMeta {
    ObjectMetaBuilder::new()
        .name(name)
        .with_labels(labels)
        .build()
}

pub(crate) fn secret(
    name: &str,
    labels: Labels,
    data: impl IntoIterator<Item = (&'static str, String)>,
) -> ResourceObject {
    Secret {
        metadata: metadata(name, labels),
        string_data: Some(
            data.into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        ),
        type_: Some("Opaque".to_owned()),
        ..Secret::default()
    }
    .into()
}

pub(crate) fn config_map(
    name: &str,
    labels: Labels,
    data: impl IntoIterator<Item = (&'static str, String)>,
) -> ResourceObject {
    ConfigMap {
        metadata: metadata(name, labels),
        data: Some(
            data.into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        ),
        ..ConfigMap::default()
    }
    .into()
}

/// A Service selecting the pods of the workload `workload`.
///
/// `ports` are `(name, port, target port name)` triples.
pub(crate) fn service(
    name: &str,
    labels: Labels,
    workload: &str,
    ports: &[(&str, i32, &str)],
) -> ResourceObject {
    Service {
        metadata: metadata(name, labels),
        spec: Some(ServiceSpec {
            ports: Some(
                ports
                    .iter()
                    .map(|(port_name, port, target_port)| ServicePort {
                        name: Some((*port_name).to_owned()),
                        port: *port,
                        protocol: Some("TCP".to_owned()),
                        target_port: Some(IntOrString::String((*target_port).to_owned())),
                        ..ServicePort::default()
                    })
                    .collect(),
            ),
            selector: Some(labels::sets::workload_selector(workload)),
            ..ServiceSpec::default()
        }),
        ..Service::default()
    }
    .into()
}

pub(crate) fn persistent_volume_claim(
    name: &str,
    labels: Labels,
    access_mode: &str,
    size: &str,
    storage_class_name: Option<&String>,
) -> ResourceObject {
    PersistentVolumeClaim {
        metadata: metadata(name, labels),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![access_mode.to_owned()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some([("storage".to_owned(), Quantity(size.to_owned()))].into()),
                ..VolumeResourceRequirements::default()
            }),
            storage_class_name: storage_class_name.cloned(),
            ..PersistentVolumeClaimSpec::default()
        }),
        ..PersistentVolumeClaim::default()
    }
    .into()
}

pub(crate) fn route(name: &str, labels: Labels, spec: RouteSpec) -> ResourceObject {
    Route {
        metadata: metadata(name, labels),
        spec,
    }
    .into()
}

/// A DeploymentConfig whose pods are selected by their workload name.
///
/// The pod template labels are the object labels plus the workload selector.
pub(crate) struct DeploymentConfigBuilder<'a> {
    name: &'a str,
    labels: Labels,
    replicas: i32,
    strategy: DeploymentStrategy,
    triggers: Vec<DeploymentTriggerPolicy>,
}

impl<'a> DeploymentConfigBuilder<'a> {
    pub(crate) fn new(name: &'a str, labels: Labels) -> Self {
        Self {
            name,
            labels,
            replicas: 1,
            strategy: DeploymentStrategy::rolling(),
            triggers: vec![DeploymentTriggerPolicy::config_change()],
        }
    }

    pub(crate) fn replicas(mut self, replicas: i32) -> Self {
        self.replicas = replicas;
        self
    }

    pub(crate) fn strategy(mut self, strategy: DeploymentStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Redeploys `containers` whenever `image_stream_tag` changes.
    pub(crate) fn image_change_trigger(
        mut self,
        containers: &[&str],
        image_stream_tag: &str,
    ) -> Self {
        self.triggers.push(DeploymentTriggerPolicy::image_change(
            containers.iter().copied(),
            image_stream_tag,
        ));
        self
    }

    pub(crate) fn pod_labels(&self) -> Labels {
        labels::sets::pod(&self.labels, self.name)
    }

    pub(crate) fn build(self, mut template: PodTemplateSpec) -> ResourceObject {
        let pod_labels = self.pod_labels();
        template
            .metadata
            .get_or_insert_with(ObjectMeta::default)
            .labels = Some(pod_labels);

        DeploymentConfig {
            metadata: metadata(self.name, self.labels),
            spec: DeploymentConfigSpec {
                replicas: self.replicas,
                selector: labels::sets::workload_selector(self.name),
                strategy: self.strategy,
                triggers: self.triggers,
                template: Some(template),
            },
        }
        .into()
    }
}
