//! The closed set of resource kinds a template bundle can hold.
use std::fmt::{self, Display};

use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        core::v1::{
            ConfigMap, PersistentVolumeClaim, PodSpec, PodTemplateSpec, Secret, Service,
            ServiceAccount,
        },
        networking::v1::Ingress,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use serde::Serialize;
use strum::{Display as StrumDisplay, EnumDiscriminants, IntoStaticStr};

use crate::{
    labels::Labels,
    openshift::{DeploymentConfig, ImageStream, Route},
};

/// A resource object tagged by its kind.
///
/// Serializes as the wrapped Kubernetes object, so a list of these renders straight into the
/// `objects` of a template.
#[derive(Clone, Debug, EnumDiscriminants, PartialEq, Serialize)]
#[strum_discriminants(name(ObjectKind))]
#[strum_discriminants(derive(Hash, Ord, PartialOrd, StrumDisplay, IntoStaticStr))]
#[serde(untagged)]
pub enum ResourceObject {
    Secret(Secret),
    ConfigMap(ConfigMap),
    Service(Service),
    Deployment(Deployment),
    DeploymentConfig(DeploymentConfig),
    Route(Route),
    Ingress(Ingress),
    ImageStream(ImageStream),
    ServiceAccount(ServiceAccount),
    PersistentVolumeClaim(PersistentVolumeClaim),
}

impl ObjectKind {
    /// Both kinds that run pods: `Deployment` and `DeploymentConfig`.
    pub fn is_workload(self) -> bool {
        matches!(self, Self::Deployment | Self::DeploymentConfig)
    }
}

/// Stable identity of a [`ResourceObject`].
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectKey {
    /// Key of a cluster-agnostic template object, which never carries a namespace.
    pub fn template(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: None,
            name: name.into(),
        }
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{namespace}/{}", self.kind, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

macro_rules! impl_from_kind {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for ResourceObject {
                fn from(object: $kind) -> Self {
                    Self::$kind(object)
                }
            }
        )*
    };
}

impl_from_kind!(
    Secret,
    ConfigMap,
    Service,
    Deployment,
    DeploymentConfig,
    Route,
    Ingress,
    ImageStream,
    ServiceAccount,
    PersistentVolumeClaim,
);

impl ResourceObject {
    pub fn kind(&self) -> ObjectKind {
        ObjectKind::from(self)
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Secret(object) => &object.metadata,
            Self::ConfigMap(object) => &object.metadata,
            Self::Service(object) => &object.metadata,
            Self::Deployment(object) => &object.metadata,
            Self::DeploymentConfig(object) => &object.metadata,
            Self::Route(object) => &object.metadata,
            Self::Ingress(object) => &object.metadata,
            Self::ImageStream(object) => &object.metadata,
            Self::ServiceAccount(object) => &object.metadata,
            Self::PersistentVolumeClaim(object) => &object.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name.as_deref().unwrap_or_default()
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            kind: self.kind(),
            namespace: self.metadata().namespace.clone(),
            name: self.name().to_owned(),
        }
    }

    pub fn labels(&self) -> Option<&Labels> {
        self.metadata().labels.as_ref()
    }

    pub fn is_workload(&self) -> bool {
        self.kind().is_workload()
    }

    /// Returns the pod template of a workload, `None` for every other kind.
    pub fn pod_template(&self) -> Option<&PodTemplateSpec> {
        match self {
            Self::Deployment(deployment) => deployment.spec.as_ref().map(|spec| &spec.template),
            Self::DeploymentConfig(deployment_config) => deployment_config.spec.template.as_ref(),
            _ => None,
        }
    }

    pub fn pod_spec_mut(&mut self) -> Option<&mut PodSpec> {
        let template = match self {
            Self::Deployment(deployment) => &mut deployment.spec.as_mut()?.template,
            Self::DeploymentConfig(deployment_config) => {
                deployment_config.spec.template.as_mut()?
            }
            _ => return None,
        };
        template.spec.as_mut()
    }

    pub fn replicas(&self) -> Option<i32> {
        match self {
            Self::Deployment(deployment) => deployment.spec.as_ref()?.replicas,
            Self::DeploymentConfig(deployment_config) => Some(deployment_config.spec.replicas),
            _ => None,
        }
    }

    /// Sets the replica count of a workload. Returns `false` for every other kind.
    pub fn set_replicas(&mut self, replicas: i32) -> bool {
        match self {
            Self::Deployment(deployment) => {
                deployment.spec.get_or_insert_with(Default::default).replicas = Some(replicas);
                true
            }
            Self::DeploymentConfig(deployment_config) => {
                deployment_config.spec.replicas = replicas;
                true
            }
            _ => false,
        }
    }
}
